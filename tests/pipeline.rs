//! End-to-end: detect boundaries, name outputs, write files.

use lopdf::{content::Content, content::Operation, Dictionary, Document, Object, Stream};
use pdf_chapter_splitter::{
    DetectionConfig, DocumentSplitter, OutlineNode, PageSource, PdfDocument, Result, SplitConfig,
    SplitJob, SplitterError,
};
use std::sync::Arc;

struct MemoryDoc {
    pages: Vec<String>,
    outline: Vec<OutlineNode>,
}

impl PageSource for MemoryDoc {
    fn total_pages(&self) -> usize {
        self.pages.len()
    }

    fn outline(&self) -> Vec<OutlineNode> {
        self.outline.clone()
    }

    fn page_text(&self, page: usize) -> Result<String> {
        Ok(self.pages[page - 1].clone())
    }

    fn extract_pages(&self, start: usize, end: usize) -> Result<Vec<u8>> {
        Ok(self.pages[start - 1..end].join("\n").into_bytes())
    }
}

fn build_pdf(page_texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Courier".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]));

    let mut kids = Vec::new();
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(14)]),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(text.as_bytes().to_vec(), lopdf::StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(page_texts.len() as i64)),
            ("Kids", Object::Array(kids)),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

#[tokio::test]
async fn test_outline_job_writes_named_files() {
    let doc = Arc::new(MemoryDoc {
        pages: (1..=8).map(|i| format!("page {}", i)).collect(),
        outline: vec![
            OutlineNode::new("Getting Started", 2),
            OutlineNode::new("Advanced: Tips & Tricks", 5),
        ],
    });
    let config = DetectionConfig::default();
    let job = SplitJob::new(doc.as_ref(), &config);
    let ranges = job.detect_from_outline().unwrap();
    let named = job.name_outputs(&ranges);

    let filenames: Vec<&str> = named.iter().map(|n| n.filename.as_str()).collect();
    assert_eq!(
        filenames,
        vec![
            "01_Front_Matter.pdf",
            "02_Getting_Started.pdf",
            "03_Advanced_Tips_Tricks.pdf"
        ]
    );

    let dir = tempfile::tempdir().unwrap();
    let split_config = SplitConfig {
        output_dir: dir.path().to_path_buf(),
        include_manifest: true,
        dry_run: false,
    };
    let result = DocumentSplitter::split_document(doc, "guide.pdf", &named, &split_config)
        .await
        .unwrap();

    assert_eq!(result.pages_written, 8);
    let last = std::fs::read_to_string(&result.output_files[2]).unwrap();
    assert_eq!(last, "page 5\npage 6\npage 7\npage 8");
    assert!(dir.path().join("guide_manifest.json").exists());
}

#[tokio::test]
async fn test_real_pdf_text_detection() {
    let bytes = build_pdf(&[
        "Contents",
        "Chapter 1 Origins",
        "text",
        "text",
        "Chapter 2 Growth",
        "text",
    ]);
    let pdf = Arc::new(PdfDocument::load_mem(&bytes).unwrap());
    let config = DetectionConfig::default();
    let job = SplitJob::new(pdf.as_ref(), &config);

    let ranges = job.detect_from_text().unwrap();
    let spans: Vec<(usize, usize)> = ranges.iter().map(|r| (r.start_page, r.end_page)).collect();
    assert_eq!(spans, vec![(1, 1), (2, 4), (5, 6)]);

    let named = job.name_outputs(&ranges);
    let dir = tempfile::tempdir().unwrap();
    let split_config = SplitConfig {
        output_dir: dir.path().join("parts"),
        include_manifest: false,
        dry_run: false,
    };
    let result = DocumentSplitter::split_document(pdf, "book.pdf", &named, &split_config)
        .await
        .unwrap();

    let page_counts: Vec<usize> = result
        .output_files
        .iter()
        .map(|path| Document::load(path).unwrap().get_pages().len())
        .collect();
    assert_eq!(page_counts, vec![1, 3, 2]);
}

#[test]
fn test_manual_gap_reported_with_span() {
    let doc = MemoryDoc {
        pages: vec![String::new(); 30],
        outline: Vec::new(),
    };
    let config = DetectionConfig::default();
    let job = SplitJob::new(&doc, &config);

    let err = job
        .parse_manual("1-10:Intro, 16-30:Body", pdf_chapter_splitter::GapPolicy::RejectGaps)
        .unwrap_err();
    assert!(matches!(err, SplitterError::CoverageGap { start: 11, end: 15 }));
    assert_eq!(err.to_string(), "Pages 11-15 are not covered by any range");
}
