use crate::error::{Result, SplitterError};
use crate::types::OutlineNode;
use lopdf::Document;
use tracing::{debug, warn};

/// Read access to a paginated document.
///
/// Pages are 1-based. `outline` returns the top-level bookmarks, or an empty
/// vector when the document has none.
pub trait PageSource {
    fn total_pages(&self) -> usize;

    fn outline(&self) -> Vec<OutlineNode>;

    fn page_text(&self, page: usize) -> Result<String>;

    /// Build a standalone document holding pages `start..=end`.
    fn extract_pages(&self, start: usize, end: usize) -> Result<Vec<u8>>;

    /// True when `extract_pages` may run for several ranges at once.
    fn supports_concurrent_extraction(&self) -> bool {
        false
    }
}

/// A PDF held in memory, backed by `lopdf`.
///
/// Extraction works on a private clone of the parsed document, so concurrent
/// calls never share a cursor.
pub struct PdfDocument {
    doc: Document,
    total_pages: usize,
}

impl PdfDocument {
    pub fn load_mem(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes)?;
        let total_pages = doc.get_pages().len();
        debug!("Loaded PDF with {} pages", total_pages);

        if total_pages == 0 {
            return Err(SplitterError::Config {
                reason: "Document has no pages to split".to_string(),
            });
        }

        Ok(Self { doc, total_pages })
    }

    fn check_page(&self, page: usize) -> Result<()> {
        if page == 0 || page > self.total_pages {
            return Err(SplitterError::OutOfBounds {
                title: "page".to_string(),
                page,
                total_pages: self.total_pages,
            });
        }
        Ok(())
    }
}

impl PageSource for PdfDocument {
    fn total_pages(&self) -> usize {
        self.total_pages
    }

    fn outline(&self) -> Vec<OutlineNode> {
        match self.doc.get_toc() {
            Ok(toc) => {
                for problem in &toc.errors {
                    warn!("Skipping malformed outline entry: {}", problem);
                }
                let entries: Vec<(usize, String, usize)> = toc
                    .toc
                    .into_iter()
                    .map(|entry| (entry.level, entry.title, entry.page))
                    .collect();
                OutlineNode::from_levels(&entries)
            }
            Err(e) => {
                debug!("No usable outline: {}", e);
                Vec::new()
            }
        }
    }

    fn page_text(&self, page: usize) -> Result<String> {
        self.check_page(page)?;
        Ok(self.doc.extract_text(&[page as u32])?)
    }

    fn extract_pages(&self, start: usize, end: usize) -> Result<Vec<u8>> {
        self.check_page(start)?;
        self.check_page(end)?;
        if start > end {
            return Err(SplitterError::InvalidRangeOrder {
                title: "extract".to_string(),
                start_page: start,
                end_page: end,
            });
        }

        let mut part = self.doc.clone();
        let to_delete: Vec<u32> = (1..=self.total_pages as u32)
            .filter(|p| (*p as usize) < start || (*p as usize) > end)
            .collect();
        if !to_delete.is_empty() {
            part.delete_pages(&to_delete);
        }
        part.prune_objects();
        part.compress();

        let mut buffer = Vec::new();
        part.save_to(&mut buffer)?;
        Ok(buffer)
    }

    fn supports_concurrent_extraction(&self) -> bool {
        true
    }
}

impl OutlineNode {
    /// Rebuild a bookmark forest from a flat pre-order `(level, title, page)` list.
    ///
    /// Levels are relative: the shallowest level in the list becomes the top.
    /// A level that jumps by more than one nests under the closest shallower entry.
    pub fn from_levels(entries: &[(usize, String, usize)]) -> Vec<OutlineNode> {
        let Some(min_level) = entries.iter().map(|(level, _, _)| *level).min() else {
            return Vec::new();
        };

        // Open path from the root; each slot holds (level, node) still accepting children.
        let mut roots: Vec<OutlineNode> = Vec::new();
        let mut open: Vec<(usize, OutlineNode)> = Vec::new();

        for (level, title, page) in entries {
            let level = level - min_level;
            while open.last().is_some_and(|(open_level, _)| *open_level >= level) {
                close_top(&mut open, &mut roots);
            }
            open.push((level, OutlineNode::new(title.clone(), *page)));
        }
        while !open.is_empty() {
            close_top(&mut open, &mut roots);
        }

        roots
    }
}

fn close_top(open: &mut Vec<(usize, OutlineNode)>, roots: &mut Vec<OutlineNode>) {
    if let Some((_, node)) = open.pop() {
        match open.last_mut() {
            Some((_, parent)) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::DetectionConfig;
    use crate::job::SplitJob;
    use crate::types::ChapterRange;
    use lopdf::{content::Content, content::Operation, Dictionary, Object, ObjectId, Stream};

    /// Build an uncompressed PDF whose page N shows the text `page_texts[N-1]`.
    pub(crate) fn build_test_pdf(page_texts: &[&str]) -> Vec<u8> {
        let (mut doc, pages_id, _) = page_tree(page_texts);
        save_with_catalog(&mut doc, pages_id, None)
    }

    fn page_tree(page_texts: &[&str]) -> (Document, ObjectId, Vec<ObjectId>) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        let resources_id = doc.add_object(Dictionary::from_iter(vec![(
            "Font",
            Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
        )]));

        let mut page_ids = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                    Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(text.as_bytes().to_vec(), lopdf::StringFormat::Literal)],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
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
            page_ids.push(page_id);
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(page_texts.len() as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        (doc, pages_id, page_ids)
    }

    fn save_with_catalog(
        doc: &mut Document,
        pages_id: ObjectId,
        outlines: Option<ObjectId>,
    ) -> Vec<u8> {
        let mut catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        if let Some(outlines_id) = outlines {
            catalog.set("Outlines", Object::Reference(outlines_id));
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_load_counts_pages() {
        let pdf = PdfDocument::load_mem(&build_test_pdf(&["a", "b", "c"])).unwrap();
        assert_eq!(pdf.total_pages(), 3);
        assert!(pdf.outline().is_empty());
    }

    #[test]
    fn test_extract_range() {
        let pdf = PdfDocument::load_mem(&build_test_pdf(&["a", "b", "c", "d", "e"])).unwrap();
        let bytes = pdf.extract_pages(2, 4).unwrap();
        let part = Document::load_mem(&bytes).unwrap();
        assert_eq!(part.get_pages().len(), 3);
    }

    #[test]
    fn test_extract_rejects_bad_pages() {
        let pdf = PdfDocument::load_mem(&build_test_pdf(&["a", "b"])).unwrap();
        assert!(pdf.extract_pages(0, 1).is_err());
        assert!(pdf.extract_pages(1, 3).is_err());
        assert!(pdf.page_text(3).is_err());
    }

    #[test]
    fn test_page_text() {
        let pdf = PdfDocument::load_mem(&build_test_pdf(&["Chapter 1", "body"])).unwrap();
        assert!(pdf.page_text(1).unwrap().contains("Chapter 1"));
    }

    #[test]
    fn test_from_levels_nests_by_level() {
        let entries = vec![
            (1, "Part I".to_string(), 1),
            (2, "Ch 1".to_string(), 2),
            (3, "1.1".to_string(), 3),
            (2, "Ch 2".to_string(), 5),
            (1, "Part II".to_string(), 8),
        ];
        let roots = OutlineNode::from_levels(&entries);

        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].children.len(), 2);
        assert_eq!(roots[0].children[0].children[0].title, "1.1");
        assert_eq!(roots[1].title, "Part II");
        assert!(roots[1].children.is_empty());
    }

    #[test]
    fn test_from_levels_keeps_siblings_under_parent() {
        let entries = vec![
            (1, "Part I".to_string(), 1),
            (2, "Ch 1".to_string(), 2),
            (2, "Ch 2".to_string(), 4),
            (2, "Ch 3".to_string(), 6),
        ];
        let roots = OutlineNode::from_levels(&entries);

        assert_eq!(roots.len(), 1);
        let titles: Vec<&str> = roots[0].children.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Ch 1", "Ch 2", "Ch 3"]);
    }

    #[test]
    fn test_bookmarked_pdf_outline() {
        let (mut doc, pages_id, page_ids) = page_tree(&["a", "b", "c", "d", "e", "f"]);
        let outlines_id = doc.new_object_id();
        let intro_id = doc.new_object_id();
        let body_id = doc.new_object_id();
        let body_one_id = doc.new_object_id();
        let body_two_id = doc.new_object_id();
        let dest = |page: ObjectId| {
            Object::Array(vec![Object::Reference(page), Object::Name(b"Fit".to_vec())])
        };

        let entries = vec![
            (
                intro_id,
                Dictionary::from_iter(vec![
                    ("Title", Object::string_literal("Intro")),
                    ("Parent", Object::Reference(outlines_id)),
                    ("Next", Object::Reference(body_id)),
                    ("Dest", dest(page_ids[0])),
                ]),
            ),
            (
                body_id,
                Dictionary::from_iter(vec![
                    ("Title", Object::string_literal("Body")),
                    ("Parent", Object::Reference(outlines_id)),
                    ("Prev", Object::Reference(intro_id)),
                    ("First", Object::Reference(body_one_id)),
                    ("Last", Object::Reference(body_two_id)),
                    ("Count", Object::Integer(2)),
                    ("Dest", dest(page_ids[3])),
                ]),
            ),
            (
                body_one_id,
                Dictionary::from_iter(vec![
                    ("Title", Object::string_literal("Body 1")),
                    ("Parent", Object::Reference(body_id)),
                    ("Next", Object::Reference(body_two_id)),
                    ("Dest", dest(page_ids[4])),
                ]),
            ),
            (
                body_two_id,
                Dictionary::from_iter(vec![
                    ("Title", Object::string_literal("Body 2")),
                    ("Parent", Object::Reference(body_id)),
                    ("Prev", Object::Reference(body_one_id)),
                    ("Dest", dest(page_ids[5])),
                ]),
            ),
            (
                outlines_id,
                Dictionary::from_iter(vec![
                    ("Type", Object::Name(b"Outlines".to_vec())),
                    ("First", Object::Reference(intro_id)),
                    ("Last", Object::Reference(body_id)),
                    ("Count", Object::Integer(4)),
                ]),
            ),
        ];
        for (id, dict) in entries {
            doc.objects.insert(id, Object::Dictionary(dict));
        }
        let bytes = save_with_catalog(&mut doc, pages_id, Some(outlines_id));

        let pdf = PdfDocument::load_mem(&bytes).unwrap();
        let outline = pdf.outline();
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[1].title, "Body");
        assert_eq!(outline[1].target_page, 4);
        assert_eq!(outline[1].children.len(), 2);

        let config = DetectionConfig::default();
        let ranges = SplitJob::new(&pdf, &config).detect_from_outline().unwrap();
        assert_eq!(
            ranges,
            vec![
                ChapterRange::new("Intro", 1, 3),
                ChapterRange::new("Body", 4, 4),
                ChapterRange::new("Body 1", 5, 5),
                ChapterRange::new("Body 2", 6, 6),
            ]
        );
    }

    #[test]
    fn test_from_levels_relative_to_shallowest() {
        let entries = vec![(2, "A".to_string(), 1), (4, "B".to_string(), 2)];
        let roots = OutlineNode::from_levels(&entries);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].children[0].title, "B");
        assert!(OutlineNode::from_levels(&[]).is_empty());
    }
}
