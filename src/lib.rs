//! # PDF Chapter Splitter Library
//!
//! Splits a PDF into named sub-documents along chapter boundaries taken from
//! the document outline, heading patterns in the page text, AI suggestions,
//! an explicit range list, or an equal split.
//!
//! Every source ends up in [`RangeResolver`], which returns sorted,
//! non-overlapping ranges that cover every page exactly once.
//!
//! ## Example Usage
//!
//! ```rust
//! use pdf_chapter_splitter::{equal_split, name_outputs, parse_manual, resolve};
//! use pdf_chapter_splitter::{BoundaryHint, GapPolicy};
//!
//! let ranges = resolve(&[BoundaryHint::new("Ch1", 5)], 10, GapPolicy::FillGaps).unwrap();
//! assert_eq!(ranges[0].title, "Front Matter");
//!
//! let manual = parse_manual("1-10, 11-20:Intro", 20).unwrap();
//! assert_eq!(manual[1].title, "Intro");
//!
//! let parts = equal_split(101, 4).unwrap();
//! let named = name_outputs(&parts);
//! assert_eq!(named[0].filename, "01_Part_1.pdf");
//! ```

pub mod config;
pub mod error;
pub mod job;
pub mod services;
pub mod types;

pub use config::{AiConfig, DetectionConfig, HeadingPattern};
pub use error::{Result, SplitterError};
pub use job::{Detection, SplitJob};
pub use services::{
    BoundarySuggester, ContentFetcher, DocumentSplitter, EqualSplitter, GeminiSuggester,
    ManualRangeParser, OutlineFlattener, OutputNamer, PageSource, PdfDocument, RangeResolver,
    TextHeuristicScanner,
};
pub use types::{
    BoundaryHint, ChapterRange, DetectionStrategy, GapPolicy, NamedRange, OutlineNode, PageSample,
    SourceInfo, SourceType, SplitConfig, SplitResult,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Chapters from the document's bookmarks, with default settings.
pub fn detect_from_outline<S: PageSource + ?Sized>(doc: &S) -> Result<Vec<ChapterRange>> {
    let config = DetectionConfig::default();
    SplitJob::new(doc, &config).detect_from_outline()
}

/// Chapters from heading patterns in the page text, with default settings.
pub fn detect_from_text<S: PageSource + ?Sized>(doc: &S) -> Result<Vec<ChapterRange>> {
    let config = DetectionConfig::default();
    SplitJob::new(doc, &config).detect_from_text()
}

pub fn resolve(
    hints: &[BoundaryHint],
    total_pages: usize,
    policy: GapPolicy,
) -> Result<Vec<ChapterRange>> {
    RangeResolver::new(policy).resolve(hints, total_pages)
}

pub fn resolve_ranges(
    ranges: &[ChapterRange],
    total_pages: usize,
    policy: GapPolicy,
) -> Result<Vec<ChapterRange>> {
    RangeResolver::new(policy).resolve_ranges(ranges, total_pages)
}

pub fn equal_split(total_pages: usize, divisions: usize) -> Result<Vec<ChapterRange>> {
    EqualSplitter::split(total_pages, divisions)
}

/// Parse a manual range list. Gaps are an error.
pub fn parse_manual(spec: &str, total_pages: usize) -> Result<Vec<ChapterRange>> {
    ManualRangeParser::parse(spec, total_pages)
}

pub fn parse_manual_with_policy(
    spec: &str,
    total_pages: usize,
    policy: GapPolicy,
) -> Result<Vec<ChapterRange>> {
    ManualRangeParser::parse_with_resolver(spec, total_pages, &RangeResolver::new(policy))
}

pub fn name_outputs(ranges: &[ChapterRange]) -> Vec<NamedRange> {
    OutputNamer::default().name(ranges)
}
