use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// An inclusive, 1-based page interval that becomes one output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRange {
    pub title: String,
    pub start_page: usize,
    pub end_page: usize,
}

impl ChapterRange {
    pub fn new(title: impl Into<String>, start_page: usize, end_page: usize) -> Self {
        Self {
            title: title.into(),
            start_page,
            end_page,
        }
    }

    pub fn page_count(&self) -> usize {
        (self.end_page + 1).saturating_sub(self.start_page)
    }

    pub fn contains(&self, page: usize) -> bool {
        self.start_page <= page && page <= self.end_page
    }
}

impl fmt::Display for ChapterRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' (pages {}-{})",
            self.title, self.start_page, self.end_page
        )
    }
}

/// An unvalidated proposal that a chapter begins at `start_page`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryHint {
    pub title: String,
    pub start_page: usize,
}

impl BoundaryHint {
    pub fn new(title: impl Into<String>, start_page: usize) -> Self {
        Self {
            title: title.into(),
            start_page,
        }
    }
}

/// One bookmark in a document outline. Children are ordered as in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineNode {
    pub title: String,
    pub target_page: usize,
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn new(title: impl Into<String>, target_page: usize) -> Self {
        Self {
            title: title.into(),
            target_page,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<OutlineNode>) -> Self {
        self.children = children;
        self
    }
}

/// What to do with pages no range claims.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum GapPolicy {
    /// Synthesize placeholder ranges for missing pages
    #[default]
    FillGaps,
    /// Treat any missing page as an error
    RejectGaps,
}

/// Where chapter boundaries come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionStrategy {
    /// Outline first, then text heuristics, then the whole document
    #[default]
    Auto,
    /// Embedded bookmarks only
    Outline,
    /// Heading patterns in page text only
    Text,
    /// AI suggestions, falling back to auto on failure
    Ai,
    /// Equal-width parts
    Equal,
    /// Explicit range specification
    Manual,
}

/// A finalized range paired with its output filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRange {
    pub filename: String,
    pub range: ChapterRange,
}

/// A short text excerpt of one page, sent to a boundary suggester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSample {
    pub page: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub filename: String,
    pub source_type: SourceType,
    pub created_at: String,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SourceType {
    LocalFile,
    Url,
}

#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub output_dir: PathBuf,
    pub include_manifest: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct SplitResult {
    pub output_files: Vec<PathBuf>,
    pub total_pages: usize,
    pub pages_written: usize,
    pub manifest_file: Option<PathBuf>,
}
