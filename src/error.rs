use crate::types::ChapterRange;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("HTTP status error: {status}")]
    HttpStatus { status: u16 },

    #[error("Output directory error: {reason}")]
    OutputDirectory { reason: String },

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    #[error("Invalid heading pattern '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },

    #[error("No usable chapter boundaries found ({origin})")]
    EmptyRangeSet { origin: String },

    #[error("Invalid range '{token}': {reason}")]
    RangeSyntax { token: String, reason: String },

    #[error("Ranges overlap: {first} and {second}")]
    Overlap {
        first: ChapterRange,
        second: ChapterRange,
    },

    #[error("Pages {start}-{end} are not covered by any range")]
    CoverageGap { start: usize, end: usize },

    #[error("Range '{title}' has start page {start_page} after end page {end_page}")]
    InvalidRangeOrder {
        title: String,
        start_page: usize,
        end_page: usize,
    },

    #[error("Range '{title}' references page {page}, document has {total_pages} pages")]
    OutOfBounds {
        title: String,
        page: usize,
        total_pages: usize,
    },

    #[error("Division count {count} is invalid: {reason}")]
    InvalidDivisionCount { count: usize, reason: String },

    #[error("Chapter suggestion failed: {reason}")]
    Suggestion { reason: String },

    #[error("Chapter suggestion timed out after {seconds}s")]
    SuggestionTimeout { seconds: u64 },
}

impl SplitterError {
    /// Whether the caller may fall back to another detection source.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SplitterError::EmptyRangeSet { .. }
                | SplitterError::Suggestion { .. }
                | SplitterError::SuggestionTimeout { .. }
        )
    }

    pub(crate) fn empty(origin: impl Into<String>) -> Self {
        SplitterError::EmptyRangeSet {
            origin: origin.into(),
        }
    }

    pub(crate) fn syntax(token: impl Into<String>, reason: impl Into<String>) -> Self {
        SplitterError::RangeSyntax {
            token: token.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SplitterError>;
