use crate::types::{ChapterRange, NamedRange};

const MIN_INDEX_WIDTH: usize = 2;
const FALLBACK_TITLE: &str = "Untitled";

/// Assigns `NN_Title.pdf` filenames to finalized ranges.
#[derive(Debug, Clone)]
pub struct OutputNamer {
    max_title_len: usize,
}

impl OutputNamer {
    pub fn new(max_title_len: usize) -> Self {
        Self {
            max_title_len: max_title_len.max(1),
        }
    }

    pub fn name(&self, ranges: &[ChapterRange]) -> Vec<NamedRange> {
        let width = Self::index_width(ranges.len());
        ranges
            .iter()
            .enumerate()
            .map(|(idx, range)| NamedRange {
                filename: format!(
                    "{:0width$}_{}.pdf",
                    idx + 1,
                    self.sanitize(&range.title),
                    width = width
                ),
                range: range.clone(),
            })
            .collect()
    }

    pub fn index_width(count: usize) -> usize {
        count.to_string().len().max(MIN_INDEX_WIDTH)
    }

    /// Reduce a title to `[A-Za-z0-9_-]`, with whitespace runs as `_`.
    pub fn sanitize(&self, title: &str) -> String {
        let kept: String = title
            .chars()
            .map(|c| if c.is_whitespace() { ' ' } else { c })
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
            .collect();

        let joined = kept.split_whitespace().collect::<Vec<_>>().join("_");
        let truncated: String = joined.chars().take(self.max_title_len).collect();
        let trimmed = truncated.trim_matches('_');

        if trimmed.is_empty() {
            FALLBACK_TITLE.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

impl Default for OutputNamer {
    fn default() -> Self {
        Self::new(80)
    }
}
