use crate::error::{Result, SplitterError};
use crate::services::resolver::RangeResolver;
use crate::types::{ChapterRange, GapPolicy};
use tracing::debug;

/// Parses range specifications such as `"1-10, 11-20:Intro"`.
///
/// Grammar, per comma-separated token: `INT '-' INT (':' TEXT)?`. Untitled
/// tokens are named `Part {k}` after their position. Any bad token rejects
/// the whole input.
pub struct ManualRangeParser;

impl ManualRangeParser {
    pub fn parse(spec: &str, total_pages: usize) -> Result<Vec<ChapterRange>> {
        Self::parse_with_resolver(spec, total_pages, &RangeResolver::new(GapPolicy::RejectGaps))
    }

    pub fn parse_with_resolver(
        spec: &str,
        total_pages: usize,
        resolver: &RangeResolver,
    ) -> Result<Vec<ChapterRange>> {
        let ranges = Self::parse_tokens(spec, total_pages)?;
        debug!("Parsed {} manual range(s)", ranges.len());
        resolver.resolve_ranges(&ranges, total_pages)
    }

    /// Syntactic pass only: bounds and ordering are checked, coverage is not.
    pub fn parse_tokens(spec: &str, total_pages: usize) -> Result<Vec<ChapterRange>> {
        let mut ranges: Vec<ChapterRange> = Vec::new();

        for (idx, raw) in spec.split(',').enumerate() {
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }
            let range = Self::parse_token(token, idx + 1, total_pages)?;

            if let Some(prev) = ranges.last() {
                if range.start_page < prev.start_page {
                    return Err(SplitterError::syntax(
                        token,
                        format!(
                            "ranges must be listed in ascending order (previous range starts at page {})",
                            prev.start_page
                        ),
                    ));
                }
            }
            ranges.push(range);
        }

        if ranges.is_empty() {
            return Err(SplitterError::empty("manual range specification is empty"));
        }
        Ok(ranges)
    }

    fn parse_token(token: &str, position: usize, total_pages: usize) -> Result<ChapterRange> {
        let (bounds, title) = match token.split_once(':') {
            Some((bounds, title)) => (bounds.trim(), title.trim()),
            None => (token, ""),
        };

        let Some((start, end)) = bounds.split_once('-') else {
            return Err(SplitterError::syntax(token, "expected 'start-end'"));
        };
        let start = Self::parse_page(token, start)?;
        let end = Self::parse_page(token, end)?;

        if start > end {
            return Err(SplitterError::syntax(
                token,
                format!("start page {} is after end page {}", start, end),
            ));
        }
        if end > total_pages {
            return Err(SplitterError::syntax(
                token,
                format!("page {} is beyond the last page ({})", end, total_pages),
            ));
        }

        let title = if title.is_empty() {
            format!("Part {}", position)
        } else {
            title.to_string()
        };
        Ok(ChapterRange::new(title, start, end))
    }

    fn parse_page(token: &str, raw: &str) -> Result<usize> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SplitterError::syntax(
                token,
                format!("'{}' is not a positive page number", raw),
            ));
        }
        let page: usize = raw.parse().map_err(|_| {
            SplitterError::syntax(token, format!("'{}' is not a positive page number", raw))
        })?;
        if page == 0 {
            return Err(SplitterError::syntax(token, "page numbers start at 1"));
        }
        Ok(page)
    }
}
