use crate::error::{Result, SplitterError};
use crate::types::ChapterRange;
use tracing::debug;

pub const MIN_DIVISIONS: usize = 2;
pub const MAX_DIVISIONS: usize = 20;

pub struct EqualSplitter;

impl EqualSplitter {
    /// Split `total_pages` into `divisions` parts whose sizes differ by at most
    /// one page. Remainder pages go to the earliest parts.
    pub fn split(total_pages: usize, divisions: usize) -> Result<Vec<ChapterRange>> {
        if !(MIN_DIVISIONS..=MAX_DIVISIONS).contains(&divisions) {
            return Err(SplitterError::InvalidDivisionCount {
                count: divisions,
                reason: format!("must be between {} and {}", MIN_DIVISIONS, MAX_DIVISIONS),
            });
        }
        if divisions > total_pages {
            return Err(SplitterError::InvalidDivisionCount {
                count: divisions,
                reason: format!("cannot exceed total pages ({})", total_pages),
            });
        }

        let base = total_pages / divisions;
        let remainder = total_pages % divisions;
        let mut ranges = Vec::with_capacity(divisions);
        let mut start_page = 1;

        for idx in 0..divisions {
            let width = base + usize::from(idx < remainder);
            let end_page = start_page + width - 1;
            ranges.push(ChapterRange::new(format!("Part {}", idx + 1), start_page, end_page));
            start_page = end_page + 1;
        }

        debug!(
            "Equal split of {} pages into {} parts (~{} pages each)",
            total_pages, divisions, base
        );
        Ok(ranges)
    }
}
