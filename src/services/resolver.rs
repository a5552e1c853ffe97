//! Turns boundary hints or explicit ranges into a finalized range list.
//!
//! A finalized list is sorted by start page, has no overlaps, and covers
//! `[1, total_pages]` exactly. Every path through the resolver ends in
//! [`RangeResolver::validate_coverage`], which checks that once.

use crate::error::{Result, SplitterError};
use crate::types::{BoundaryHint, ChapterRange, GapPolicy};
use std::collections::HashSet;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct RangeResolver {
    policy: GapPolicy,
    front_matter_title: String,
    gap_title_prefix: String,
}

impl RangeResolver {
    pub fn new(policy: GapPolicy) -> Self {
        Self {
            policy,
            front_matter_title: "Front Matter".to_string(),
            gap_title_prefix: "Uncovered Pages".to_string(),
        }
    }

    pub fn with_titles(
        mut self,
        front_matter_title: impl Into<String>,
        gap_title_prefix: impl Into<String>,
    ) -> Self {
        self.front_matter_title = front_matter_title.into();
        self.gap_title_prefix = gap_title_prefix.into();
        self
    }

    pub fn policy(&self) -> GapPolicy {
        self.policy
    }

    /// Derive ranges from chapter start hints.
    pub fn resolve(&self, hints: &[BoundaryHint], total_pages: usize) -> Result<Vec<ChapterRange>> {
        let mut seen = HashSet::new();
        let mut kept: Vec<&BoundaryHint> = Vec::with_capacity(hints.len());
        for hint in hints {
            if hint.start_page == 0 || hint.start_page > total_pages {
                debug!(
                    "Dropping hint '{}' at page {} (document has {} pages)",
                    hint.title, hint.start_page, total_pages
                );
                continue;
            }
            if !seen.insert(hint.start_page) {
                debug!(
                    "Dropping duplicate hint '{}' at page {}",
                    hint.title, hint.start_page
                );
                continue;
            }
            kept.push(hint);
        }

        if kept.is_empty() {
            return Err(SplitterError::empty("no hints inside the document"));
        }
        kept.sort_by_key(|hint| hint.start_page);

        let mut ranges = Vec::with_capacity(kept.len() + 1);
        let first_start = kept[0].start_page;
        if first_start > 1 {
            match self.policy {
                GapPolicy::FillGaps => ranges.push(ChapterRange::new(
                    self.front_matter_title.clone(),
                    1,
                    first_start - 1,
                )),
                GapPolicy::RejectGaps => {
                    return Err(SplitterError::CoverageGap {
                        start: 1,
                        end: first_start - 1,
                    })
                }
            }
        }

        for (idx, hint) in kept.iter().enumerate() {
            let end_page = kept
                .get(idx + 1)
                .map(|next| next.start_page - 1)
                .unwrap_or(total_pages);
            ranges.push(ChapterRange::new(
                display_title(&hint.title),
                hint.start_page,
                end_page,
            ));
        }

        self.validate_coverage(&ranges, total_pages)?;
        info!("Resolved {} hint(s) into {} range(s)", hints.len(), ranges.len());
        Ok(ranges)
    }

    /// Check and repair ranges that already carry end pages.
    ///
    /// Ranges are ordered by start page (stable), overlaps are always an
    /// error, and gaps follow the resolver's policy.
    pub fn resolve_ranges(
        &self,
        ranges: &[ChapterRange],
        total_pages: usize,
    ) -> Result<Vec<ChapterRange>> {
        if ranges.is_empty() {
            return Err(SplitterError::empty("no ranges given"));
        }

        for range in ranges {
            if range.start_page > range.end_page {
                return Err(SplitterError::InvalidRangeOrder {
                    title: range.title.clone(),
                    start_page: range.start_page,
                    end_page: range.end_page,
                });
            }
            for page in [range.start_page, range.end_page] {
                if page == 0 || page > total_pages {
                    return Err(SplitterError::OutOfBounds {
                        title: range.title.clone(),
                        page,
                        total_pages,
                    });
                }
            }
        }

        let mut sorted: Vec<ChapterRange> = ranges.to_vec();
        sorted.sort_by_key(|range| range.start_page);

        for pair in sorted.windows(2) {
            if pair[0].end_page >= pair[1].start_page {
                return Err(SplitterError::Overlap {
                    first: pair[0].clone(),
                    second: pair[1].clone(),
                });
            }
        }

        let mut finalized = Vec::with_capacity(sorted.len());
        let mut next_page = 1;
        for range in sorted {
            if range.start_page > next_page {
                finalized.push(self.gap_range(next_page, range.start_page - 1)?);
            }
            next_page = range.end_page + 1;
            finalized.push(ChapterRange::new(
                display_title(&range.title),
                range.start_page,
                range.end_page,
            ));
        }
        if next_page <= total_pages {
            finalized.push(self.gap_range(next_page, total_pages)?);
        }

        self.validate_coverage(&finalized, total_pages)?;
        Ok(finalized)
    }

    fn gap_range(&self, start: usize, end: usize) -> Result<ChapterRange> {
        match self.policy {
            GapPolicy::RejectGaps => Err(SplitterError::CoverageGap { start, end }),
            GapPolicy::FillGaps if start == 1 => {
                Ok(ChapterRange::new(self.front_matter_title.clone(), start, end))
            }
            GapPolicy::FillGaps => Ok(ChapterRange::new(
                format!("{} {}-{}", self.gap_title_prefix, start, end),
                start,
                end,
            )),
        }
    }

    /// Assert the finalized-list invariants. A failure here is a bug in the
    /// derivation, so it is logged and never repaired.
    pub fn validate_coverage(&self, ranges: &[ChapterRange], total_pages: usize) -> Result<()> {
        let mut expected_start = 1;
        for range in ranges {
            if range.start_page != expected_start
                || range.start_page > range.end_page
                || range.end_page > total_pages
                || range.title.trim().is_empty()
            {
                error!(
                    "Range invariant violated at {} (expected start {}, {} pages)",
                    range, expected_start, total_pages
                );
                return Err(SplitterError::InvalidRangeOrder {
                    title: range.title.clone(),
                    start_page: range.start_page,
                    end_page: range.end_page,
                });
            }
            expected_start = range.end_page + 1;
        }

        if expected_start != total_pages + 1 {
            error!(
                "Ranges end at page {} but document has {} pages",
                expected_start.saturating_sub(1),
                total_pages
            );
            return Err(SplitterError::CoverageGap {
                start: expected_start,
                end: total_pages,
            });
        }
        Ok(())
    }
}

impl Default for RangeResolver {
    fn default() -> Self {
        Self::new(GapPolicy::FillGaps)
    }
}

fn display_title(raw: &str) -> String {
    let title = raw.trim();
    if title.is_empty() {
        "Untitled".to_string()
    } else {
        title.to_string()
    }
}
