use crate::config::DetectionConfig;
use crate::error::{Result, SplitterError};
use crate::services::suggester::sample_pages;
use crate::services::{
    BoundarySuggester, EqualSplitter, ManualRangeParser, OutlineFlattener, OutputNamer, PageSource,
    RangeResolver, TextHeuristicScanner,
};
use crate::types::{BoundaryHint, ChapterRange, GapPolicy, NamedRange};
use serde::Serialize;
use tracing::{info, warn};

/// Ranges plus the detector that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub origin: String,
    pub ranges: Vec<ChapterRange>,
}

/// Everything one split job needs: the document, the tunables and the gap
/// policy for automatically detected boundaries. Nothing here outlives the job.
pub struct SplitJob<'a, S: PageSource + ?Sized> {
    source: &'a S,
    config: &'a DetectionConfig,
    policy: GapPolicy,
}

impl<'a, S: PageSource + ?Sized> SplitJob<'a, S> {
    pub fn new(source: &'a S, config: &'a DetectionConfig) -> Self {
        Self {
            source,
            config,
            policy: GapPolicy::FillGaps,
        }
    }

    pub fn with_policy(mut self, policy: GapPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn total_pages(&self) -> usize {
        self.source.total_pages()
    }

    pub fn resolver(&self, policy: GapPolicy) -> RangeResolver {
        RangeResolver::new(policy)
            .with_titles(&self.config.front_matter_title, &self.config.gap_title_prefix)
    }

    pub fn resolve(&self, hints: &[BoundaryHint]) -> Result<Vec<ChapterRange>> {
        self.resolver(self.policy).resolve(hints, self.total_pages())
    }

    pub fn resolve_ranges(&self, ranges: &[ChapterRange]) -> Result<Vec<ChapterRange>> {
        self.resolver(self.policy)
            .resolve_ranges(ranges, self.total_pages())
    }

    pub fn detect_from_outline(&self) -> Result<Vec<ChapterRange>> {
        let roots = self.source.outline();
        let hints = OutlineFlattener::new(self.config.max_outline_depth, self.config.leaf_only)
            .flatten(&roots, self.total_pages());
        if hints.is_empty() {
            return Err(SplitterError::empty("document has no usable outline"));
        }
        info!("Outline produced {} boundaries", hints.len());
        self.resolve(&hints)
    }

    pub fn detect_from_text(&self) -> Result<Vec<ChapterRange>> {
        let hints = self.scanner()?.scan(&self.page_texts());
        if hints.is_empty() {
            return Err(SplitterError::empty("no heading patterns matched"));
        }
        self.resolve(&hints)
    }

    pub fn detect_from_suggestions(
        &self,
        suggester: &dyn BoundarySuggester,
    ) -> Result<Vec<ChapterRange>> {
        let samples = sample_pages(
            self.source,
            self.config.ai.max_samples,
            self.config.ai.sample_chars,
        );
        if samples.is_empty() {
            return Err(SplitterError::empty("no page text to sample"));
        }
        let hints = suggester.suggest_boundaries(&samples, self.total_pages())?;
        self.resolve(&hints)
    }

    /// Outline, then text headings, then the whole document as one range.
    pub fn detect_auto(&self) -> Result<Detection> {
        match self.detect_from_outline() {
            Ok(ranges) => return Ok(Detection::new("outline", ranges)),
            Err(e) if e.is_recoverable() => info!("Outline detection unavailable: {}", e),
            Err(e) => return Err(e),
        }
        match self.detect_from_text() {
            Ok(ranges) => return Ok(Detection::new("text", ranges)),
            Err(e) if e.is_recoverable() => info!("Text detection unavailable: {}", e),
            Err(e) => return Err(e),
        }
        warn!("No chapter boundaries found, keeping the document whole");
        let ranges = self.resolve(&[BoundaryHint::new("Full Document", 1)])?;
        Ok(Detection::new("whole-document", ranges))
    }

    pub fn equal_split(&self, divisions: usize) -> Result<Vec<ChapterRange>> {
        EqualSplitter::split(self.total_pages(), divisions)
    }

    pub fn parse_manual(&self, spec: &str, policy: GapPolicy) -> Result<Vec<ChapterRange>> {
        ManualRangeParser::parse_with_resolver(spec, self.total_pages(), &self.resolver(policy))
    }

    pub fn name_outputs(&self, ranges: &[ChapterRange]) -> Vec<NamedRange> {
        OutputNamer::new(self.config.max_title_len).name(ranges)
    }

    pub fn scanner(&self) -> Result<TextHeuristicScanner> {
        Ok(
            TextHeuristicScanner::new(&self.config.heading_patterns, self.config.scan_lines)?
                .with_max_title_len(self.config.max_title_len)
                .with_collapse_repeated_titles(self.config.collapse_repeated_titles),
        )
    }

    /// Text of every page; a page that fails to decode counts as blank.
    pub fn page_texts(&self) -> Vec<String> {
        (1..=self.total_pages())
            .map(|page| {
                self.source.page_text(page).unwrap_or_else(|e| {
                    warn!("Could not read text of page {}: {}", page, e);
                    String::new()
                })
            })
            .collect()
    }
}

impl Detection {
    fn new(origin: &str, ranges: Vec<ChapterRange>) -> Self {
        Self {
            origin: origin.to_string(),
            ranges,
        }
    }
}
