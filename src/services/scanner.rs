use crate::config::HeadingPattern;
use crate::error::{Result, SplitterError};
use crate::types::BoundaryHint;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, info};

const MIN_HEADING_CHARS: usize = 3;
const MAX_HEADING_CHARS: usize = 100;

struct CompiledPattern {
    name: String,
    regex: Regex,
    title_group: usize,
}

/// Proposes chapter starts from heading-like lines at the top of each page.
///
/// Patterns are tried in priority order; for each pattern the leading lines
/// are tried top to bottom, and the first hit decides the page's title.
pub struct TextHeuristicScanner {
    patterns: Vec<CompiledPattern>,
    scan_lines: usize,
    max_title_len: usize,
    collapse_repeated_titles: bool,
}

impl TextHeuristicScanner {
    pub fn new(patterns: &[HeadingPattern], scan_lines: usize) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let regex = Regex::new(&p.pattern).map_err(|e| SplitterError::InvalidPattern {
                    name: p.name.clone(),
                    reason: e.to_string(),
                })?;
                if p.title_group >= regex.captures_len() {
                    return Err(SplitterError::InvalidPattern {
                        name: p.name.clone(),
                        reason: format!(
                            "capture group {} does not exist (pattern has {})",
                            p.title_group,
                            regex.captures_len() - 1
                        ),
                    });
                }
                Ok(CompiledPattern {
                    name: p.name.clone(),
                    regex,
                    title_group: p.title_group,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            patterns,
            scan_lines: scan_lines.max(1),
            max_title_len: 80,
            collapse_repeated_titles: true,
        })
    }

    pub fn with_max_title_len(mut self, max_title_len: usize) -> Self {
        self.max_title_len = max_title_len.max(1);
        self
    }

    pub fn with_collapse_repeated_titles(mut self, collapse: bool) -> Self {
        self.collapse_repeated_titles = collapse;
        self
    }

    /// Scan pages in order. `pages[i]` is the text of page `i + 1`.
    pub fn scan<S: AsRef<str>>(&self, pages: &[S]) -> Vec<BoundaryHint> {
        let mut hints: Vec<BoundaryHint> = Vec::new();

        for (idx, text) in pages.iter().enumerate() {
            let page = idx + 1;
            let Some((pattern, title)) = self.match_page(text.as_ref()) else {
                continue;
            };

            if self.collapse_repeated_titles {
                if let Some(prev) = hints.last() {
                    if prev.title == title {
                        debug!("Page {} repeats heading '{}', skipping", page, title);
                        continue;
                    }
                }
            }

            debug!("Page {} matched '{}': {}", page, pattern, title);
            hints.push(BoundaryHint::new(title, page));
        }

        info!("Text scan found {} heading(s) in {} pages", hints.len(), pages.len());
        hints
    }

    /// Returns the winning pattern name and the extracted title for one page.
    pub fn match_page(&self, text: &str) -> Option<(&str, String)> {
        let lines = self.leading_lines(text);

        for pattern in &self.patterns {
            for line in &lines {
                let Some(captures) = pattern.regex.captures(line) else {
                    continue;
                };
                let Some(title) = captures.get(pattern.title_group) else {
                    continue;
                };
                let title = self.clean_title(title.as_str());
                if !title.is_empty() {
                    return Some((pattern.name.as_str(), title));
                }
            }
        }
        None
    }

    fn leading_lines<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(self.scan_lines)
            .filter(|line| {
                let len = line.chars().count();
                (MIN_HEADING_CHARS..=MAX_HEADING_CHARS).contains(&len)
            })
            .collect()
    }

    fn clean_title(&self, raw: &str) -> String {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.chars().take(self.max_title_len).collect::<String>().trim().to_string()
    }

    /// Per-pattern hit counts, for the analyze report.
    pub fn pattern_stats<S: AsRef<str>>(&self, pages: &[S]) -> HashMap<String, usize> {
        let mut stats = HashMap::new();
        for text in pages {
            if let Some((name, _)) = self.match_page(text.as_ref()) {
                *stats.entry(name.to_string()).or_insert(0) += 1;
            }
        }
        stats
    }
}

impl Default for TextHeuristicScanner {
    fn default() -> Self {
        // The built-in pattern list is known to compile.
        match Self::new(&crate::config::default_heading_patterns(), 5) {
            Ok(scanner) => scanner,
            Err(e) => panic!("default heading patterns are invalid: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_headings() {
        let pages = vec![
            "Copyright 2024\nAll rights reserved",
            "Chapter 1: Beginnings\nIt was a dark night.",
            "more text\nand more",
            "CHAPTER II\nThe Road",
        ];
        let hints = TextHeuristicScanner::default().scan(&pages);
        assert_eq!(
            hints,
            vec![
                BoundaryHint::new("Chapter 1: Beginnings", 2),
                BoundaryHint::new("CHAPTER II", 4),
            ]
        );
    }

    #[test]
    fn test_priority_beats_line_order() {
        // The all-caps line comes first, but the chapter pattern has priority.
        let scanner = TextHeuristicScanner::default();
        let (name, title) = scanner
            .match_page("INTRODUCTION\nChapter 3 The Middle\nbody")
            .unwrap();
        assert_eq!(name, "chapter");
        assert_eq!(title, "Chapter 3 The Middle");
    }

    #[test]
    fn test_only_leading_lines_are_scanned() {
        let scanner = TextHeuristicScanner::new(&crate::config::default_heading_patterns(), 2)
            .unwrap();
        assert!(scanner.match_page("plain\nplain\nChapter 9").is_none());
        assert!(scanner.match_page("\n\nplain\nChapter 9").is_some());
    }

    #[test]
    fn test_custom_capture_group() {
        let patterns = vec![HeadingPattern::new("lesson", r"^Lesson \d+:\s*(.+)$", 1)];
        let scanner = TextHeuristicScanner::new(&patterns, 5).unwrap();
        let hints = scanner.scan(&["Lesson 4:   Fractions  and  Ratios"]);
        assert_eq!(hints, vec![BoundaryHint::new("Fractions and Ratios", 1)]);
    }

    #[test]
    fn test_repeated_running_header_collapses() {
        let pages = vec!["INTRODUCTION\ntext", "INTRODUCTION\ntext", "METHODS\ntext"];
        let hints = TextHeuristicScanner::default().scan(&pages);
        assert_eq!(hints.len(), 2);
        assert_eq!(hints[1], BoundaryHint::new("METHODS", 3));

        let hints = TextHeuristicScanner::default()
            .with_collapse_repeated_titles(false)
            .scan(&pages);
        assert_eq!(hints.len(), 3);
    }

    #[test]
    fn test_long_lines_ignored() {
        let long = format!("Chapter 1 {}", "x".repeat(200));
        assert!(TextHeuristicScanner::default().match_page(&long).is_none());
    }

    #[test]
    fn test_invalid_patterns_rejected() {
        let bad_regex = vec![HeadingPattern::new("broken", r"(unclosed", 0)];
        assert!(matches!(
            TextHeuristicScanner::new(&bad_regex, 5),
            Err(SplitterError::InvalidPattern { .. })
        ));

        let bad_group = vec![HeadingPattern::new("grp", r"^Chapter (\d+)$", 2)];
        assert!(matches!(
            TextHeuristicScanner::new(&bad_group, 5),
            Err(SplitterError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_pattern_stats() {
        let pages = vec!["Chapter 1", "1. Overview", "Chapter 2", "nothing here"];
        let stats = TextHeuristicScanner::default().pattern_stats(&pages);
        assert_eq!(stats.get("chapter"), Some(&2));
        assert_eq!(stats.get("numbered"), Some(&1));
    }
}
