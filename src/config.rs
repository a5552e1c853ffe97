use crate::error::{Result, SplitterError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A heading rule for text detection: a regex and the capture group holding the title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingPattern {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub title_group: usize,
}

impl HeadingPattern {
    pub fn new(name: &str, pattern: &str, title_group: usize) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            title_group,
        }
    }
}

/// Default heading rules, highest priority first.
pub fn default_heading_patterns() -> Vec<HeadingPattern> {
    vec![
        HeadingPattern::new(
            "chapter",
            r"(?i)^(chapter\s+(?:\d+|[ivxlc]+)\b.*)$",
            1,
        ),
        HeadingPattern::new("part", r"(?i)^(part\s+(?:\d+|[ivxlc]+)\b.*)$", 1),
        HeadingPattern::new("section", r"(?i)^(section\s+\d+(?:\.\d+)*\b.*)$", 1),
        HeadingPattern::new("unit", r"(?i)^((?:unit|module)\s+\d+\b.*)$", 1),
        HeadingPattern::new("numbered", r"^(\d{1,3}\.\s+[A-Za-z].*)$", 1),
        HeadingPattern::new("all-caps", r"^([A-Z][A-Z0-9 ,:'&\-]{2,58}[A-Z0-9])$", 1),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_samples: usize,
    pub sample_chars: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            timeout_secs: 60,
            max_samples: 20,
            sample_chars: 500,
        }
    }
}

/// Tunables for one split job's detection and resolution steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub max_outline_depth: usize,
    pub leaf_only: bool,
    pub scan_lines: usize,
    pub heading_patterns: Vec<HeadingPattern>,
    pub collapse_repeated_titles: bool,
    pub max_title_len: usize,
    pub front_matter_title: String,
    pub gap_title_prefix: String,
    pub ai: AiConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_outline_depth: 10,
            leaf_only: false,
            scan_lines: 5,
            heading_patterns: default_heading_patterns(),
            collapse_repeated_titles: true,
            max_title_len: 80,
            front_matter_title: "Front Matter".to_string(),
            gap_title_prefix: "Uncovered Pages".to_string(),
            ai: AiConfig::default(),
        }
    }
}

impl DetectionConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SplitterError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_outline_depth == 0 {
            return Err(SplitterError::Config {
                reason: "max_outline_depth must be at least 1".to_string(),
            });
        }
        if self.scan_lines == 0 {
            return Err(SplitterError::Config {
                reason: "scan_lines must be at least 1".to_string(),
            });
        }
        if self.max_title_len == 0 {
            return Err(SplitterError::Config {
                reason: "max_title_len must be at least 1".to_string(),
            });
        }
        if self.front_matter_title.trim().is_empty() {
            return Err(SplitterError::Config {
                reason: "front_matter_title must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
