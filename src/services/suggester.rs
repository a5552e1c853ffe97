use crate::config::AiConfig;
use crate::error::{Result, SplitterError};
use crate::services::document::PageSource;
use crate::types::{BoundaryHint, PageSample};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// An external classifier that proposes chapter starts from page excerpts.
///
/// Implementations make one blocking, time-bounded request. Errors are
/// recoverable: callers fall back to outline or text detection.
pub trait BoundarySuggester {
    fn suggest_boundaries(
        &self,
        samples: &[PageSample],
        total_pages: usize,
    ) -> Result<Vec<BoundaryHint>>;
}

/// Pick up to `max_samples` evenly spaced pages and keep the first
/// `sample_chars` characters of each, whitespace collapsed.
pub fn sample_pages<S: PageSource + ?Sized>(
    source: &S,
    max_samples: usize,
    sample_chars: usize,
) -> Vec<PageSample> {
    let total_pages = source.total_pages();
    let max_samples = max_samples.max(1);
    let step = total_pages.div_ceil(max_samples).max(1);
    let mut samples = Vec::new();

    for page in (1..=total_pages).step_by(step) {
        if samples.len() >= max_samples {
            break;
        }
        let text = match source.page_text(page) {
            Ok(text) => text,
            Err(e) => {
                debug!("Skipping page {} in samples: {}", page, e);
                continue;
            }
        };
        let excerpt: String = text.chars().take(sample_chars).collect();
        let excerpt = excerpt.split_whitespace().collect::<Vec<_>>().join(" ");
        if !excerpt.is_empty() {
            samples.push(PageSample { page, text: excerpt });
        }
    }

    samples
}

pub fn build_prompt(samples: &[PageSample], total_pages: usize) -> String {
    let excerpts = samples
        .iter()
        .map(|s| format!("[Page {}]: {}", s.page, s.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Analyze this PDF text and identify chapter or section boundaries.\n\
         The PDF has {total} total pages.\n\n\
         TEXT CONTENT (with page numbers):\n{excerpts}\n\n\
         RESPOND WITH ONLY a JSON array in this exact format (no markdown, no explanation):\n\
         [{{\"title\": \"Chapter Title\", \"start_page\": 1}}, {{\"title\": \"Next Chapter\", \"start_page\": 11}}]\n\n\
         RULES:\n\
         - Page numbers must be between 1 and {total}\n\
         - List chapters in reading order\n\
         - Use descriptive titles based on the content",
        total = total_pages,
        excerpts = excerpts
    )
}

/// Extract boundary hints from a model reply that contains a JSON array,
/// possibly wrapped in prose or a code fence.
///
/// Entries without a usable integer `start_page` are skipped. End pages in
/// the reply are ignored; the resolver derives them.
pub fn parse_suggestions(reply: &str) -> Result<Vec<BoundaryHint>> {
    let array = Regex::new(r"(?s)\[.*\]")
        .ok()
        .and_then(|re| re.find(reply))
        .ok_or_else(|| SplitterError::Suggestion {
            reason: "no JSON array in reply".to_string(),
        })?;

    let entries: Vec<Value> =
        serde_json::from_str(array.as_str()).map_err(|e| SplitterError::Suggestion {
            reason: format!("invalid JSON in reply: {}", e),
        })?;

    let mut hints = Vec::with_capacity(entries.len());
    for entry in &entries {
        let start_page = match entry.get("start_page") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        let Some(start_page) = start_page else {
            warn!("Skipping suggestion without a page number: {}", entry);
            continue;
        };
        let title = entry
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Untitled");
        hints.push(BoundaryHint::new(title, start_page as usize));
    }

    Ok(hints)
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// Gemini `generateContent` client.
pub struct GeminiSuggester {
    client: reqwest::blocking::Client,
    api_key: String,
    config: AiConfig,
}

impl GeminiSuggester {
    pub fn new(api_key: impl Into<String>, config: AiConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().len() < 10 {
            return Err(SplitterError::Config {
                reason: "Gemini API key is too short".to_string(),
            });
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    fn request(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        );
        let url = url::Url::parse(&url)?;
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    SplitterError::SuggestionTimeout {
                        seconds: self.config.timeout_secs,
                    }
                } else {
                    SplitterError::Suggestion {
                        reason: e.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(SplitterError::Suggestion {
                reason: format!("model returned HTTP {}", response.status().as_u16()),
            });
        }

        let parsed: GenerateResponse = response.json().map_err(|e| SplitterError::Suggestion {
            reason: format!("unreadable model response: {}", e),
        })?;

        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();
        if text.trim().is_empty() {
            return Err(SplitterError::Suggestion {
                reason: "model returned no text".to_string(),
            });
        }
        Ok(text)
    }
}

impl BoundarySuggester for GeminiSuggester {
    fn suggest_boundaries(
        &self,
        samples: &[PageSample],
        total_pages: usize,
    ) -> Result<Vec<BoundaryHint>> {
        info!(
            "Requesting chapter suggestions from {} for {} sampled pages",
            self.config.model,
            samples.len()
        );
        let reply = self.request(&build_prompt(samples, total_pages))?;
        let hints = parse_suggestions(&reply)?;
        info!("Model suggested {} boundaries", hints.len());
        Ok(hints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutlineNode;

    struct Pages(Vec<String>);

    impl PageSource for Pages {
        fn total_pages(&self) -> usize {
            self.0.len()
        }
        fn outline(&self) -> Vec<OutlineNode> {
            Vec::new()
        }
        fn page_text(&self, page: usize) -> Result<String> {
            Ok(self.0[page - 1].clone())
        }
        fn extract_pages(&self, _start: usize, _end: usize) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "Here you go:\n```json\n[\n  {\"title\": \"Intro\", \"start_page\": 1, \"end_page\": 4},\n  {\"title\": \"Body\", \"start_page\": \"5\"}\n]\n```";
        let hints = parse_suggestions(reply).unwrap();
        assert_eq!(
            hints,
            vec![BoundaryHint::new("Intro", 1), BoundaryHint::new("Body", 5)]
        );
    }

    #[test]
    fn test_parse_skips_bad_entries() {
        let reply = r#"[{"title": "No page"}, {"start_page": 3}, "junk", {"title": "X", "start_page": -2}]"#;
        let hints = parse_suggestions(reply).unwrap();
        assert_eq!(hints, vec![BoundaryHint::new("Untitled", 3)]);
    }

    #[test]
    fn test_parse_without_array_fails() {
        let err = parse_suggestions("I could not find chapters.").unwrap_err();
        assert!(err.is_recoverable());
        assert!(matches!(
            parse_suggestions("[not json]"),
            Err(SplitterError::Suggestion { .. })
        ));
    }

    #[test]
    fn test_sample_pages_evenly() {
        let pages = Pages((1..=40).map(|i| format!("page   {}\n\ntext", i)).collect());
        let samples = sample_pages(&pages, 10, 500);
        assert_eq!(samples.len(), 10);
        assert_eq!(samples[1].page, 5);
        assert_eq!(samples[0].text, "page 1 text");
    }

    #[test]
    fn test_sample_pages_span_short_documents() {
        let pages = Pages((1..=39).map(|i| format!("page {}", i)).collect());
        let samples = sample_pages(&pages, 20, 500);
        let numbers: Vec<usize> = samples.iter().map(|s| s.page).collect();
        assert_eq!(numbers.len(), 20);
        assert_eq!(numbers[1], 3);
        assert_eq!(numbers.last(), Some(&39));
    }

    #[test]
    fn test_sample_pages_truncates() {
        let pages = Pages(vec!["abcdefghij".to_string(), "   ".to_string()]);
        let samples = sample_pages(&pages, 20, 4);
        assert_eq!(samples, vec![PageSample { page: 1, text: "abcd".to_string() }]);
    }

    #[test]
    fn test_prompt_mentions_pages() {
        let prompt = build_prompt(&[PageSample { page: 3, text: "Hello".to_string() }], 42);
        assert!(prompt.contains("[Page 3]: Hello"));
        assert!(prompt.contains("42 total pages"));
    }

    #[test]
    fn test_short_key_rejected() {
        assert!(GeminiSuggester::new("abc", AiConfig::default()).is_err());
    }
}
