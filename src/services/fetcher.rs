use crate::error::{Result, SplitterError};
use crate::types::{SourceInfo, SourceType};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};
use url::Url;
use walkdir::WalkDir;

/// Loads PDF bytes from local paths or http(s) URLs.
pub struct ContentFetcher;

impl ContentFetcher {
    pub async fn fetch_content(source: &str) -> Result<(Vec<u8>, SourceInfo)> {
        if Self::is_url(source) {
            Self::fetch_from_url(source).await
        } else {
            Self::fetch_from_file(source).await
        }
    }

    async fn fetch_from_url(url: &str) -> Result<(Vec<u8>, SourceInfo)> {
        info!("Downloading PDF from URL: {}", url);

        let parsed_url = Url::parse(url)?;
        let response = reqwest::get(parsed_url.clone()).await?;

        if !response.status().is_success() {
            return Err(SplitterError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await?.to_vec();
        let info = SourceInfo {
            filename: Self::extract_filename_from_url(&parsed_url),
            source_type: SourceType::Url,
            created_at: chrono::Utc::now().to_rfc3339(),
            size_bytes: bytes.len(),
        };

        Ok((bytes, info))
    }

    async fn fetch_from_file(file_path: &str) -> Result<(Vec<u8>, SourceInfo)> {
        info!("Reading file: {}", file_path);

        let path = Path::new(file_path);
        if !path.is_file() {
            return Err(SplitterError::FileNotFound {
                path: file_path.to_string(),
            });
        }

        let bytes = fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();

        let info = SourceInfo {
            filename,
            source_type: SourceType::LocalFile,
            created_at: chrono::Utc::now().to_rfc3339(),
            size_bytes: bytes.len(),
        };

        Ok((bytes, info))
    }

    fn is_url(source: &str) -> bool {
        source.starts_with("http://") || source.starts_with("https://")
    }

    fn extract_filename_from_url(url: &Url) -> String {
        url.path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or("downloaded.pdf")
            .to_string()
    }

    /// Check every source and expand directories into the PDFs they contain,
    /// sorted by path.
    pub fn validate_sources(sources: &[String]) -> Result<Vec<String>> {
        let mut validated = Vec::new();

        for source in sources {
            if Self::is_url(source) {
                Url::parse(source)?;
                validated.push(source.clone());
                continue;
            }

            let path = Path::new(source);
            if path.is_file() {
                validated.push(source.clone());
            } else if path.is_dir() {
                let mut found: Vec<String> = WalkDir::new(path)
                    .into_iter()
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.file_type().is_file() && Self::is_pdf(entry.path()))
                    .map(|entry| entry.path().display().to_string())
                    .collect();
                found.sort();
                debug!("Found {} PDF(s) under {}", found.len(), source);
                validated.extend(found);
            } else {
                return Err(SplitterError::FileNotFound {
                    path: source.clone(),
                });
            }
        }

        Ok(validated)
    }

    fn is_pdf(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }
}
