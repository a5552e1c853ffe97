use crate::error::{Result, SplitterError};
use crate::services::document::PageSource;
use crate::types::{NamedRange, SplitConfig, SplitResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Writes one output document per named range.
pub struct DocumentSplitter;

impl DocumentSplitter {
    pub async fn split_document<S>(
        source: Arc<S>,
        source_name: &str,
        ranges: &[NamedRange],
        config: &SplitConfig,
    ) -> Result<SplitResult>
    where
        S: PageSource + Send + Sync + 'static,
    {
        let total_pages = source.total_pages();
        info!(
            "Splitting '{}' ({} pages) into {} files",
            source_name,
            total_pages,
            ranges.len()
        );

        Self::validate_ranges(ranges, total_pages)?;

        let output_files: Vec<PathBuf> = ranges
            .iter()
            .map(|named| config.output_dir.join(&named.filename))
            .collect();
        let pages_written = ranges.iter().map(|named| named.range.page_count()).sum();

        if config.dry_run {
            for (named, path) in ranges.iter().zip(&output_files) {
                info!("  [dry run] {} -> {}", named.range, path.display());
            }
            return Ok(SplitResult {
                output_files,
                total_pages,
                pages_written: 0,
                manifest_file: None,
            });
        }

        Self::ensure_output_directory(&config.output_dir).await?;

        let parts = Self::extract_all(source, ranges).await?;
        for (written, ((named, path), bytes)) in
            ranges.iter().zip(&output_files).zip(parts).enumerate()
        {
            if let Err(e) = fs::write(path, &bytes).await {
                Self::remove_partial_output(&output_files[..written]).await;
                return Err(SplitterError::OutputDirectory {
                    reason: format!("Failed to write split file {}: {}", path.display(), e),
                });
            }
            debug!(
                "Wrote {} ({} pages, {} bytes)",
                named.filename,
                named.range.page_count(),
                bytes.len()
            );
        }

        let manifest_file = if config.include_manifest {
            let manifest_path = Self::manifest_filename(&config.output_dir, source_name);
            Self::write_manifest(&manifest_path, source_name, total_pages, ranges).await?;
            Some(manifest_path)
        } else {
            None
        };

        info!(
            "Successfully split '{}' into {} files",
            source_name,
            output_files.len()
        );

        Ok(SplitResult {
            output_files,
            total_pages,
            pages_written,
            manifest_file,
        })
    }

    /// Extract every range, in parallel when the source allows it.
    /// Results come back in range order either way.
    async fn extract_all<S>(source: Arc<S>, ranges: &[NamedRange]) -> Result<Vec<Vec<u8>>>
    where
        S: PageSource + Send + Sync + 'static,
    {
        let spawn = |start: usize, end: usize| -> JoinHandle<Result<Vec<u8>>> {
            let source = Arc::clone(&source);
            tokio::task::spawn_blocking(move || source.extract_pages(start, end))
        };

        let mut parts = Vec::with_capacity(ranges.len());
        if source.supports_concurrent_extraction() {
            debug!("Extracting {} ranges concurrently", ranges.len());
            let handles: Vec<_> = ranges
                .iter()
                .map(|named| spawn(named.range.start_page, named.range.end_page))
                .collect();
            for handle in handles {
                parts.push(handle.await??);
            }
        } else {
            debug!("Extracting {} ranges sequentially", ranges.len());
            for named in ranges {
                parts.push(spawn(named.range.start_page, named.range.end_page).await??);
            }
        }
        Ok(parts)
    }

    /// A failed split leaves no partial output behind.
    async fn remove_partial_output(written: &[PathBuf]) {
        for path in written {
            match fs::remove_file(path).await {
                Ok(()) => debug!("Removed partial output {}", path.display()),
                Err(e) => warn!("Could not remove partial output {}: {}", path.display(), e),
            }
        }
    }

    fn validate_ranges(ranges: &[NamedRange], total_pages: usize) -> Result<()> {
        if ranges.is_empty() {
            return Err(SplitterError::empty("nothing to split"));
        }
        if total_pages == 0 {
            return Err(SplitterError::Config {
                reason: "Document has no pages to split".to_string(),
            });
        }
        for named in ranges {
            let range = &named.range;
            if range.start_page == 0 || range.end_page > total_pages {
                return Err(SplitterError::OutOfBounds {
                    title: range.title.clone(),
                    page: if range.start_page == 0 { 0 } else { range.end_page },
                    total_pages,
                });
            }
            if range.start_page > range.end_page {
                return Err(SplitterError::InvalidRangeOrder {
                    title: range.title.clone(),
                    start_page: range.start_page,
                    end_page: range.end_page,
                });
            }
        }
        Ok(())
    }

    async fn ensure_output_directory(output_dir: &Path) -> Result<()> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir).await.map_err(|e| {
                SplitterError::OutputDirectory {
                    reason: format!("Failed to create output directory: {}", e),
                }
            })?;
            info!("Created output directory: {}", output_dir.display());
        }
        Ok(())
    }

    fn manifest_filename(output_dir: &Path, source_name: &str) -> PathBuf {
        let base_name = Path::new(source_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");

        output_dir.join(format!("{}_manifest.json", base_name))
    }

    async fn write_manifest(
        manifest_path: &Path,
        source_name: &str,
        total_pages: usize,
        ranges: &[NamedRange],
    ) -> Result<()> {
        let manifest = serde_json::json!({
            "source": source_name,
            "total_pages": total_pages,
            "created_at": chrono::Utc::now().to_rfc3339(),
            "total_files": ranges.len(),
            "files": ranges.iter().map(|named| {
                serde_json::json!({
                    "filename": named.filename,
                    "title": named.range.title,
                    "start_page": named.range.start_page,
                    "end_page": named.range.end_page,
                    "pages": named.range.page_count(),
                })
            }).collect::<Vec<_>>()
        });

        let json_content = serde_json::to_string_pretty(&manifest)?;
        fs::write(manifest_path, json_content).await.map_err(|e| {
            SplitterError::OutputDirectory {
                reason: format!("Failed to write manifest file: {}", e),
            }
        })?;

        info!("Generated manifest file: {}", manifest_path.display());
        Ok(())
    }
}
