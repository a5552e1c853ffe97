mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{AnalyzeArgs, Cli, Commands, DetectionArgs, SplitArgs, ValidateArgs};
use pdf_chapter_splitter::{
    ContentFetcher, Detection, DetectionConfig, DetectionStrategy, DocumentSplitter, GapPolicy,
    GeminiSuggester, PageSource, PdfDocument, SplitConfig, SplitJob, SplitterError,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match &cli.command {
        Commands::Split(args) => handle_split_command(args, &cli.output).await,
        Commands::Analyze(args) => handle_analyze_command(args).await,
        Commands::Validate(args) => handle_validate_command(args).await,
    };

    if let Err(e) = result {
        error!("Operation failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(args: &DetectionArgs) -> anyhow::Result<DetectionConfig> {
    let mut config = match &args.config {
        Some(path) => DetectionConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DetectionConfig::default(),
    };
    if let Some(depth) = args.depth {
        config.max_outline_depth = depth;
    }
    if args.leaf_only {
        config.leaf_only = true;
    }
    config.validate()?;
    Ok(config)
}

async fn load_document(source: &str) -> anyhow::Result<(String, Arc<PdfDocument>)> {
    let (bytes, info) = ContentFetcher::fetch_content(source).await?;
    let doc = tokio::task::spawn_blocking(move || PdfDocument::load_mem(&bytes))
        .await?
        .with_context(|| format!("Failed to parse PDF '{}'", info.filename))?;
    info!(
        "Loaded '{}' ({} pages, {:.1} MB)",
        info.filename,
        doc.total_pages(),
        info.size_bytes as f64 / (1024.0 * 1024.0)
    );
    Ok((info.filename, Arc::new(doc)))
}

async fn handle_split_command(args: &SplitArgs, output_dir: &Path) -> anyhow::Result<()> {
    info!("Starting split operation with {} sources", args.sources.len());

    let validated_sources = ContentFetcher::validate_sources(&args.sources)?;
    info!("Validated {} sources", validated_sources.len());
    if validated_sources.is_empty() {
        return Err(SplitterError::FileNotFound {
            path: args.sources.join(", "),
        }
        .into());
    }

    // Check if output directory exists and handle force flag
    if output_dir.exists() && !args.force && !args.dry_run {
        let mut entries = std::fs::read_dir(output_dir).map_err(|e| {
            SplitterError::OutputDirectory {
                reason: format!("Cannot read output directory: {}", e),
            }
        })?;

        if entries.next().is_some() {
            return Err(SplitterError::OutputDirectory {
                reason: "Output directory is not empty. Use --force to overwrite.".to_string(),
            }
            .into());
        }
    }

    let config = Arc::new(load_config(&args.detection)?);
    let policy = args.policy.unwrap_or(match args.mode {
        DetectionStrategy::Manual => GapPolicy::RejectGaps,
        _ => GapPolicy::FillGaps,
    });

    for (idx, source) in validated_sources.iter().enumerate() {
        info!("Processing source {}/{}: {}", idx + 1, validated_sources.len(), source);

        let (name, doc) = load_document(source).await?;
        let detection = plan_ranges(args, Arc::clone(&doc), Arc::clone(&config), policy).await?;

        let job = SplitJob::new(doc.as_ref(), config.as_ref());
        let named = job.name_outputs(&detection.ranges);

        info!(
            "'{}' has {} pages, {} chapters from {}",
            name,
            doc.total_pages(),
            named.len(),
            detection.origin
        );
        for entry in &named {
            info!("  {} <- {}", entry.filename, entry.range);
        }

        let split_config = SplitConfig {
            output_dir: source_output_dir(output_dir, &name, validated_sources.len()),
            include_manifest: !args.no_manifest,
            dry_run: args.dry_run,
        };
        let split_result = DocumentSplitter::split_document(doc, &name, &named, &split_config).await?;

        info!(
            "Created {} files for '{}':",
            split_result.output_files.len(),
            name
        );
        for output_file in &split_result.output_files {
            info!("  - {}", output_file.display());
        }
        if let Some(manifest_file) = &split_result.manifest_file {
            info!("  - {} (manifest)", manifest_file.display());
        }
    }

    info!("Split operation completed successfully!");
    Ok(())
}

/// One subdirectory per document when several are split in one run.
fn source_output_dir(output_dir: &Path, name: &str, source_count: usize) -> PathBuf {
    if source_count <= 1 {
        return output_dir.to_path_buf();
    }
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    output_dir.join(stem)
}

async fn plan_ranges(
    args: &SplitArgs,
    doc: Arc<PdfDocument>,
    config: Arc<DetectionConfig>,
    policy: GapPolicy,
) -> anyhow::Result<Detection> {
    if args.mode == DetectionStrategy::Ai {
        if let Some(detection) = detect_with_ai(args, Arc::clone(&doc), Arc::clone(&config), policy).await {
            return Ok(detection);
        }
    }

    let mode = args.mode;
    let parts = args.parts;
    let spec = args.ranges.clone();
    let detection = tokio::task::spawn_blocking(move || -> pdf_chapter_splitter::Result<Detection> {
        let job = SplitJob::new(doc.as_ref(), config.as_ref()).with_policy(policy);
        match mode {
            DetectionStrategy::Outline => Ok(Detection {
                origin: "outline".to_string(),
                ranges: job.detect_from_outline()?,
            }),
            DetectionStrategy::Text => Ok(Detection {
                origin: "text".to_string(),
                ranges: job.detect_from_text()?,
            }),
            DetectionStrategy::Equal => Ok(Detection {
                origin: format!("equal split into {}", parts),
                ranges: job.equal_split(parts)?,
            }),
            DetectionStrategy::Manual => {
                let spec = spec.ok_or_else(|| SplitterError::Config {
                    reason: "manual mode needs --ranges".to_string(),
                })?;
                Ok(Detection {
                    origin: "manual ranges".to_string(),
                    ranges: job.parse_manual(&spec, policy)?,
                })
            }
            DetectionStrategy::Auto | DetectionStrategy::Ai => job.detect_auto(),
        }
    })
    .await?;

    Ok(detection?)
}

/// Ask the model for boundaries. Any failure, including the deadline,
/// returns `None` so the caller falls back to automatic detection.
async fn detect_with_ai(
    args: &SplitArgs,
    doc: Arc<PdfDocument>,
    config: Arc<DetectionConfig>,
    policy: GapPolicy,
) -> Option<Detection> {
    let Some(api_key) = args
        .api_key
        .clone()
        .or_else(|| std::env::var("GEMINI_API_KEY").ok())
    else {
        warn!("No Gemini API key given, falling back to automatic detection");
        return None;
    };

    let timeout_secs = config.ai.timeout_secs;
    let task = tokio::task::spawn_blocking(move || -> pdf_chapter_splitter::Result<_> {
        let suggester = GeminiSuggester::new(api_key, config.ai.clone())?;
        SplitJob::new(doc.as_ref(), config.as_ref())
            .with_policy(policy)
            .detect_from_suggestions(&suggester)
    });

    let outcome = match tokio::time::timeout(Duration::from_secs(timeout_secs + 5), task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(SplitterError::from(join_error)),
        Err(_) => Err(SplitterError::SuggestionTimeout {
            seconds: timeout_secs,
        }),
    };

    match outcome {
        Ok(ranges) => Some(Detection {
            origin: "ai suggestions".to_string(),
            ranges,
        }),
        Err(e) => {
            warn!("AI detection failed ({}), falling back to automatic detection", e);
            None
        }
    }
}

async fn handle_analyze_command(args: &AnalyzeArgs) -> anyhow::Result<()> {
    info!("Starting analysis of {} sources", args.sources.len());

    let validated_sources = ContentFetcher::validate_sources(&args.sources)?;
    let config = Arc::new(load_config(&args.detection)?);
    let mut all_analyses = HashMap::new();

    for source in validated_sources {
        info!("Analyzing: {}", source);

        let (name, doc) = load_document(&source).await?;
        let job_config = Arc::clone(&config);
        let job_doc = Arc::clone(&doc);
        let (has_outline, detection, stats) = tokio::task::spawn_blocking(move || {
            let job = SplitJob::new(job_doc.as_ref(), job_config.as_ref());
            let has_outline = !job_doc.outline().is_empty();
            let stats = job
                .scanner()
                .map(|scanner| scanner.pattern_stats(&job.page_texts()))
                .unwrap_or_default();
            (has_outline, job.detect_auto(), stats)
        })
        .await?;
        let detection = detection?;
        let total_pages = doc.total_pages();

        println!("\n=== Analysis for '{}' ===", name);
        println!("Total pages: {}", total_pages);
        println!("Has outline: {}", if has_outline { "yes" } else { "no" });
        println!("Chapters detected: {} (from {})", detection.ranges.len(), detection.origin);
        if !stats.is_empty() {
            let mut hits: Vec<_> = stats.iter().collect();
            hits.sort();
            println!("Heading pattern hits:");
            for (pattern, count) in hits {
                println!("  {}: {}", pattern, count);
            }
        }

        let job = SplitJob::new(doc.as_ref(), config.as_ref());
        if args.detailed {
            println!("\nChapter Details:");
            for named in job.name_outputs(&detection.ranges) {
                println!(
                    "  {}: Pages {}-{} ({} pages)",
                    named.filename,
                    named.range.start_page,
                    named.range.end_page,
                    named.range.page_count()
                );
            }
        }

        println!("\nPotential Equal Split Scenarios:");
        for parts in [2, 3, 5, 10] {
            let Ok(ranges) = job.equal_split(parts) else {
                continue;
            };
            println!("  {} parts: ~{} pages per part", parts, total_pages / parts);
            if args.detailed {
                for range in &ranges {
                    println!("    {}: Pages {}-{}", range.title, range.start_page, range.end_page);
                }
            }
        }

        all_analyses.insert(
            source.clone(),
            serde_json::json!({
                "filename": name,
                "total_pages": total_pages,
                "has_outline": has_outline,
                "detection": detection,
                "pattern_hits": stats,
            }),
        );
    }

    if let Some(json_path) = &args.json_output {
        let json_content = serde_json::to_string_pretty(&all_analyses)
            .context("Failed to serialize analysis results")?;

        tokio::fs::write(json_path, json_content)
            .await
            .context("Failed to write JSON analysis file")?;

        info!("Analysis results written to: {}", json_path.display());
    }

    Ok(())
}

async fn handle_validate_command(args: &ValidateArgs) -> anyhow::Result<()> {
    info!("Validating ranges against {}", args.source);

    let (name, doc) = load_document(&args.source).await?;
    let config = DetectionConfig::default();
    let job = SplitJob::new(doc.as_ref(), &config);

    match job.parse_manual(&args.ranges, args.policy) {
        Ok(ranges) => {
            println!("\n=== Validation for '{}' ===", name);
            println!("Ranges are valid, {} files would be written:", ranges.len());
            for named in job.name_outputs(&ranges) {
                println!("  {} <- {}", named.filename, named.range);
            }
            Ok(())
        }
        Err(e) => {
            println!("\n=== Validation for '{}' ===", name);
            println!("Invalid ranges: {}", e);
            Err(e.into())
        }
    }
}
