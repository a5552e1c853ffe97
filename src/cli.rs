use clap::{Args, Parser, Subcommand};
use pdf_chapter_splitter::{DetectionStrategy, GapPolicy};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdf-split")]
#[command(about = "A CLI tool for splitting PDF documents into chapter files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output directory for split files
    #[arg(short, long, global = true, default_value = "./output")]
    pub output: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split PDFs into one file per chapter
    Split(SplitArgs),

    /// Show page counts and detected chapters without splitting
    Analyze(AnalyzeArgs),

    /// Check a manual range specification against a document
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct DetectionArgs {
    /// JSON file with detection settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum outline depth to flatten
    #[arg(long, value_name = "LEVELS")]
    pub depth: Option<usize>,

    /// Only use the deepest outline entries within the depth limit
    #[arg(long)]
    pub leaf_only: bool,
}

#[derive(Args)]
pub struct SplitArgs {
    /// Input sources (file paths, directories or URLs)
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Where chapter boundaries come from
    #[arg(short, long, value_enum, default_value_t = DetectionStrategy::Auto)]
    pub mode: DetectionStrategy,

    /// Number of parts for equal mode
    #[arg(short, long, default_value = "2")]
    pub parts: usize,

    /// Ranges for manual mode, e.g. "1-10:Intro, 11-40"
    #[arg(short, long, value_name = "SPEC")]
    pub ranges: Option<String>,

    /// How uncovered pages are handled
    #[arg(long, value_enum)]
    pub policy: Option<GapPolicy>,

    /// Gemini API key for ai mode (defaults to GEMINI_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Skip the JSON manifest
    #[arg(long)]
    pub no_manifest: bool,

    /// Print the plan without writing files
    #[arg(long)]
    pub dry_run: bool,

    /// Force overwrite existing output files
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input sources (file paths, directories or URLs)
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<String>,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Output analysis to JSON file
    #[arg(long, value_name = "FILE")]
    pub json_output: Option<PathBuf>,

    /// Show every detected range
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Document the ranges refer to
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Range specification, e.g. "1-10:Intro, 11-40"
    #[arg(short, long, value_name = "SPEC")]
    pub ranges: String,

    /// How uncovered pages are handled
    #[arg(long, value_enum, default_value_t = GapPolicy::RejectGaps)]
    pub policy: GapPolicy,
}
