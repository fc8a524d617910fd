use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::ModelSize;

#[derive(Parser)]
#[command(
    name = "tubescribe",
    about = "Tube Scribe - Batch-transcribe video URLs using yt-dlp and Whisper",
    version,
    long_about = "A CLI tool that downloads the audio track of each given video URL with \
yt-dlp, transcribes it with a locally loaded Whisper model, and saves the results as \
per-video text files plus optional aggregated CSV/JSON reports."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Reduce logging to warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcribe one or more video URLs
    Transcribe {
        /// Video URLs to transcribe, processed in the given order
        #[arg(value_name = "URL")]
        urls: Vec<String>,

        /// Newline-delimited file of URLs (blank lines skipped, whitespace trimmed)
        #[arg(short, long, value_name = "FILE")]
        batch_file: Option<PathBuf>,

        /// Output directory for transcripts and reports
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Whisper model size to use
        #[arg(short, long, value_enum)]
        model: Option<ModelSize>,

        /// Aggregate report format (per-item .txt files are always written;
        /// defaults to the configured format)
        #[arg(short, long, value_enum)]
        report: Option<ReportFormat>,
    },

    /// Show or write the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported platforms
    Platforms,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    /// Per-item text files only
    Text,
    /// Aggregated CSV table
    Csv,
    /// Aggregated JSON document
    Json,
    /// Both CSV and JSON aggregates
    All,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Csv => write!(f, "csv"),
            ReportFormat::Json => write!(f, "json"),
            ReportFormat::All => write!(f, "all"),
        }
    }
}
