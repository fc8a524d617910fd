//! Tube Scribe - a Rust CLI tool for batch-transcribing video URLs
//!
//! This library downloads the audio track of each video with yt-dlp, runs it
//! through a locally loaded Whisper model, and persists the transcripts as
//! per-item text files plus optional aggregated CSV/JSON reports.

pub mod cli;
pub mod config;
pub mod extractors;
pub mod output;
pub mod transcribe;
pub mod utils;

pub use cli::{Cli, Commands, ReportFormat};
pub use config::{Config, ModelSize};
pub use extractors::{MediaSource, VideoMetadata};
pub use transcribe::{BatchReport, ItemResult, SpeechToText, TranscriptionPipeline, WhisperEngine};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Failures scoped to a single batch item. Each one is caught at the
/// single-item boundary, logged with the offending URL, and never aborts the
/// rest of the batch.
#[derive(thiserror::Error, Debug)]
pub enum ItemError {
    #[error("URL is not from a recognized video host: {0}")]
    InvalidUrl(String),

    #[error("could not resolve video metadata: {0}")]
    MetadataUnavailable(String),

    #[error("title {0:?} sanitized down to an empty filename")]
    EmptyFilename(String),

    #[error("audio download failed: {0}")]
    DownloadFailed(String),

    #[error("expected audio file missing at {}", .0.display())]
    AudioArtifactMissing(std::path::PathBuf),

    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("file operation failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ItemError {
    /// Short stable tag for log lines and failure records.
    pub fn kind(&self) -> &'static str {
        match self {
            ItemError::InvalidUrl(_) => "invalid-url",
            ItemError::MetadataUnavailable(_) => "metadata-unavailable",
            ItemError::EmptyFilename(_) => "empty-filename",
            ItemError::DownloadFailed(_) => "download-failed",
            ItemError::AudioArtifactMissing(_) => "audio-missing",
            ItemError::TranscriptionFailed(_) => "transcription-failed",
            ItemError::Io(_) => "io",
        }
    }
}
