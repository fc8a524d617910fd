use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::extractors::MediaSource;
use crate::{utils, ItemError};

pub mod engine;

pub use engine::WhisperEngine;

/// One successfully processed video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResult {
    /// Source URL
    pub url: String,

    /// Video title as resolved from the remote service
    pub title: String,

    /// Duration in seconds, if the service reported one
    pub duration: Option<f64>,

    /// The transcribed text
    pub transcript: String,

    /// Sanitized base name used for the output files
    pub filename: String,

    /// Path to the persisted transcript
    pub text_path: PathBuf,

    /// Timestamp captured when the item finished processing
    pub processed_at: DateTime<Utc>,
}

/// Ordered results for all items that succeeded, in input order. Failed items
/// are logged but never appear here, so the report can only be as long as the
/// input list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub items: Vec<ItemResult>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Contract over the speech-to-text model. Loading the model is expensive, so
/// one implementation is constructed per run and reused read-only across all
/// items.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe the audio file at `audio_path` to plain text.
    async fn transcribe(&self, audio_path: &Path) -> Result<String, ItemError>;
}

/// Main transcription pipeline: drives each URL through metadata resolution,
/// audio download, transcription, persistence and cleanup, and aggregates the
/// per-item outcomes for a whole batch.
pub struct TranscriptionPipeline {
    config: Config,
    source: Box<dyn MediaSource>,
    engine: Box<dyn SpeechToText>,
}

impl TranscriptionPipeline {
    /// Create a new pipeline, ensuring the output directory exists.
    pub fn new(
        config: Config,
        source: Box<dyn MediaSource>,
        engine: Box<dyn SpeechToText>,
    ) -> crate::Result<Self> {
        fs_err::create_dir_all(&config.app.output_dir)?;

        Ok(Self {
            config,
            source,
            engine,
        })
    }

    /// Process a single URL end to end.
    ///
    /// Whatever happens after the download step, the audio artifact is removed
    /// before this returns; the `.txt` file is only written once transcription
    /// has succeeded, so a failed item leaves nothing behind.
    pub async fn process_item(&self, url: &str) -> Result<ItemResult, ItemError> {
        if !utils::is_recognized_url(url) {
            return Err(ItemError::InvalidUrl(url.to_string()));
        }

        let metadata = self.source.resolve_metadata(url).await?;

        let filename =
            utils::sanitize_filename(&metadata.title, self.config.app.max_filename_length);
        if filename.is_empty() {
            return Err(ItemError::EmptyFilename(metadata.title));
        }

        match metadata.duration {
            Some(secs) => tracing::info!(
                "Resolved {:?} ({})",
                metadata.title,
                utils::format_duration(secs)
            ),
            None => tracing::info!("Resolved {:?} (duration unknown)", metadata.title),
        }

        let base_path = self.config.app.output_dir.join(&filename);
        let expected_audio = base_path.with_extension(&self.config.app.audio_format);

        let audio_path = match self
            .source
            .download_audio(
                url,
                &base_path,
                &self.config.app.audio_format,
                &self.config.app.audio_quality,
            )
            .await
        {
            Ok(path) => path,
            Err(err) => {
                // The tool makes no promise about partial files on failure.
                remove_artifact(&expected_audio);
                return Err(err);
            }
        };

        if !audio_path.exists() {
            return Err(ItemError::AudioArtifactMissing(audio_path));
        }

        tracing::info!("Transcribing {}", audio_path.display());

        // Capture the outcome first so the artifact is removed on both paths.
        let transcript = self.engine.transcribe(&audio_path).await;
        remove_artifact(&audio_path);
        let transcript = transcript?;

        let text_path = base_path.with_extension("txt");
        fs_err::write(&text_path, &transcript)?;
        tracing::info!("Transcript saved to: {}", text_path.display());

        Ok(ItemResult {
            url: url.to_string(),
            title: metadata.title,
            duration: metadata.duration,
            transcript,
            filename,
            text_path,
            processed_at: Utc::now(),
        })
    }

    /// Process a batch of URLs strictly in order. A failed item is logged and
    /// skipped; the batch always runs to the end and returns whatever
    /// succeeded, even if that is nothing.
    pub async fn process_batch(&self, urls: &[String]) -> BatchReport {
        let total = urls.len();
        let progress = ProgressBar::new(total as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap(),
        );

        let mut report = BatchReport::default();

        for (index, url) in urls.iter().enumerate() {
            progress.set_message(
                utils::extract_domain(url).unwrap_or_else(|| url.clone()),
            );

            match self.process_item(url).await {
                Ok(item) => {
                    tracing::info!("[{}/{}] Transcribed {:?}", index + 1, total, item.title);
                    report.items.push(item);
                }
                Err(err) => {
                    tracing::error!(
                        "[{}/{}] {} failed ({}): {}",
                        index + 1,
                        total,
                        url,
                        err.kind(),
                        err
                    );
                }
            }

            progress.inc(1);
        }

        progress.finish_and_clear();
        report
    }
}

/// Best-effort removal of a transient audio file.
fn remove_artifact(path: &Path) {
    if path.exists() {
        if let Err(err) = fs_err::remove_file(path) {
            tracing::warn!("Could not remove audio artifact {}: {}", path.display(), err);
        }
    }
}
