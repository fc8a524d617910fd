use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod ytdlp;

pub use ytdlp::YtDlpSource;

use crate::ItemError;

/// Metadata about a video, resolved without downloading any media.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Video title as reported by the remote service
    pub title: String,

    /// Duration in seconds, if known
    pub duration: Option<f64>,

    /// Original URL that was resolved
    pub url: String,
}

/// Contract over the external media download service. The pipeline owns one
/// implementation for the lifetime of a batch run and drives every item
/// through it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Resolve title and duration for a URL. Metadata-only, no media fetch.
    async fn resolve_metadata(&self, url: &str) -> Result<VideoMetadata, ItemError>;

    /// Fetch the audio-only stream and transcode it to the requested format
    /// and bitrate. `base_path` carries no extension; the external tool
    /// appends one, and the returned path is where the file actually landed.
    /// Callers must not assume the returned path equals the path they asked
    /// for, and must verify it exists.
    async fn download_audio(
        &self,
        url: &str,
        base_path: &Path,
        format: &str,
        quality: &str,
    ) -> Result<PathBuf, ItemError>;
}
