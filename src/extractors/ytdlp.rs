use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{MediaSource, VideoMetadata};
use crate::ItemError;

/// Media acquisition via the yt-dlp binary.
pub struct YtDlpSource {
    yt_dlp_path: String,
}

impl YtDlpSource {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }
}

impl Default for YtDlpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaSource for YtDlpSource {
    async fn resolve_metadata(&self, url: &str) -> Result<VideoMetadata, ItemError> {
        tracing::debug!("Resolving metadata for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", "--no-warnings", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ItemError::MetadataUnavailable(e.to_string()))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(ItemError::MetadataUnavailable(error.trim().to_string()));
        }

        let info: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| ItemError::MetadataUnavailable(format!("unparseable yt-dlp output: {}", e)))?;

        let title = info["title"]
            .as_str()
            .ok_or_else(|| {
                ItemError::MetadataUnavailable("yt-dlp output carries no title".to_string())
            })?
            .to_string();

        Ok(VideoMetadata {
            title,
            duration: info["duration"].as_f64(),
            url: url.to_string(),
        })
    }

    async fn download_audio(
        &self,
        url: &str,
        base_path: &Path,
        format: &str,
        quality: &str,
    ) -> Result<PathBuf, ItemError> {
        tracing::debug!("Downloading audio for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--extract-audio",
                "--audio-format",
                format,
                "--audio-quality",
                quality,
                "--output",
            ])
            .arg(base_path.as_os_str())
            .args(["--no-playlist", "--no-warnings", "--quiet", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ItemError::DownloadFailed(e.to_string()))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(ItemError::DownloadFailed(error.trim().to_string()));
        }

        // yt-dlp appends the container extension to the requested base path.
        // Sanitized names contain no dots, so with_extension is a plain append.
        Ok(base_path.with_extension(format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_download_path_carries_format_extension() {
        // Drive the adapter against a command that exits successfully so the
        // path contract can be checked without a network fetch.
        let source = YtDlpSource {
            yt_dlp_path: "true".to_string(),
        };

        let path = source
            .download_audio(
                "https://youtu.be/abc123",
                Path::new("/tmp/out/My_Talk_Part_1"),
                "mp3",
                "192",
            )
            .await
            .unwrap();

        assert_eq!(path, PathBuf::from("/tmp/out/My_Talk_Part_1.mp3"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_metadata_unavailable() {
        let source = YtDlpSource {
            yt_dlp_path: "definitely-not-a-real-binary".to_string(),
        };

        let err = source
            .resolve_metadata("https://youtu.be/abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, ItemError::MetadataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_failing_download_reports_stderr() {
        let source = YtDlpSource {
            yt_dlp_path: "false".to_string(),
        };

        let err = source
            .download_audio(
                "https://youtu.be/abc123",
                Path::new("/tmp/out/name"),
                "mp3",
                "192",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ItemError::DownloadFailed(_)));
    }
}
