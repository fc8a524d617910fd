use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Whisper model sizes, smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::Large => "large",
        }
    }
}

impl std::fmt::Display for ModelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,

    /// Whisper model settings
    pub whisper: WhisperConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory for transcripts and transient audio files
    pub output_dir: PathBuf,

    /// Audio container format requested from yt-dlp
    pub audio_format: String,

    /// Audio bitrate requested from yt-dlp (kbit/s)
    pub audio_quality: String,

    /// Maximum length of sanitized filenames, in characters
    pub max_filename_length: usize,

    /// Default aggregate report format (text, csv, json or all)
    pub default_report_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperConfig {
    /// Model size to load
    pub model: ModelSize,

    /// Directory holding ggml model files (defaults to the user data dir)
    pub model_dir: Option<PathBuf>,

    /// Transcription language (auto-detect if not set)
    pub language: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig {
                output_dir: PathBuf::from("downloads"),
                audio_format: "mp3".to_string(),
                audio_quality: "192".to_string(),
                max_filename_length: 100,
                default_report_format: "text".to_string(),
            },
            whisper: WhisperConfig {
                model: ModelSize::Base,
                model_dir: None,
                language: None,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("tube-scribe").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.app.max_filename_length == 0 {
            anyhow::bail!("max_filename_length must be at least 1");
        }

        self.app
            .audio_quality
            .parse::<u32>()
            .context("audio_quality must be a numeric bitrate, e.g. \"192\"")?;

        self.report_format()?;

        Ok(())
    }

    /// Parse the configured default report format.
    pub fn report_format(&self) -> Result<crate::cli::ReportFormat> {
        <crate::cli::ReportFormat as ValueEnum>::from_str(&self.app.default_report_format, true)
            .map_err(|_| {
                anyhow::anyhow!(
                    "default_report_format must be one of text, csv, json, all (got {:?})",
                    self.app.default_report_format
                )
            })
    }

    /// Path to the ggml model file for the configured size.
    pub fn model_path(&self) -> Result<PathBuf> {
        let models_dir = match &self.whisper.model_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .context("Could not determine data directory")?
                .join("tube-scribe")
                .join("models"),
        };

        Ok(models_dir.join(format!("ggml-{}.bin", self.whisper.model)))
    }

    /// Upstream URL for the configured ggml model.
    pub fn model_url(&self) -> String {
        format!(
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-{}.bin",
            self.whisper.model
        )
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Output Directory: {}", self.app.output_dir.display());
        println!("  Audio Format: {}", self.app.audio_format);
        println!("  Audio Quality: {} kbit/s", self.app.audio_quality);
        println!("  Max Filename Length: {}", self.app.max_filename_length);
        println!("  Default Report Format: {}", self.app.default_report_format);
        println!("  Whisper Model: {}", self.whisper.model);
        if let Some(dir) = &self.whisper.model_dir {
            println!("  Model Directory: {}", dir.display());
        }
        if let Some(lang) = &self.whisper.language {
            println!("  Language: {}", lang);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.app.output_dir, PathBuf::from("downloads"));
        assert_eq!(config.app.audio_format, "mp3");
        assert_eq!(config.app.audio_quality, "192");
        assert_eq!(config.app.max_filename_length, 100);
        assert_eq!(config.whisper.model, ModelSize::Base);
        assert!(config.whisper.language.is_none());
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.app.audio_format, config.app.audio_format);
        assert_eq!(parsed.whisper.model, config.whisper.model);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.app.max_filename_length = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.app.audio_quality = "best".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.app.default_report_format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_report_format_parses() {
        let config = Config::default();
        assert_eq!(
            config.report_format().unwrap(),
            crate::cli::ReportFormat::Text
        );
    }

    #[test]
    fn test_model_path_uses_model_dir() {
        let mut config = Config::default();
        config.whisper.model_dir = Some(PathBuf::from("/tmp/models"));
        config.whisper.model = ModelSize::Small;
        assert_eq!(
            config.model_path().unwrap(),
            PathBuf::from("/tmp/models/ggml-small.bin")
        );
    }
}
