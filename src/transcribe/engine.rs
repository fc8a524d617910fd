use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::SpeechToText;
use crate::config::Config;
use crate::{utils, ItemError};

/// Whisper sample rate expected by the model.
const SAMPLE_RATE: u32 = 16_000;

/// Locally loaded Whisper model. Construction is expensive (the ggml file is
/// fetched on first use and mapped into memory), so one engine is built per
/// run and shared read-only across all items.
pub struct WhisperEngine {
    ctx: WhisperContext,
    language: Option<String>,
}

impl WhisperEngine {
    /// Load the configured model, downloading it first if absent.
    pub async fn load(config: &Config) -> Result<Self> {
        let model_path = config.model_path()?;
        ensure_model(&model_path, &config.model_url()).await?;
        utils::check_file_accessible(&model_path)?;

        tracing::info!("Loading Whisper model from {}", model_path.display());
        let ctx = WhisperContext::new_with_params(
            model_path.to_str().context("Invalid model path")?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| anyhow::anyhow!("Failed to load Whisper model: {}", e))?;

        Ok(Self {
            ctx,
            language: config.whisper.language.clone(),
        })
    }

    fn run_model(&self, samples: &[f32]) -> Result<String, ItemError> {
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(self.language.as_deref().unwrap_or("auto")));
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_special(false);
        params.set_print_timestamps(false);
        params.set_suppress_blank(true);

        let mut state = self.ctx.create_state().map_err(|e| {
            ItemError::TranscriptionFailed(format!("failed to create decoder state: {}", e))
        })?;

        state
            .full(params, samples)
            .map_err(|e| ItemError::TranscriptionFailed(e.to_string()))?;

        let num_segments = state.full_n_segments();
        let mut text = String::new();

        for i in 0..num_segments {
            let segment = state.get_segment(i).ok_or_else(|| {
                ItemError::TranscriptionFailed(format!("segment {} out of bounds", i))
            })?;

            let piece = segment.to_str_lossy().map_err(|e| {
                ItemError::TranscriptionFailed(format!("failed to read segment {}: {}", i, e))
            })?;

            text.push_str(&piece);
        }

        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl SpeechToText for WhisperEngine {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, ItemError> {
        let scratch = tempfile::tempdir()?;
        let wav_path = scratch.path().join("decoded.wav");

        decode_to_wav(audio_path, &wav_path).await?;

        let samples = read_wav_samples(&wav_path)?;
        tracing::debug!(
            "Decoded {:.1}s of audio ({} samples)",
            samples.len() as f64 / SAMPLE_RATE as f64,
            samples.len()
        );

        self.run_model(&samples)
    }
}

/// Download the ggml model into place if it is not there yet.
async fn ensure_model(model_path: &Path, url: &str) -> Result<()> {
    if model_path.exists() && fs_err::metadata(model_path)?.len() > 0 {
        tracing::debug!("Model already present at {}", model_path.display());
        return Ok(());
    }

    if let Some(parent) = model_path.parent() {
        fs_err::create_dir_all(parent)?;
    }

    tracing::info!("Downloading Whisper model from {}", url);
    tracing::info!("This may take a while for large models...");

    let response = reqwest::get(url)
        .await
        .with_context(|| format!("Failed to download model from {}", url))?;

    anyhow::ensure!(
        response.status().is_success(),
        "Failed to download model: HTTP {}",
        response.status()
    );

    let bytes = response
        .bytes()
        .await
        .context("Failed to read model response body")?;

    // Write to a sibling temp file and rename so a torn download never looks
    // like a valid model.
    let tmp_path = model_path.with_extension("bin.tmp");
    fs_err::write(&tmp_path, &bytes)?;
    fs_err::rename(&tmp_path, model_path)?;

    tracing::info!(
        "Model saved to {} ({})",
        model_path.display(),
        utils::format_file_size(bytes.len() as u64)
    );

    Ok(())
}

/// Decode any audio container to 16 kHz mono WAV via ffmpeg.
async fn decode_to_wav(audio_path: &Path, wav_path: &Path) -> Result<(), ItemError> {
    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(audio_path)
        .args(["-ar", "16000", "-ac", "1", "-f", "wav"])
        .arg(wav_path)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| ItemError::TranscriptionFailed(format!("ffmpeg: {}", e)))?;

    if !output.status.success() {
        let error = String::from_utf8_lossy(&output.stderr);
        return Err(ItemError::TranscriptionFailed(format!(
            "ffmpeg decode failed: {}",
            error.trim()
        )));
    }

    Ok(())
}

fn read_wav_samples(path: &Path) -> Result<Vec<f32>, ItemError> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| ItemError::TranscriptionFailed(format!("unreadable WAV: {}", e)))?;

    let spec = reader.spec();
    tracing::debug!(
        "WAV: {}Hz, {} channels, {} bits, {:?}",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| ItemError::TranscriptionFailed(format!("bad float samples: {}", e)))?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .collect::<Result<Vec<i32>, _>>()
                .map_err(|e| ItemError::TranscriptionFailed(format!("bad int samples: {}", e)))?
                .into_iter()
                .map(|s| s as f32 / max_val)
                .collect()
        }
    };

    // If stereo, downmix to mono
    if spec.channels == 2 {
        let mono: Vec<f32> = samples
            .chunks(2)
            .map(|pair| {
                if pair.len() == 2 {
                    (pair[0] + pair[1]) / 2.0
                } else {
                    pair[0]
                }
            })
            .collect();
        Ok(mono)
    } else {
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_read_wav_samples_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, &[0, i16::MAX, i16::MIN]);

        let samples = read_wav_samples(&path).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - 1.0).abs() < 1e-3);
        assert!((samples[2] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_read_wav_samples_downmixes_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, &[1000, 3000, -2000, 2000]);

        let samples = read_wav_samples(&path).unwrap();
        assert_eq!(samples.len(), 2);
        // Each frame averages its two channels.
        assert!((samples[0] - 2000.0 / 32768.0).abs() < 1e-4);
        assert!(samples[1].abs() < 1e-4);
    }

    #[test]
    fn test_read_wav_samples_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-wav.wav");
        std::fs::write(&path, b"definitely not RIFF").unwrap();

        let err = read_wav_samples(&path).unwrap_err();
        assert!(matches!(err, ItemError::TranscriptionFailed(_)));
    }
}
