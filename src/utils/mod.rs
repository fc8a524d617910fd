use anyhow::Result;
use std::path::Path;
use url::Url;

/// Host substrings accepted as video sources. Deliberately a substring match
/// rather than a strict URL parse.
pub const RECOGNIZED_DOMAINS: &[&str] = &["youtube.com", "youtu.be"];

/// Check whether a URL belongs to the recognized video-hosting domain set.
pub fn is_recognized_url(url: &str) -> bool {
    RECOGNIZED_DOMAINS.iter().any(|domain| url.contains(domain))
}

/// Derive a filesystem-safe name from an untrusted video title.
///
/// Keeps alphanumeric codepoints plus space, hyphen and underscore, turns
/// spaces into underscores, and truncates to `max_len` characters. The result
/// is deterministic, so identical (or identically truncated) titles collide;
/// the last item to write wins.
pub fn sanitize_filename(title: &str, max_len: usize) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .map(|c| if c == ' ' { '_' } else { c })
        .take(max_len)
        .collect()
}

/// Read a newline-delimited URL list. Surrounding whitespace is trimmed and
/// blank lines are skipped.
pub fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let content = fs_err::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log10() / THRESHOLD.log10()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Check if a file exists and is readable
pub fn check_file_accessible(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("Path is not a file: {}", path.display());
    }

    // Try to read metadata to check permissions
    std::fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("Cannot access file {}: {}", path.display(), e))?;

    Ok(())
}

/// Extract domain from URL for display purposes
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|host| {
            // Remove 'www.' prefix if present
            if host.starts_with("www.") {
                host[4..].to_string()
            } else {
                host.to_string()
            }
        })
}

/// Verify the external media tools are discoverable before any item runs.
/// Both yt-dlp (acquisition) and ffmpeg (transcode/decode) are hard
/// requirements; a missing one aborts the whole run with install guidance.
pub async fn check_required_tools() -> Result<()> {
    for (tool, hint) in [
        ("ffmpeg", ffmpeg_install_hint()),
        ("yt-dlp", yt_dlp_install_hint()),
    ] {
        if !check_command_available(tool).await {
            tracing::error!("{} is not installed or not on PATH!", tool);
            tracing::error!("Installation instructions:\n{}", hint);
            anyhow::bail!("required external tool `{}` not found", tool);
        }
    }

    Ok(())
}

fn ffmpeg_install_hint() -> &'static str {
    match std::env::consts::OS {
        "macos" => "brew install ffmpeg",
        "linux" => "sudo apt-get install ffmpeg",
        "windows" => {
            "1. Download FFmpeg from: https://ffmpeg.org/download.html\n\
             2. Add the FFmpeg directory to your PATH environment variable"
        }
        _ => "Please install FFmpeg for your operating system",
    }
}

fn yt_dlp_install_hint() -> &'static str {
    match std::env::consts::OS {
        "macos" => "brew install yt-dlp",
        "linux" => "pipx install yt-dlp (or: pip install -U yt-dlp)",
        "windows" => {
            "Download yt-dlp.exe from https://github.com/yt-dlp/yt-dlp/releases \
             and add it to your PATH"
        }
        _ => "Please install yt-dlp for your operating system",
    }
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
