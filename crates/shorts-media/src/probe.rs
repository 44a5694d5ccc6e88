//! FFprobe duration probing.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Duration of a media file in seconds.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-print_format",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_duration(&output.stdout)
}

/// Parse `format.duration` out of FFprobe JSON.
fn parse_duration(json: &[u8]) -> MediaResult<f64> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;

    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .ok_or_else(|| MediaError::InvalidMedia("No duration reported".to_string()))?;

    if !duration.is_finite() || duration <= 0.0 {
        return Err(MediaError::InvalidMedia(format!(
            "Non-positive duration: {duration}"
        )));
    }

    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        let json = br#"{"format": {"duration": "12.345000"}}"#;
        assert!((parse_duration(json).unwrap() - 12.345).abs() < 1e-9);
    }

    #[test]
    fn test_missing_duration() {
        let json = br#"{"format": {}}"#;
        assert!(matches!(parse_duration(json), Err(MediaError::InvalidMedia(_))));

        let json = br#"{"format": {"duration": "N/A"}}"#;
        assert!(matches!(parse_duration(json), Err(MediaError::InvalidMedia(_))));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let json = br#"{"format": {"duration": "0.000000"}}"#;
        assert!(parse_duration(json).is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(parse_duration(b"not json"), Err(MediaError::JsonParse(_))));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = probe_duration("/nonexistent/audio.mp3").await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
