//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Result type for caption layout.
pub type CaptionResult<T> = Result<T, CaptionError>;

/// Invalid input to the caption layout engine.
///
/// A chain built from such input must never reach the renderer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptionError {
    #[error("Caption text is empty")]
    EmptyText,

    #[error("Line count must be at least 1")]
    NoLines,

    #[error("Duration must be positive and finite, got {0}")]
    InvalidDuration(f64),

    #[error("Invalid caption style: {0}")]
    InvalidStyle(String),

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),
}

impl CaptionError {
    pub fn invalid_style(msg: impl Into<String>) -> Self {
        Self::InvalidStyle(msg.into())
    }

    pub fn invalid_layout(msg: impl Into<String>) -> Self {
        Self::InvalidLayout(msg.into())
    }
}

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Rendered output too small ({size} bytes): {path}")]
    OutputTooSmall { path: PathBuf, size: u64 },

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("Invalid asset URL: {0}")]
    InvalidUrl(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid media file: {0}")]
    InvalidMedia(String),

    #[error(transparent)]
    Caption(#[from] CaptionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    /// Whether the renderer itself failed (as opposed to bad input).
    pub fn is_render_failure(&self) -> bool {
        matches!(
            self,
            MediaError::FfmpegFailed { .. } | MediaError::OutputTooSmall { .. }
        )
    }
}
