//! Captioned short rendering.

use std::path::{Path, PathBuf};
use std::time::Instant;
use metrics::{counter, histogram};
use tracing::{info, warn};

use crate::captions::VIDEO_OUT_LABEL;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Metric name constants.
pub mod names {
    /// Renders by outcome.
    pub const RENDERS_TOTAL: &str = "shorts_renders_total";
    /// Render wall time in seconds.
    pub const RENDER_DURATION_SECONDS: &str = "shorts_render_duration_seconds";
}

/// Files consumed and produced by one render.
#[derive(Debug, Clone)]
pub struct RenderInputs {
    /// Background image
    pub background: PathBuf,
    /// Narration audio
    pub audio: PathBuf,
    /// Template frame image; switches the filter graph to template mode
    pub frame: Option<PathBuf>,
    /// Output video path
    pub output: PathBuf,
}

impl RenderInputs {
    /// Build the FFmpeg command for `filter` over `duration` seconds.
    ///
    /// Input order matches the caption filter graph: the template frame (if
    /// any) first, then the background, then audio.
    pub fn to_command(&self, filter: &str, duration: f64, options: &RenderOptions) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(&self.output);
        if let Some(frame) = &self.frame {
            cmd = cmd.looped_image(frame);
        }
        cmd = cmd.looped_image(&self.background);
        let audio_index = cmd.input_count();

        cmd.input(&self.audio)
            .filter_complex(filter)
            .map(format!("[{VIDEO_OUT_LABEL}]"))
            .map(format!("{audio_index}:a"))
            .video_codec("libx264")
            .preset(options.preset.clone())
            .audio_codec("aac")
            .audio_bitrate(options.audio_bitrate.clone())
            .duration(duration)
            .shortest()
            .output_args(["-movflags", "+faststart"])
    }
}

/// Encoder settings and guards for a render.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Hard wall-clock limit for FFmpeg
    pub timeout_secs: u64,
    /// x264 preset
    pub preset: String,
    /// AAC bitrate
    pub audio_bitrate: String,
    /// Outputs smaller than this are treated as failed renders
    pub min_output_bytes: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 180,
            preset: "ultrafast".to_string(),
            audio_bitrate: "192k".to_string(),
            min_output_bytes: 1000,
        }
    }
}

/// Render a captioned short and return the output size in bytes.
pub async fn render_short(
    inputs: &RenderInputs,
    filter: &str,
    duration: f64,
    options: &RenderOptions,
) -> MediaResult<u64> {
    let started = Instant::now();
    let cmd = inputs.to_command(filter, duration, options);

    let result = async {
        FfmpegRunner::new()
            .with_timeout(options.timeout_secs)
            .run(&cmd)
            .await?;
        verify_output(&inputs.output, options.min_output_bytes).await
    }
    .await;

    let outcome = match &result {
        Ok(_) => "success",
        Err(MediaError::Timeout(_)) => "timeout",
        Err(_) => "failure",
    };
    counter!(names::RENDERS_TOTAL, "outcome" => outcome).increment(1);
    histogram!(names::RENDER_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

    match &result {
        Ok(size) => info!(
            output = ?inputs.output,
            bytes = size,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rendered short"
        ),
        Err(e) => warn!(output = ?inputs.output, error = %e, "Render failed"),
    }

    result
}

async fn verify_output(path: &Path, min_bytes: u64) -> MediaResult<u64> {
    let size = match tokio::fs::metadata(path).await {
        Ok(meta) => meta.len(),
        Err(_) => 0,
    };
    if size < min_bytes {
        return Err(MediaError::OutputTooSmall {
            path: path.to_path_buf(),
            size,
        });
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(frame: Option<&str>) -> RenderInputs {
        RenderInputs {
            background: PathBuf::from("bg.jpg"),
            audio: PathBuf::from("audio.mp3"),
            frame: frame.map(PathBuf::from),
            output: PathBuf::from("out.mp4"),
        }
    }

    #[test]
    fn test_single_image_command_maps_audio_from_input_1() {
        let args = inputs(None)
            .to_command("[0:v]null[v]", 10.0, &RenderOptions::default())
            .build_args();
        assert!(args.windows(2).any(|w| w == ["-map", "[v]"]));
        assert!(args.windows(2).any(|w| w == ["-map", "1:a"]));
        assert!(args.windows(2).any(|w| w == ["-preset", "ultrafast"]));
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn test_template_command_puts_frame_first() {
        let args = inputs(Some("frame.png"))
            .to_command("f", 5.0, &RenderOptions::default())
            .build_args();
        let first_input = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[first_input + 1], "frame.png");
        assert!(args.windows(2).any(|w| w == ["-map", "2:a"]));
    }

    #[tokio::test]
    async fn test_small_output_is_render_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.mp4");
        std::fs::write(&path, b"tiny").unwrap();

        let err = verify_output(&path, 1000).await.unwrap_err();
        assert!(err.is_render_failure());
        assert!(matches!(err, MediaError::OutputTooSmall { size: 4, .. }));

        let missing = verify_output(&dir.path().join("none.mp4"), 1000).await;
        assert!(matches!(missing, Err(MediaError::OutputTooSmall { size: 0, .. })));
    }

    #[tokio::test]
    async fn test_large_enough_output_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.mp4");
        std::fs::write(&path, vec![0u8; 1500]).unwrap();
        assert_eq!(verify_output(&path, 1000).await.unwrap(), 1500);
    }
}
