//! Caption layout engine and FFmpeg CLI wrapper.
//!
//! This crate provides:
//! - Word wrapping, interval allocation and fade ramps for burned-in captions
//! - Filter-graph serialization with drawtext escaping
//! - Type-safe FFmpeg command building with a hard timeout
//! - FFprobe duration probing
//! - Input asset download

pub mod captions;
pub mod command;
pub mod error;
pub mod fetch;
pub mod probe;
pub mod render;

pub use captions::{
    allocate_intervals, build_fade_alpha, build_filter_chain, compute_vertical_stack,
    layout_captions, render_caption_filter, sanitize_overlay_text, wrap_text, FadeRamp,
};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{CaptionError, CaptionResult, MediaError, MediaResult};
pub use fetch::{download_asset, normalize_asset_url};
pub use probe::probe_duration;
pub use render::{render_short, RenderInputs, RenderOptions};
