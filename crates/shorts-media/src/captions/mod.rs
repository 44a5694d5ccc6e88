//! Caption layout engine.
//!
//! Turns free-form caption text and an audio duration into positioned,
//! time-gated drawtext instructions and one filter-graph expression:
//!
//! wrap -> allocate intervals -> stack vertically -> serialize.
//!
//! Everything here is pure and deterministic; invalid input is reported as
//! [`CaptionError`] and never produces a chain.

mod chain;
mod fade;
mod sanitize;
mod stack;
mod timing;
mod wrap;

use shorts_models::{CaptionLayout, CaptionLine, CaptionStyle};
use tracing::debug;

use crate::error::{CaptionError, CaptionResult};

pub use chain::{build_drawtext, build_filter_chain, validate_style, VIDEO_OUT_LABEL};
pub use fade::{build_fade_alpha, FadeRamp};
pub use sanitize::sanitize_overlay_text;
pub use stack::compute_vertical_stack;
pub use timing::allocate_intervals;
pub use wrap::wrap_text;

/// Format seconds for filter expressions (`2.5`, `10`).
pub(crate) fn fmt_secs(value: f64) -> String {
    format!("{}", timing::round2(value))
}

/// Wrap, time and position caption lines.
pub fn layout_captions(
    text: &str,
    total_duration: f64,
    style: &CaptionStyle,
    layout: &CaptionLayout,
) -> CaptionResult<Vec<CaptionLine>> {
    validate_style(style)?;

    let segments = wrap_text(text, style.max_chars_per_line);
    if segments.is_empty() {
        return Err(CaptionError::EmptyText);
    }

    let spans = allocate_intervals(segments.len(), total_duration)?;
    let ys = compute_vertical_stack(
        segments.len(),
        style.line_height(),
        layout.caption_region,
        layout.frame,
    );

    Ok(segments
        .into_iter()
        .zip(spans)
        .zip(ys)
        .map(|((text, span), y)| CaptionLine { text, span, y })
        .collect())
}

/// Build the complete filter graph for a captioned render.
pub fn render_caption_filter(
    text: &str,
    total_duration: f64,
    style: &CaptionStyle,
    layout: &CaptionLayout,
) -> CaptionResult<String> {
    let lines = layout_captions(text, total_duration, style, layout)?;
    debug!(
        lines = lines.len(),
        duration = total_duration,
        template = layout.is_template(),
        "Built caption layout"
    );
    build_filter_chain(&lines, style, layout)
}
