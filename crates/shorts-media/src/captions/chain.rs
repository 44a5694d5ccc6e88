//! Filter-graph serialization for captioned renders.
//!
//! Input layout expected by the render step:
//! - single-image mode: `[0:v]` background image
//! - template mode: `[0:v]` template frame, `[1:v]` background image
//!
//! The chain always ends in the `[v]` label.

use shorts_models::{CaptionLayout, CaptionLine, CaptionStyle};

use super::fade::FadeRamp;
use super::fmt_secs;
use super::sanitize::{escape_filter_value, sanitize_overlay_text};
use crate::error::{CaptionError, CaptionResult};

/// Output label of the composed video stream.
pub const VIDEO_OUT_LABEL: &str = "v";

/// Reject styles that would produce a broken or injectable drawtext.
pub fn validate_style(style: &CaptionStyle) -> CaptionResult<()> {
    let has_font_file = style
        .font_file
        .as_deref()
        .is_some_and(|f| !f.trim().is_empty());
    if !has_font_file && style.font_family.trim().is_empty() {
        return Err(CaptionError::invalid_style("font_family or font_file is required"));
    }
    if style.font_size == 0 {
        return Err(CaptionError::invalid_style("font_size must be positive"));
    }
    if style.max_chars_per_line == 0 {
        return Err(CaptionError::invalid_style("max_chars_per_line must be positive"));
    }
    if !style.fade_secs.is_finite() || style.fade_secs < 0.0 {
        return Err(CaptionError::invalid_style("fade_secs must be a non-negative number"));
    }
    for (name, value) in [
        ("font_color", &style.font_color),
        ("box_color", &style.box_color),
        ("border_color", &style.border_color),
    ] {
        if !is_valid_color(value) {
            return Err(CaptionError::invalid_style(format!(
                "{name} is missing or malformed: {value:?}"
            )));
        }
    }
    Ok(())
}

/// Colour names, `#RRGGBB[AA]`, `0xRRGGBB[AA]` and `name@alpha`.
fn is_valid_color(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '#' | '@' | '.'))
}

/// One drawtext instruction for a positioned, time-gated line.
///
/// Text expansion is disabled so `%` sequences render literally.
pub fn build_drawtext(line: &CaptionLine, style: &CaptionStyle) -> String {
    let font = match style.font_file.as_deref().filter(|f| !f.trim().is_empty()) {
        Some(file) => format!("fontfile={}", escape_filter_value(file)),
        None => format!("font={}", escape_filter_value(&style.font_family)),
    };
    let alpha = FadeRamp::new(line.span.start, line.span.end, style.fade_secs).to_expr();

    format!(
        "drawtext={font}:text={text}:fontcolor={fc}:fontsize={fs}:\
         borderw={bw}:bordercolor={bc}:box=1:boxcolor={boxc}:boxborderw={bbw}:\
         x=(w-text_w)/2:y={y}:alpha='{alpha}':enable='between(t,{start},{end})':\
         expansion=none",
        text = sanitize_overlay_text(&line.text),
        fc = style.font_color,
        fs = style.font_size,
        bw = style.border_width,
        bc = style.border_color,
        boxc = style.box_color,
        bbw = style.box_border_width,
        y = line.y,
        start = fmt_secs(line.span.start),
        end = fmt_secs(line.span.end),
    )
}

/// Serialize the background prefix and every caption line into one graph.
pub fn build_filter_chain(
    lines: &[CaptionLine],
    style: &CaptionStyle,
    layout: &CaptionLayout,
) -> CaptionResult<String> {
    if lines.is_empty() {
        return Err(CaptionError::NoLines);
    }
    validate_style(style)?;

    let frame = layout.frame;
    if frame.width == 0 || frame.height == 0 {
        return Err(CaptionError::invalid_layout("frame size must be positive"));
    }

    let mut chain = match layout.background_area {
        Some(area) => {
            if !area.is_valid() {
                return Err(CaptionError::invalid_layout("background area has no size"));
            }
            format!(
                "[1:v]scale={}:{}[scaled];[0:v]scale={}:{}[frame];[frame][scaled]overlay={}:{}",
                area.width, area.height, frame.width, frame.height, area.x, area.y
            )
        }
        None => format!(
            "[0:v]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
            w = frame.width,
            h = frame.height
        ),
    };

    for line in lines {
        chain.push(',');
        chain.push_str(&build_drawtext(line, style));
    }

    chain.push_str(",format=yuv420p[");
    chain.push_str(VIDEO_OUT_LABEL);
    chain.push(']');

    Ok(chain)
}
