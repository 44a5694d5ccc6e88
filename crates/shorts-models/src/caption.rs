//! Caption styling and layout models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::rect::{FrameSize, OverlayRegion};

/// Default wrap width for caption lines, in characters.
pub const DEFAULT_MAX_CHARS_PER_LINE: usize = 14;

/// Default fade-in/fade-out length per caption line, in seconds.
pub const DEFAULT_FADE_SECS: f64 = 0.5;

/// Visual style applied to every caption line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaptionStyle {
    /// Font family resolved through fontconfig (used when no font file is set)
    pub font_family: String,
    /// Explicit font file, takes precedence over `font_family`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_file: Option<String>,
    /// Font size in pixels
    pub font_size: u32,
    /// Text colour (`white`, `#FFFFFF`, `0xFFFFFF`)
    pub font_color: String,
    /// Background box colour, alpha allowed (`#000000AA`, `black@0.5`)
    pub box_color: String,
    /// Text outline width
    #[serde(default = "default_border_width")]
    pub border_width: u32,
    /// Text outline colour
    #[serde(default = "default_border_color")]
    pub border_color: String,
    /// Padding around the text inside the box
    #[serde(default = "default_box_border_width")]
    pub box_border_width: u32,
    /// Greedy wrap width
    #[serde(default = "default_max_chars")]
    pub max_chars_per_line: usize,
    /// Extra vertical gap between stacked lines
    #[serde(default = "default_line_spacing")]
    pub line_spacing: u32,
    /// Fade length at each end of a line's interval
    #[serde(default = "default_fade_secs")]
    pub fade_secs: f64,
}

fn default_border_width() -> u32 {
    4
}

fn default_border_color() -> String {
    "black".to_string()
}

fn default_box_border_width() -> u32 {
    20
}

fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS_PER_LINE
}

fn default_line_spacing() -> u32 {
    8
}

fn default_fade_secs() -> f64 {
    DEFAULT_FADE_SECS
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_family: "Noto Sans KR".to_string(),
            font_file: Some("NotoSansKR-VF.ttf".to_string()),
            font_size: 60,
            font_color: "white".to_string(),
            box_color: "black@0.5".to_string(),
            border_width: default_border_width(),
            border_color: default_border_color(),
            box_border_width: default_box_border_width(),
            max_chars_per_line: DEFAULT_MAX_CHARS_PER_LINE,
            line_spacing: default_line_spacing(),
            fade_secs: DEFAULT_FADE_SECS,
        }
    }
}

impl CaptionStyle {
    /// Vertical distance between the tops of two consecutive lines.
    pub fn line_height(&self) -> u32 {
        self.font_size + self.line_spacing
    }

    pub fn with_font_file(mut self, path: impl Into<String>) -> Self {
        self.font_file = Some(path.into());
        self
    }

    pub fn with_font_size(mut self, size: u32) -> Self {
        self.font_size = size;
        self
    }
}

/// A half-open time interval in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimeSpan {
    pub start: f64,
    pub end: f64,
}

impl TimeSpan {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One wrapped caption line with its display window and vertical position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaptionLine {
    pub text: String,
    pub span: TimeSpan,
    /// Top offset in pixels
    pub y: i32,
}

/// Where captions and the background image go in the output frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct CaptionLayout {
    /// Output frame size
    pub frame: FrameSize,
    /// Region the caption stack is centred in (full frame when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_region: Option<OverlayRegion>,
    /// Template mode: the background image is scaled into this area and
    /// composited over the template frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_area: Option<OverlayRegion>,
}

impl CaptionLayout {
    /// Region used to anchor the caption stack.
    pub fn anchor_region(&self) -> OverlayRegion {
        self.caption_region
            .unwrap_or_else(|| self.frame.full_region())
    }

    /// Whether the render composites onto a template frame.
    pub fn is_template(&self) -> bool {
        self.background_area.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_defaults_fill_missing_fields() {
        let style: CaptionStyle = serde_json::from_str(
            r##"{"font_family": "Noto Sans KR", "font_size": 54,
                "font_color": "#FFFFFF", "box_color": "#000000AA"}"##,
        )
        .unwrap();
        assert_eq!(style.max_chars_per_line, 14);
        assert_eq!(style.line_height(), 62);
        assert!(style.font_file.is_none());
        assert!((style.fade_secs - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_anchor_region_defaults_to_frame() {
        let layout = CaptionLayout::default();
        assert_eq!(layout.anchor_region(), FrameSize::PORTRAIT_1080.full_region());
        assert!(!layout.is_template());
    }
}
