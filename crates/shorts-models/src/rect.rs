use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    /// Vertical 9:16 short-form frame.
    pub const PORTRAIT_1080: FrameSize = FrameSize {
        width: 1080,
        height: 1920,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Region covering the whole frame.
    pub fn full_region(&self) -> OverlayRegion {
        OverlayRegion::new(0, 0, self.width, self.height)
    }
}

impl Default for FrameSize {
    fn default() -> Self {
        Self::PORTRAIT_1080
    }
}

/// A pixel rectangle inside the output frame.
///
/// Templates store these as `{x, y, w, h}`; the short keys are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OverlayRegion {
    /// X coordinate of the top-left corner
    pub x: i32,
    /// Y coordinate of the top-left corner
    pub y: i32,
    /// Width in pixels
    #[serde(alias = "w")]
    pub width: u32,
    /// Height in pixels
    #[serde(alias = "h")]
    pub height: u32,
}

impl OverlayRegion {
    /// Create a new region.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check that the region has a usable area.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}
