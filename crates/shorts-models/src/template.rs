//! Video templates stored in the `templates` table.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::caption::{CaptionLayout, CaptionStyle};
use crate::rect::{FrameSize, OverlayRegion};

/// Background area used when a template omits `video_area`.
pub const DEFAULT_VIDEO_AREA: OverlayRegion = OverlayRegion {
    x: 0,
    y: 0,
    width: 1080,
    height: 1080,
};

/// A frame image with designated background and caption areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Template {
    pub template_id: String,
    /// Template frame image
    pub frame_url: String,
    /// Where the background image is scaled and composited
    #[serde(default, deserialize_with = "region_or_empty")]
    #[schemars(with = "Option<OverlayRegion>")]
    pub video_area: Option<OverlayRegion>,
    /// Preferred caption region
    #[serde(default, deserialize_with = "region_or_empty")]
    #[schemars(with = "Option<OverlayRegion>")]
    pub headline_area: Option<OverlayRegion>,
    /// Fallback caption region
    #[serde(default, deserialize_with = "region_or_empty")]
    #[schemars(with = "Option<OverlayRegion>")]
    pub bottom_area: Option<OverlayRegion>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_size: Option<u32>,
    #[serde(default)]
    pub font_color: Option<String>,
    #[serde(default)]
    pub box_color: Option<String>,
}

/// Templates store missing areas as `{}` or `null`.
fn region_or_empty<'de, D>(deserializer: D) -> Result<Option<OverlayRegion>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(None),
        Some(v) => serde_json::from_value(v)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl Template {
    /// Caption region: headline area first, then bottom area.
    pub fn caption_region(&self) -> Option<OverlayRegion> {
        self.headline_area.or(self.bottom_area)
    }

    /// Layout for rendering onto this template's frame.
    pub fn layout(&self, frame: FrameSize) -> CaptionLayout {
        CaptionLayout {
            frame,
            caption_region: self.caption_region(),
            background_area: Some(self.video_area.unwrap_or(DEFAULT_VIDEO_AREA)),
        }
    }

    /// Caption style with this template's overrides applied.
    ///
    /// A template naming a font family renders through fontconfig, so the
    /// base font file is dropped in that case.
    pub fn style(&self, base: &CaptionStyle) -> CaptionStyle {
        let mut style = base.clone();
        if let Some(family) = self.font_family.as_deref().filter(|f| !f.trim().is_empty()) {
            style.font_family = family.to_string();
            style.font_file = None;
        }
        style.font_size = self.font_size.unwrap_or(54);
        style.font_color = self
            .font_color
            .clone()
            .unwrap_or_else(|| "#FFFFFF".to_string());
        style.box_color = self
            .box_color
            .clone()
            .unwrap_or_else(|| "#000000AA".to_string());
        style
    }
}
