//! Vertical placement of stacked caption lines.

use shorts_models::{FrameSize, OverlayRegion};

/// Top offsets for `line_count` lines of `line_height` pixels.
///
/// The stack is centred inside `region` (the whole frame when `None`) and
/// never starts above the region's top edge.
pub fn compute_vertical_stack(
    line_count: usize,
    line_height: u32,
    region: Option<OverlayRegion>,
    frame: FrameSize,
) -> Vec<i32> {
    let region = region.unwrap_or_else(|| frame.full_region());
    let line_height = i64::from(line_height);
    let total = line_count as i64 * line_height;
    let top = i64::from(region.y);

    let centred = top + (i64::from(region.height) - total).div_euclid(2);
    let base = centred.max(top);

    (0..line_count as i64)
        .map(|i| (base + i * line_height).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
        .collect()
}
