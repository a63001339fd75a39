use crate::config::LayoutConfig;

use super::{Dimension, FrameBox, Swimlane};

/// Clamp a measured box into the configured bounds, then add the outer box
/// padding on both sides.
pub fn clamp_dimension(dimension: Dimension, config: &LayoutConfig) -> Dimension {
    Dimension {
        width: dimension.width.min(config.box_max_width).max(config.box_min_width)
            + 2.0 * config.box_padding,
        height: dimension.height.min(config.box_max_height).max(config.box_min_height)
            + 2.0 * config.box_padding,
    }
}

/// Left edge for the next box.
///
/// The first box of the document starts at `content_start_x`. A box that
/// follows one in its own lane sits a padding right of the lane's extent.
/// Any other box starts `box_overlap` left of the previous box's right edge,
/// which produces the staggered waterfall across lanes.
pub fn calculate_x(
    lane: Option<&Swimlane>,
    lane_index: u32,
    previous_swimlane: Option<u32>,
    last_box: Option<&FrameBox>,
    config: &LayoutConfig,
) -> f32 {
    let Some(previous_swimlane) = previous_swimlane else {
        return config.content_start_x;
    };
    if previous_swimlane == lane_index {
        if let Some(lane) = lane.filter(|lane| lane.r > 0.0) {
            return lane.r + config.box_padding;
        }
    }
    match last_box {
        Some(last_box) => last_box.r - config.box_overlap + config.box_padding,
        None => config.content_start_x,
    }
}
