use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::ir::Frame;
use crate::text_metrics::TextLine;
use crate::theme::VisualProps;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Dimension {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Measured text content of one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextProps {
    /// XHTML markup drawn inside the box.
    pub content: String,
    /// Plain styled lines, used when markup cannot be embedded.
    pub lines: Vec<TextLine>,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Swimlane {
    pub index: u32,
    pub label: String,
    pub namespace: Option<String>,
    pub r: f32,
    pub y: f32,
    pub height: f32,
    pub max_height: f32,
}

impl Swimlane {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// The placed rectangle of one frame. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameBox {
    pub index: usize,
    pub frame: Frame,
    pub x: f32,
    /// Top edge at creation time. Lanes added later can push the lane down;
    /// renderers read the lane's final offset instead.
    pub y: f32,
    pub r: f32,
    pub dimension: Dimension,
    pub swimlane: u32,
    pub visual: VisualProps,
    pub text: String,
    pub text_lines: Vec<TextLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relation {
    pub visual: VisualProps,
    pub source: Point,
    pub target: Point,
    pub source_box: usize,
    pub target_box: usize,
}

/// Accumulated layout state. Each dispatch step consumes one context and
/// hands back the next.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutContext {
    pub boxes: Vec<FrameBox>,
    pub swimlanes: BTreeMap<u32, Swimlane>,
    pub relations: Vec<Relation>,
    pub max_r: f32,
    pub previous_swimlane: Option<u32>,
    pub previous_frame: Option<String>,
    pub sorted_swimlanes: Vec<Swimlane>,
}

impl LayoutContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn swimlane_of(&self, frame_box: &FrameBox) -> Option<&Swimlane> {
        self.swimlanes.get(&frame_box.swimlane)
    }

    /// Top edge of a box against the final lane offsets.
    pub fn box_top(&self, frame_box: &FrameBox, config: &LayoutConfig) -> f32 {
        self.swimlane_of(frame_box)
            .map_or(frame_box.y, |lane| lane.y + config.swimlane_padding)
    }

    pub fn canvas_width(&self, config: &LayoutConfig) -> f32 {
        self.max_r.max(config.min_canvas_width())
    }

    pub fn canvas_height(&self, config: &LayoutConfig) -> f32 {
        self.sorted_swimlanes
            .last()
            .map_or(config.min_canvas_height(), Swimlane::bottom)
    }

    pub(crate) fn finalize(&mut self) {
        self.sorted_swimlanes = self.swimlanes.values().cloned().collect();
    }
}
