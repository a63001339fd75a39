use serde::{Deserialize, Serialize};

use crate::ir::ModelEntityType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualProps {
    pub fill: String,
    pub stroke: String,
}

impl VisualProps {
    pub fn new(fill: &str, stroke: &str) -> Self {
        Self {
            fill: fill.to_string(),
            stroke: stroke.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette {
    pub screen: VisualProps,
    pub processor: VisualProps,
    pub read_model: VisualProps,
    pub command: VisualProps,
    pub event: VisualProps,
    /// Used for frame types the palette has no entry for.
    pub error: VisualProps,
}

impl Palette {
    pub fn visual_for(&self, entity_type: &ModelEntityType) -> &VisualProps {
        match entity_type {
            ModelEntityType::Screen => &self.screen,
            ModelEntityType::Processor => &self.processor,
            ModelEntityType::ReadModel => &self.read_model,
            ModelEntityType::Command => &self.command,
            ModelEntityType::Event => &self.event,
            ModelEntityType::Other(_) => &self.error,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            screen: VisualProps::new("white", "#dbdada"),
            processor: VisualProps::new("#edb3f6", "#b88cbf"),
            read_model: VisualProps::new("#d3f1a2", "#a3b732"),
            command: VisualProps::new("#bcd6fe", "#679ac3"),
            event: VisualProps::new("#ffb778", "#c19a0f"),
            error: VisualProps::new("red", "black"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub text_color: String,
    pub background: String,
    pub swimlane_fill: String,
    pub swimlane_stroke: String,
    pub relation: VisualProps,
    pub arrowhead_color: String,
    pub palette: Palette,
}

impl Theme {
    pub fn event_modeling() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 12.0,
            text_color: "#333".to_string(),
            background: "#FFFFFF".to_string(),
            swimlane_fill: "rgb(250,250,250)".to_string(),
            swimlane_stroke: "rgb(240,240,240)".to_string(),
            relation: VisualProps::new("none", "#000"),
            arrowhead_color: "#000".to_string(),
            palette: Palette::default(),
        }
    }

    /// Same palette on darker lane bands with softer edges.
    pub fn muted() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            text_color: "#1C2430".to_string(),
            background: "#FFFFFF".to_string(),
            swimlane_fill: "#F3F5F9".to_string(),
            swimlane_stroke: "#E1E6EF".to_string(),
            relation: VisualProps::new("none", "#7A8AA6"),
            arrowhead_color: "#7A8AA6".to_string(),
            palette: Palette::default(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::event_modeling()
    }
}
