use crate::text_metrics::TextStyle;
use crate::theme::{Theme, VisualProps};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextStyles {
    pub bold: TextStyle,
    pub line_break: TextStyle,
    pub code: TextStyle,
}

impl Default for TextStyles {
    fn default() -> Self {
        Self {
            bold: TextStyle::new("sans-serif", 12.0, "700"),
            line_break: TextStyle::new("sans-serif", 12.0, "normal"),
            code: TextStyle::new("monospace", 12.0, "normal"),
        }
    }
}

/// Lane labels per tier. Generic labels name the tier's default lane; the
/// prefixes are prepended to a namespace for carved lanes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneLabels {
    pub ui_automation: String,
    pub ui_automation_prefix: String,
    pub command_read_model: String,
    pub command_read_model_prefix: String,
    pub events: String,
    pub events_prefix: String,
}

impl Default for LaneLabels {
    fn default() -> Self {
        Self {
            ui_automation: "UI/Automation".to_string(),
            ui_automation_prefix: "UI/A: ".to_string(),
            command_read_model: "Command/Read Model".to_string(),
            command_read_model_prefix: "C/RM: ".to_string(),
            events: "Events".to_string(),
            events_prefix: "Stream: ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub swimlane_min_height: f32,
    pub swimlane_padding: f32,
    pub swimlane_gap: f32,
    pub box_padding: f32,
    pub box_text_padding: f32,
    pub box_overlap: f32,
    pub box_min_width: f32,
    pub box_max_width: f32,
    pub box_min_height: f32,
    pub box_max_height: f32,
    pub content_start_x: f32,
    /// Wrap bound for preformatted data blocks.
    pub text_max_width: f32,
    /// Wrap bound for the whole text content of a box.
    pub measure_max_width: f32,
    pub line_gap: f32,
    /// Scale applied to measured line widths; covers wide scripts the font
    /// metrics under-report.
    pub text_width_ratio: f32,
    pub swimlane_label_x: f32,
    pub swimlane_label_y: f32,
    pub box_corner_radius: f32,
    pub text: TextStyles,
    pub labels: LaneLabels,
}

impl LayoutConfig {
    pub fn min_canvas_width(&self) -> f32 {
        self.content_start_x + self.box_min_width + 3.0 * self.box_padding
    }

    pub fn min_canvas_height(&self) -> f32 {
        self.swimlane_min_height + 2.0 * self.swimlane_padding
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            swimlane_min_height: 70.0,
            swimlane_padding: 15.0,
            swimlane_gap: 10.0,
            box_padding: 10.0,
            box_text_padding: 10.0,
            box_overlap: 90.0,
            box_min_width: 80.0,
            box_max_width: 450.0,
            box_min_height: 80.0,
            box_max_height: 750.0,
            content_start_x: 250.0,
            text_max_width: 450.0 - 2.0 * 10.0,
            measure_max_width: 450.0,
            line_gap: 2.0,
            text_width_ratio: 1.2,
            swimlane_label_x: 30.0,
            swimlane_label_y: 30.0,
            box_corner_radius: 3.0,
            text: TextStyles::default(),
            labels: LaneLabels::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
    /// Box text as XHTML inside `foreignObject`. Rasterizers ignore
    /// `foreignObject`, so PNG output turns this off.
    pub html_labels: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#FFFFFF".to_string(),
            html_labels: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::event_modeling();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    text_color: Option<String>,
    background: Option<String>,
    swimlane_fill: Option<String>,
    swimlane_stroke: Option<String>,
    relation_stroke: Option<String>,
    arrowhead_color: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VisualPropsFile {
    fill: Option<String>,
    stroke: Option<String>,
}

impl VisualPropsFile {
    fn apply(self, target: &mut VisualProps) {
        if let Some(v) = self.fill {
            target.fill = v;
        }
        if let Some(v) = self.stroke {
            target.stroke = v;
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaletteFile {
    screen: Option<VisualPropsFile>,
    processor: Option<VisualPropsFile>,
    read_model: Option<VisualPropsFile>,
    command: Option<VisualPropsFile>,
    event: Option<VisualPropsFile>,
    error: Option<VisualPropsFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    swimlane_min_height: Option<f32>,
    swimlane_padding: Option<f32>,
    swimlane_gap: Option<f32>,
    box_padding: Option<f32>,
    box_text_padding: Option<f32>,
    box_overlap: Option<f32>,
    box_min_width: Option<f32>,
    box_max_width: Option<f32>,
    box_min_height: Option<f32>,
    box_max_height: Option<f32>,
    content_start_x: Option<f32>,
    text_max_width: Option<f32>,
    measure_max_width: Option<f32>,
    line_gap: Option<f32>,
    text_width_ratio: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelsFile {
    ui_automation: Option<String>,
    ui_automation_prefix: Option<String>,
    command_read_model: Option<String>,
    command_read_model_prefix: Option<String>,
    events: Option<String>,
    events_prefix: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    palette: Option<PaletteFile>,
    layout: Option<LayoutConfigFile>,
    labels: Option<LabelsFile>,
    html_labels: Option<bool>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "muted" => config.theme = Theme::muted(),
            "default" | "event-modeling" => config.theme = Theme::event_modeling(),
            other => tracing::warn!(theme = other, "unknown theme name, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.swimlane_fill {
            config.theme.swimlane_fill = v;
        }
        if let Some(v) = vars.swimlane_stroke {
            config.theme.swimlane_stroke = v;
        }
        if let Some(v) = vars.relation_stroke {
            config.theme.relation.stroke = v;
        }
        if let Some(v) = vars.arrowhead_color {
            config.theme.arrowhead_color = v;
        }
    }

    if let Some(palette) = parsed.palette {
        let target = &mut config.theme.palette;
        if let Some(v) = palette.screen {
            v.apply(&mut target.screen);
        }
        if let Some(v) = palette.processor {
            v.apply(&mut target.processor);
        }
        if let Some(v) = palette.read_model {
            v.apply(&mut target.read_model);
        }
        if let Some(v) = palette.command {
            v.apply(&mut target.command);
        }
        if let Some(v) = palette.event {
            v.apply(&mut target.event);
        }
        if let Some(v) = palette.error {
            v.apply(&mut target.error);
        }
    }

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        let fields = [
            (layout.swimlane_min_height, &mut target.swimlane_min_height),
            (layout.swimlane_padding, &mut target.swimlane_padding),
            (layout.swimlane_gap, &mut target.swimlane_gap),
            (layout.box_padding, &mut target.box_padding),
            (layout.box_text_padding, &mut target.box_text_padding),
            (layout.box_overlap, &mut target.box_overlap),
            (layout.box_min_width, &mut target.box_min_width),
            (layout.box_max_width, &mut target.box_max_width),
            (layout.box_min_height, &mut target.box_min_height),
            (layout.box_max_height, &mut target.box_max_height),
            (layout.content_start_x, &mut target.content_start_x),
            (layout.text_max_width, &mut target.text_max_width),
            (layout.measure_max_width, &mut target.measure_max_width),
            (layout.line_gap, &mut target.line_gap),
            (layout.text_width_ratio, &mut target.text_width_ratio),
        ];
        for (value, slot) in fields {
            if let Some(v) = value {
                *slot = v;
            }
        }
        if target.box_min_width > target.box_max_width {
            anyhow::bail!(
                "boxMinWidth ({}) exceeds boxMaxWidth ({})",
                target.box_min_width,
                target.box_max_width
            );
        }
        if target.box_min_height > target.box_max_height {
            anyhow::bail!(
                "boxMinHeight ({}) exceeds boxMaxHeight ({})",
                target.box_min_height,
                target.box_max_height
            );
        }
    }

    if let Some(labels) = parsed.labels {
        let target = &mut config.layout.labels;
        if let Some(v) = labels.ui_automation {
            target.ui_automation = v;
        }
        if let Some(v) = labels.ui_automation_prefix {
            target.ui_automation_prefix = v;
        }
        if let Some(v) = labels.command_read_model {
            target.command_read_model = v;
        }
        if let Some(v) = labels.command_read_model_prefix {
            target.command_read_model_prefix = v;
        }
        if let Some(v) = labels.events {
            target.events = v;
        }
        if let Some(v) = labels.events_prefix {
            target.events_prefix = v;
        }
    }

    if let Some(v) = parsed.html_labels {
        config.render.html_labels = v;
    }

    config.render.background = config.theme.background.clone();

    Ok(config)
}
