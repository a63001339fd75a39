use crate::config::LayoutConfig;
use crate::layout::LayoutContext;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub max_r: f32,
    pub swimlanes: Vec<SwimlaneDump>,
    pub boxes: Vec<BoxDump>,
    pub relations: Vec<RelationDump>,
}

#[derive(Debug, Serialize)]
pub struct SwimlaneDump {
    pub index: u32,
    pub label: String,
    pub namespace: Option<String>,
    pub y: f32,
    pub height: f32,
    pub r: f32,
}

#[derive(Debug, Serialize)]
pub struct BoxDump {
    pub index: usize,
    pub frame: String,
    pub entity_type: String,
    pub entity_identifier: String,
    pub swimlane: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: String,
    pub stroke: String,
    pub text_lines: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RelationDump {
    pub from: String,
    pub to: String,
    pub source_box: usize,
    pub target_box: usize,
}

impl LayoutDump {
    pub fn from_layout(layout: &LayoutContext, config: &LayoutConfig) -> Self {
        let swimlanes = layout
            .sorted_swimlanes
            .iter()
            .map(|lane| SwimlaneDump {
                index: lane.index,
                label: lane.label.clone(),
                namespace: lane.namespace.clone(),
                y: lane.y,
                height: lane.height,
                r: lane.r,
            })
            .collect();

        let boxes = layout
            .boxes
            .iter()
            .map(|frame_box| BoxDump {
                index: frame_box.index,
                frame: frame_box.frame.name.clone(),
                entity_type: frame_box.frame.model_entity_type.as_token().to_string(),
                entity_identifier: frame_box.frame.entity_identifier.clone(),
                swimlane: frame_box.swimlane,
                x: frame_box.x,
                y: layout.box_top(frame_box, config),
                width: frame_box.dimension.width,
                height: frame_box.dimension.height,
                fill: frame_box.visual.fill.clone(),
                stroke: frame_box.visual.stroke.clone(),
                text_lines: frame_box
                    .text_lines
                    .iter()
                    .map(|line| line.text.clone())
                    .collect(),
            })
            .collect();

        let frame_name = |index: usize| {
            layout
                .boxes
                .get(index)
                .map(|frame_box| frame_box.frame.name.clone())
                .unwrap_or_default()
        };
        let relations = layout
            .relations
            .iter()
            .map(|relation| RelationDump {
                from: frame_name(relation.source_box),
                to: frame_name(relation.target_box),
                source_box: relation.source_box,
                target_box: relation.target_box,
            })
            .collect();

        LayoutDump {
            width: layout.canvas_width(config),
            height: layout.canvas_height(config),
            max_r: layout.max_r,
            swimlanes,
            boxes,
            relations,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &LayoutContext, config: &LayoutConfig) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, config);
    serde_json::to_writer_pretty(writer, &dump)?;
    tracing::debug!(path = %path.display(), "wrote layout dump");
    Ok(())
}
