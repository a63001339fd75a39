mod error;
mod machine;
mod placement;
mod relation;
mod swimlane;
mod text;
pub(crate) mod types;

pub use error::LayoutError;
pub use machine::{
    Command, Event, FramePositioned, LayoutMachine, PositionFrame, PositionRelation,
    RelationPositioned,
};
pub use placement::{calculate_x, clamp_dimension};
pub use relation::{find_implicit_source, find_source_box};
pub use swimlane::{
    SwimlaneProps, assign_swimlane, grow_swimlane, new_swimlane, next_free_index,
    restack_swimlanes,
};
pub use text::{
    ContentFragment, UNNAMED_LABEL, build_content, calculate_text_props, content_lines,
    content_markup, strip_block_value, strip_inline_value,
};
pub use types::*;

use crate::config::LayoutConfig;
use crate::ir::EventModel;
use crate::text_metrics::TextMeasurer;
use crate::theme::Theme;

/// Place every frame of `model` in declaration order.
///
/// Each frame is positioned first; then one relation per distinct explicit
/// source frame in declaration order, or a single implicit relation when it
/// lists none.
pub fn compute_layout(
    model: &EventModel,
    theme: &Theme,
    config: &LayoutConfig,
    measurer: &dyn TextMeasurer,
) -> Result<LayoutContext, LayoutError> {
    let machine = LayoutMachine::new(theme, config);
    let mut state = LayoutContext::new();

    for (index, frame) in model.frames.iter().enumerate() {
        let text = calculate_text_props(frame, &model.data_entities, config, measurer);
        state = machine.dispatch(
            state,
            Command::PositionFrame(PositionFrame { index, frame, text }),
        )?;

        if frame.has_source_frames() {
            let mut seen: Vec<&str> = Vec::with_capacity(frame.source_frames.len());
            for source in &frame.source_frames {
                if seen.contains(&source.as_str()) {
                    tracing::debug!(frame = %frame.name, source = %source, "skipping repeated source");
                    continue;
                }
                seen.push(source.as_str());
                state = machine.dispatch(
                    state,
                    Command::PositionRelation(PositionRelation {
                        index,
                        frame,
                        source: Some(source.as_str()),
                    }),
                )?;
            }
        } else {
            state = machine.dispatch(
                state,
                Command::PositionRelation(PositionRelation {
                    index,
                    frame,
                    source: None,
                }),
            )?;
        }
    }

    state.finalize();
    tracing::info!(
        frames = state.boxes.len(),
        swimlanes = state.sorted_swimlanes.len(),
        relations = state.relations.len(),
        width = state.canvas_width(config),
        height = state.canvas_height(config),
        "computed event model layout"
    );
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Frame, ModelEntityType};
    use crate::text_metrics::FixedMetrics;

    fn layout(frames: Vec<Frame>) -> Result<LayoutContext, LayoutError> {
        let model = EventModel {
            frames,
            data_entities: Vec::new(),
        };
        compute_layout(
            &model,
            &Theme::default(),
            &LayoutConfig::default(),
            &FixedMetrics,
        )
    }

    #[test]
    fn same_lane_frames_sit_side_by_side() {
        let ctx = layout(vec![
            Frame::new("01", ModelEntityType::Event, "A"),
            Frame::new("02", ModelEntityType::Event, "B"),
        ])
        .expect("layout");
        assert_eq!(ctx.boxes.len(), 2);
        assert_eq!(ctx.boxes[0].x, 250.0);
        assert_eq!(ctx.boxes[1].x, ctx.boxes[0].r + 10.0);
        assert_eq!(ctx.boxes[0].swimlane, 200);
        assert_eq!(ctx.boxes[1].swimlane, 200);
        assert!(ctx.relations.is_empty());
        assert_eq!(ctx.sorted_swimlanes.len(), 1);
        assert_eq!(ctx.max_r, ctx.boxes[1].r);
    }

    #[test]
    fn command_then_event_staggers_and_links() {
        let ctx = layout(vec![
            Frame::new("01", ModelEntityType::Command, "Add"),
            Frame::new("02", ModelEntityType::Event, "Added"),
        ])
        .expect("layout");
        let (command, event) = (&ctx.boxes[0], &ctx.boxes[1]);
        assert_eq!(command.swimlane, 100);
        assert_eq!(event.swimlane, 200);
        assert_eq!(event.x, command.r - 90.0 + 10.0);
        assert_eq!(ctx.relations.len(), 1);
        assert_eq!(ctx.relations[0].source_box, 0);
        assert_eq!(ctx.relations[0].target_box, 1);
        assert_eq!(ctx.relations[0].source.x, command.x);
        assert_eq!(ctx.relations[0].target.x, event.x);
        assert_eq!(ctx.sorted_swimlanes[0].y, 0.0);
        assert_eq!(
            ctx.sorted_swimlanes[1].y,
            ctx.sorted_swimlanes[0].bottom() + 10.0
        );
    }

    #[test]
    fn namespaced_events_carve_a_stream_lane() {
        let ctx = layout(vec![
            Frame::new("01", ModelEntityType::Event, "Orders.Placed"),
            Frame::new("02", ModelEntityType::Event, "Orders.Shipped"),
            Frame::new("03", ModelEntityType::Event, "Billed"),
        ])
        .expect("layout");
        assert_eq!(ctx.boxes[0].swimlane, 201);
        assert_eq!(ctx.boxes[1].swimlane, 201);
        assert_eq!(ctx.boxes[2].swimlane, 200);
        let labels: Vec<&str> = ctx
            .sorted_swimlanes
            .iter()
            .map(|lane| lane.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Events", "Stream: Orders"]);
    }

    #[test]
    fn explicit_sources_fan_in() {
        let ctx = layout(vec![
            Frame::new("01", ModelEntityType::Event, "A"),
            Frame::new("02", ModelEntityType::Event, "B"),
            Frame::new("03", ModelEntityType::ReadModel, "View").with_sources(["01", "02"]),
        ])
        .expect("layout");
        let sources: Vec<usize> = ctx.relations.iter().map(|r| r.source_box).collect();
        assert_eq!(sources, vec![0, 1]);
        assert!(ctx.relations.iter().all(|r| r.target_box == 2));
    }

    #[test]
    fn reset_frame_has_no_incoming_relation() {
        let ctx = layout(vec![
            Frame::new("01", ModelEntityType::Command, "Add"),
            Frame::new("02", ModelEntityType::Event, "Added").reset(),
        ])
        .expect("layout");
        assert!(ctx.relations.is_empty());
    }

    #[test]
    fn unknown_source_fails() {
        let err = layout(vec![
            Frame::new("01", ModelEntityType::Event, "A"),
            Frame::new("02", ModelEntityType::ReadModel, "B").with_sources(["99"]),
        ])
        .expect_err("unresolved source");
        assert!(matches!(
            err,
            LayoutError::UnresolvedSource { ref source_frame, .. } if source_frame == "99"
        ));
    }

    #[test]
    fn forward_and_self_references_fail() {
        let forward = layout(vec![
            Frame::new("01", ModelEntityType::Event, "A").with_sources(["02"]),
            Frame::new("02", ModelEntityType::Event, "B"),
        ]);
        assert!(forward.is_err());
        let itself = layout(vec![
            Frame::new("01", ModelEntityType::Event, "A"),
            Frame::new("02", ModelEntityType::Event, "B").with_sources(["02"]),
        ]);
        assert!(itself.is_err());
    }

    #[test]
    fn empty_model_uses_minimum_canvas() {
        let config = LayoutConfig::default();
        let ctx = layout(Vec::new()).expect("layout");
        assert!(ctx.boxes.is_empty());
        assert_eq!(ctx.canvas_width(&config), config.min_canvas_width());
        assert_eq!(ctx.canvas_height(&config), config.min_canvas_height());
    }

    #[test]
    fn layout_is_deterministic() {
        let frames = vec![
            Frame::new("01", ModelEntityType::Screen, "Cart"),
            Frame::new("02", ModelEntityType::Command, "Add").with_inline_value("{ id: 1 }"),
            Frame::new("03", ModelEntityType::Event, "Shop.Added"),
            Frame::new("04", ModelEntityType::ReadModel, "Items").with_sources(["03"]),
        ];
        assert_eq!(layout(frames.clone()).ok(), layout(frames).ok());
    }

    #[test]
    fn lanes_never_shrink_and_max_r_tracks_lanes() {
        let ctx = layout(vec![
            Frame::new("01", ModelEntityType::Command, "A").with_inline_value(
                "{ a very long inline value that will certainly need a wide box }",
            ),
            Frame::new("02", ModelEntityType::Event, "B"),
            Frame::new("03", ModelEntityType::Command, "C"),
        ])
        .expect("layout");
        let widest = ctx
            .sorted_swimlanes
            .iter()
            .map(|lane| lane.r)
            .fold(0.0f32, f32::max);
        assert_eq!(ctx.max_r, widest);
        for frame_box in &ctx.boxes {
            let lane = ctx.swimlane_of(frame_box).expect("lane");
            assert!(lane.r >= frame_box.r);
            assert!(lane.max_height >= frame_box.dimension.height);
        }
    }

    #[test]
    fn box_returning_to_its_lane_overlaps_previous_column() {
        let ctx = layout(vec![
            Frame::new("01", ModelEntityType::Command, "A"),
            Frame::new("02", ModelEntityType::Event, "B"),
            Frame::new("03", ModelEntityType::Command, "C"),
        ])
        .expect("layout");
        let config = LayoutConfig::default();
        let (first, event, returning) = (&ctx.boxes[0], &ctx.boxes[1], &ctx.boxes[2]);
        assert_eq!(returning.swimlane, first.swimlane);
        assert_eq!(
            returning.x,
            event.r - config.box_overlap + config.box_padding
        );
        assert!(returning.x < first.r);
    }

    #[test]
    fn repeated_source_links_once() {
        let ctx = layout(vec![
            Frame::new("01", ModelEntityType::Event, "A"),
            Frame::new("02", ModelEntityType::Event, "B"),
            Frame::new("03", ModelEntityType::ReadModel, "View").with_sources(["02", "01", "02"]),
        ])
        .expect("layout");
        let sources: Vec<usize> = ctx.relations.iter().map(|r| r.source_box).collect();
        assert_eq!(sources, vec![1, 0]);
    }
}
