//! Command/event reducer driving placement one frame at a time.
//!
//! `decide` inspects the current context and turns a command into zero or
//! more events without touching the context; `evolve` folds events into the
//! next context. `dispatch` chains the two.

use crate::config::LayoutConfig;
use crate::ir::Frame;
use crate::theme::{Theme, VisualProps};

use super::placement::{calculate_x, clamp_dimension};
use super::relation::{find_implicit_source, find_source_box};
use super::swimlane::{assign_swimlane, grow_swimlane, new_swimlane, restack_swimlanes};
use super::{Dimension, FrameBox, LayoutContext, LayoutError, Point, Relation, TextProps};

#[derive(Debug, Clone)]
pub struct PositionFrame<'a> {
    pub index: usize,
    pub frame: &'a Frame,
    pub text: TextProps,
}

/// `source` names an explicit source frame; `None` asks for the implicit one.
#[derive(Debug, Clone)]
pub struct PositionRelation<'a> {
    pub index: usize,
    pub frame: &'a Frame,
    pub source: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub enum Command<'a> {
    PositionFrame(PositionFrame<'a>),
    PositionRelation(PositionRelation<'a>),
}

#[derive(Debug, Clone)]
pub struct FramePositioned<'a> {
    pub index: usize,
    pub frame: &'a Frame,
    pub visual: VisualProps,
    pub dimension: Dimension,
    pub text: TextProps,
}

#[derive(Debug, Clone)]
pub struct RelationPositioned<'a> {
    pub index: usize,
    pub frame: &'a Frame,
    pub source_box: usize,
    pub target_box: usize,
}

#[derive(Debug, Clone)]
pub enum Event<'a> {
    FramePositioned(FramePositioned<'a>),
    RelationPositioned(RelationPositioned<'a>),
}

pub struct LayoutMachine<'c> {
    theme: &'c Theme,
    config: &'c LayoutConfig,
}

impl<'c> LayoutMachine<'c> {
    pub fn new(theme: &'c Theme, config: &'c LayoutConfig) -> Self {
        Self { theme, config }
    }

    pub fn dispatch(
        &self,
        state: LayoutContext,
        command: Command<'_>,
    ) -> Result<LayoutContext, LayoutError> {
        let events = self.decide(&state, command)?;
        Ok(self.evolve(state, events))
    }

    pub fn decide<'a>(
        &self,
        state: &LayoutContext,
        command: Command<'a>,
    ) -> Result<Vec<Event<'a>>, LayoutError> {
        let events = match command {
            Command::PositionFrame(command) => self.decide_position_frame(command),
            Command::PositionRelation(command) => self.decide_position_relation(state, command)?,
        };
        tracing::debug!(count = events.len(), "decided events");
        Ok(events)
    }

    pub fn evolve(&self, state: LayoutContext, events: Vec<Event<'_>>) -> LayoutContext {
        events.into_iter().fold(state, |state, event| match event {
            Event::FramePositioned(event) => self.evolve_frame_positioned(state, event),
            Event::RelationPositioned(event) => self.evolve_relation_positioned(state, event),
        })
    }

    fn decide_position_frame<'a>(&self, command: PositionFrame<'a>) -> Vec<Event<'a>> {
        let visual = self
            .theme
            .palette
            .visual_for(&command.frame.model_entity_type)
            .clone();
        if !command.frame.model_entity_type.is_known() {
            tracing::warn!(
                frame = %command.frame.name,
                entity_type = command.frame.model_entity_type.as_token(),
                "unmapped frame type, drawing with the error style"
            );
        }
        let padding = self.config.box_text_padding;
        let dimension = Dimension {
            width: command.text.width + 2.0 * padding,
            height: command.text.height + 2.0 * padding,
        };
        vec![Event::FramePositioned(FramePositioned {
            index: command.index,
            frame: command.frame,
            visual,
            dimension,
            text: command.text,
        })]
    }

    fn decide_position_relation<'a>(
        &self,
        state: &LayoutContext,
        command: PositionRelation<'a>,
    ) -> Result<Vec<Event<'a>>, LayoutError> {
        let PositionRelation {
            index,
            frame,
            source,
        } = command;
        let first_without_sources = index == 0 && !frame.has_source_frames();
        if frame.is_reset_frame || first_without_sources {
            return Ok(Vec::new());
        }

        let target = state
            .boxes
            .get(index)
            .filter(|target| target.frame.name == frame.name)
            .ok_or_else(|| LayoutError::MissingTargetBox {
                frame: frame.name.clone(),
                index,
            })?;

        let source_box = match source {
            Some(name) => Some(find_source_box(&state.boxes, name, index).ok_or_else(|| {
                LayoutError::UnresolvedSource {
                    frame: frame.name.clone(),
                    source_frame: name.to_string(),
                }
            })?),
            None => find_implicit_source(&state.boxes, target.swimlane, index),
        };

        let Some(source_box) = source_box else {
            tracing::debug!(frame = %frame.name, "no implicit source in another lane");
            return Ok(Vec::new());
        };
        tracing::debug!(
            frame = %frame.name,
            source = %source_box.frame.name,
            explicit = source.is_some(),
            "resolved relation"
        );
        Ok(vec![Event::RelationPositioned(RelationPositioned {
            index,
            frame,
            source_box: source_box.index,
            target_box: target.index,
        })])
    }

    fn evolve_frame_positioned(
        &self,
        mut state: LayoutContext,
        event: FramePositioned<'_>,
    ) -> LayoutContext {
        let config = self.config;
        let props = assign_swimlane(event.frame, &state.swimlanes, &config.labels);
        let existing = state.swimlanes.get(&props.index);

        let dimension = clamp_dimension(event.dimension, config);
        let x = calculate_x(
            existing,
            props.index,
            state.previous_swimlane,
            state.boxes.last(),
            config,
        );
        let r = x + dimension.width + config.box_padding;

        let lane = state
            .swimlanes
            .entry(props.index)
            .or_insert_with(|| new_swimlane(&props, config));
        grow_swimlane(lane, r, dimension, config);
        restack_swimlanes(&mut state.swimlanes, config.swimlane_gap);
        let lane_y = state
            .swimlanes
            .get(&props.index)
            .map_or(0.0, |lane| lane.y);

        state.boxes.push(FrameBox {
            index: event.index,
            frame: event.frame.clone(),
            x,
            y: lane_y + config.swimlane_padding,
            r,
            dimension,
            swimlane: props.index,
            visual: event.visual,
            text: event.text.content,
            text_lines: event.text.lines,
        });
        state.max_r = state
            .swimlanes
            .values()
            .map(|lane| lane.r)
            .fold(state.max_r, f32::max);
        state.previous_swimlane = Some(props.index);
        state.previous_frame = Some(event.frame.name.clone());

        tracing::debug!(
            frame = %event.frame.name,
            swimlane = props.index,
            x,
            r,
            width = dimension.width,
            height = dimension.height,
            "placed frame"
        );
        state
    }

    fn evolve_relation_positioned(
        &self,
        mut state: LayoutContext,
        event: RelationPositioned<'_>,
    ) -> LayoutContext {
        let anchor = |index: usize| {
            state
                .boxes
                .get(index)
                .map_or(Point::default(), |frame_box| Point {
                    x: frame_box.x,
                    y: frame_box.y,
                })
        };
        let relation = Relation {
            visual: self.theme.relation.clone(),
            source: anchor(event.source_box),
            target: anchor(event.target_box),
            source_box: event.source_box,
            target_box: event.target_box,
        };
        tracing::debug!(frame = %event.frame.name, index = event.index, "added relation");
        state.relations.push(relation);
        state
    }
}
