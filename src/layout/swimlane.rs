use std::collections::BTreeMap;

use crate::config::{LaneLabels, LayoutConfig};
use crate::ir::{Frame, Tier};

use super::{Dimension, Swimlane};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwimlaneProps {
    pub index: u32,
    pub label: String,
    pub namespace: Option<String>,
}

/// Lane for a frame: an existing namespace lane, a freshly carved one inside
/// the tier's band, or the tier's generic lane.
pub fn assign_swimlane(
    frame: &Frame,
    swimlanes: &BTreeMap<u32, Swimlane>,
    labels: &LaneLabels,
) -> SwimlaneProps {
    let tier = frame.model_entity_type.tier();
    let Some(namespace) = frame.namespace() else {
        return generic_lane(tier, labels);
    };

    if let Some(existing) = swimlanes
        .values()
        .find(|lane| lane.namespace.as_deref() == Some(namespace))
    {
        return SwimlaneProps {
            index: existing.index,
            label: existing.label.clone(),
            namespace: existing.namespace.clone(),
        };
    }

    match next_free_index(swimlanes, tier) {
        Some(index) => {
            let label = format!("{}{}", tier_prefix(tier, labels), namespace);
            tracing::debug!(index, %label, "carving namespace swimlane");
            SwimlaneProps {
                index,
                label,
                namespace: Some(namespace.to_string()),
            }
        }
        None => {
            tracing::warn!(namespace, ?tier, "tier band exhausted, using the generic lane");
            generic_lane(tier, labels)
        }
    }
}

fn generic_lane(tier: Tier, labels: &LaneLabels) -> SwimlaneProps {
    let label = match tier {
        Tier::Interaction => &labels.ui_automation,
        Tier::CommandReadModel => &labels.command_read_model,
        Tier::Event => &labels.events,
    };
    SwimlaneProps {
        index: tier.base_index(),
        label: label.clone(),
        namespace: None,
    }
}

fn tier_prefix(tier: Tier, labels: &LaneLabels) -> &str {
    match tier {
        Tier::Interaction => &labels.ui_automation_prefix,
        Tier::CommandReadModel => &labels.command_read_model_prefix,
        Tier::Event => &labels.events_prefix,
    }
}

/// One past the highest lane strictly inside the tier band, or `base + 1`
/// for an empty band. When the top of the band is taken, the lowest unused
/// index in the band is used instead.
pub fn next_free_index(swimlanes: &BTreeMap<u32, Swimlane>, tier: Tier) -> Option<u32> {
    let base = tier.base_index();
    let end = tier.band_end();
    let highest = swimlanes
        .range(base + 1..end)
        .next_back()
        .map_or(base, |(index, _)| *index);
    if highest + 1 < end {
        return Some(highest + 1);
    }
    (base + 1..end).find(|index| !swimlanes.contains_key(index))
}

pub fn new_swimlane(props: &SwimlaneProps, config: &LayoutConfig) -> Swimlane {
    Swimlane {
        index: props.index,
        label: props.label.clone(),
        namespace: props.namespace.clone(),
        r: 0.0,
        y: props.index as f32 * config.swimlane_min_height + config.swimlane_gap,
        height: config.swimlane_min_height,
        max_height: config.swimlane_min_height,
    }
}

/// Widen and heighten a lane for a newly placed box. Neither extent shrinks.
pub fn grow_swimlane(lane: &mut Swimlane, box_r: f32, dimension: Dimension, config: &LayoutConfig) {
    lane.r = lane.r.max(box_r);
    lane.max_height = lane.max_height.max(dimension.height);
    lane.height =
        config.swimlane_min_height.max(lane.max_height) + 2.0 * config.swimlane_padding;
}

/// Stack lanes top to bottom in index order: the first at 0, each next one a
/// gap below the previous lane's bottom edge.
pub fn restack_swimlanes(swimlanes: &mut BTreeMap<u32, Swimlane>, gap: f32) {
    let mut next_y: Option<f32> = None;
    for lane in swimlanes.values_mut() {
        lane.y = next_y.unwrap_or(0.0);
        next_y = Some(lane.bottom() + gap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ModelEntityType;

    fn lanes_from(props: &[SwimlaneProps]) -> BTreeMap<u32, Swimlane> {
        let config = LayoutConfig::default();
        props
            .iter()
            .map(|p| (p.index, new_swimlane(p, &config)))
            .collect()
    }

    #[test]
    fn plain_identifiers_use_tier_base_lanes() {
        let labels = LaneLabels::default();
        let lanes = BTreeMap::new();
        let screen = Frame::new("01", ModelEntityType::Screen, "Cart");
        let command = Frame::new("02", ModelEntityType::Command, "AddItem");
        let odd = Frame::new("03", ModelEntityType::Other("policy".into()), "Check");
        assert_eq!(assign_swimlane(&screen, &lanes, &labels).index, 0);
        assert_eq!(assign_swimlane(&command, &lanes, &labels).label, "Command/Read Model");
        let fallback = assign_swimlane(&odd, &lanes, &labels);
        assert_eq!((fallback.index, fallback.label.as_str()), (200, "Events"));
    }

    #[test]
    fn namespace_carves_lane_inside_band() {
        let labels = LaneLabels::default();
        let frame = Frame::new("01", ModelEntityType::Event, "Billing.InvoiceIssued");
        let props = assign_swimlane(&frame, &BTreeMap::new(), &labels);
        assert_eq!(props.index, 201);
        assert_eq!(props.label, "Stream: Billing");
        assert_eq!(props.namespace.as_deref(), Some("Billing"));
    }

    #[test]
    fn existing_namespace_lane_is_reused() {
        let labels = LaneLabels::default();
        let billing = SwimlaneProps {
            index: 203,
            label: "Stream: Billing".to_string(),
            namespace: Some("Billing".to_string()),
        };
        let lanes = lanes_from(&[billing]);
        let frame = Frame::new("05", ModelEntityType::Event, "Billing.Paid");
        let props = assign_swimlane(&frame, &lanes, &labels);
        assert_eq!(props.index, 203);
        assert_eq!(props.label, "Stream: Billing");
    }

    #[test]
    fn next_free_index_ignores_other_bands() {
        let generic = SwimlaneProps {
            index: 100,
            label: "Command/Read Model".to_string(),
            namespace: None,
        };
        let stream = SwimlaneProps {
            index: 202,
            label: "Stream: A".to_string(),
            namespace: Some("A".to_string()),
        };
        let lanes = lanes_from(&[generic, stream]);
        assert_eq!(next_free_index(&lanes, Tier::CommandReadModel), Some(101));
        assert_eq!(next_free_index(&lanes, Tier::Event), Some(203));
        assert_eq!(next_free_index(&lanes, Tier::Interaction), Some(1));
    }

    #[test]
    fn next_free_index_reuses_holes_when_band_top_taken() {
        let top = SwimlaneProps {
            index: 99,
            label: "UI/A: Top".to_string(),
            namespace: Some("Top".to_string()),
        };
        let lanes = lanes_from(&[top]);
        assert_eq!(next_free_index(&lanes, Tier::Interaction), Some(1));
    }

    #[test]
    fn restack_orders_by_index() {
        let config = LayoutConfig::default();
        let mut lanes = lanes_from(&[
            SwimlaneProps { index: 200, label: "Events".into(), namespace: None },
            SwimlaneProps { index: 0, label: "UI/Automation".into(), namespace: None },
        ]);
        for lane in lanes.values_mut() {
            grow_swimlane(lane, 100.0, Dimension { width: 100.0, height: 100.0 }, &config);
        }
        restack_swimlanes(&mut lanes, config.swimlane_gap);
        assert_eq!(lanes[&0].y, 0.0);
        assert_eq!(lanes[&0].height, 130.0);
        assert_eq!(lanes[&200].y, 140.0);
    }

    #[test]
    fn grow_never_shrinks() {
        let config = LayoutConfig::default();
        let props = SwimlaneProps { index: 0, label: "x".into(), namespace: None };
        let mut lane = new_swimlane(&props, &config);
        grow_swimlane(&mut lane, 500.0, Dimension { width: 100.0, height: 300.0 }, &config);
        grow_swimlane(&mut lane, 400.0, Dimension { width: 100.0, height: 100.0 }, &config);
        assert_eq!(lane.r, 500.0);
        assert_eq!(lane.max_height, 300.0);
        assert_eq!(lane.height, 330.0);
    }
}
