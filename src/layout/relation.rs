use super::FrameBox;

/// Explicit source: the first box placed before `before` whose frame carries
/// `name`.
pub fn find_source_box<'a>(boxes: &'a [FrameBox], name: &str, before: usize) -> Option<&'a FrameBox> {
    boxes
        .iter()
        .take(before)
        .find(|frame_box| frame_box.frame.name == name)
}

/// Implicit source: walking back from the box just before `before`, the first
/// box that sits in a lane other than `target_swimlane`.
pub fn find_implicit_source(
    boxes: &[FrameBox],
    target_swimlane: u32,
    before: usize,
) -> Option<&FrameBox> {
    boxes
        .iter()
        .take(before)
        .rev()
        .find(|frame_box| frame_box.swimlane != target_swimlane)
}
