use crate::config::{LayoutConfig, RenderConfig};
use crate::layout::{FrameBox, LayoutContext, Relation, Swimlane};
use crate::theme::Theme;
use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

const ARROWHEAD_ID: &str = "arrowhead";

pub fn render_svg(
    layout: &LayoutContext,
    theme: &Theme,
    config: &LayoutConfig,
    render: &RenderConfig,
) -> String {
    let width = layout.canvas_width(config);
    let height = layout.canvas_height(config);
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xhtml=\"http://www.w3.org/1999/xhtml\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" class=\"event-model\">",
    ));
    svg.push_str(&style_block(theme));
    if !is_transparent(&render.background) {
        svg.push_str(&format!(
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            escape_xml(&render.background)
        ));
    }

    for lane in &layout.sorted_swimlanes {
        svg.push_str(&swimlane_svg(lane, width, theme, config));
    }
    for frame_box in &layout.boxes {
        svg.push_str(&box_svg(layout, frame_box, theme, config, render));
    }
    for relation in &layout.relations {
        if let Some(path) = relation_svg(layout, relation, config) {
            svg.push_str(&path);
        }
    }

    svg.push_str(&format!(
        "<defs><marker id=\"{ARROWHEAD_ID}\" markerWidth=\"10\" markerHeight=\"7\" refX=\"10\" refY=\"3.5\" orient=\"auto\"><polygon points=\"0 0, 10 3.5, 0 7\" fill=\"{}\"/></marker></defs>",
        theme.arrowhead_color
    ));
    svg.push_str("</svg>");
    svg
}

fn style_block(theme: &Theme) -> String {
    let font_family = escape_xml(&theme.font_family);
    format!(
        "<style>.event-model{{font-family:{font_family};font-size:{size}px;fill:{color};}}.event-model p{{margin:0;}}.event-model pre{{margin:0;font-family:monospace;}}.event-model .em-swimlane text{{font-weight:bold;}}</style>",
        size = theme.font_size,
        color = theme.text_color,
    )
}

fn is_transparent(color: &str) -> bool {
    let color = color.trim();
    color.is_empty() || color.eq_ignore_ascii_case("none") || color.eq_ignore_ascii_case("transparent")
}

fn swimlane_svg(lane: &Swimlane, width: f32, theme: &Theme, config: &LayoutConfig) -> String {
    format!(
        "<g class=\"em-swimlane\"><rect x=\"0\" y=\"{y:.2}\" rx=\"3\" width=\"{width:.2}\" height=\"{height:.2}\" fill=\"{fill}\" stroke=\"{stroke}\"/><text font-weight=\"bold\" x=\"{label_x:.2}\" y=\"{label_y:.2}\">{label}</text></g>",
        y = lane.y,
        height = lane.height,
        fill = theme.swimlane_fill,
        stroke = theme.swimlane_stroke,
        label_x = config.swimlane_label_x,
        label_y = lane.y + config.swimlane_label_y,
        label = escape_xml(&lane.label),
    )
}

fn box_svg(
    layout: &LayoutContext,
    frame_box: &FrameBox,
    theme: &Theme,
    config: &LayoutConfig,
    render: &RenderConfig,
) -> String {
    let y = layout.box_top(frame_box, config);
    let mut out = String::from("<g class=\"em-box\">");
    let _ = write!(
        out,
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" rx=\"{rx}\" width=\"{w:.2}\" height=\"{h:.2}\" stroke=\"{stroke}\" fill=\"{fill}\"/>",
        x = frame_box.x,
        rx = config.box_corner_radius,
        w = frame_box.dimension.width,
        h = frame_box.dimension.height,
        stroke = escape_xml(&frame_box.visual.stroke),
        fill = escape_xml(&frame_box.visual.fill),
    );

    let inner_x = frame_box.x + config.box_padding;
    let inner_y = y + config.box_text_padding;
    let inner_w = (frame_box.dimension.width - 2.0 * config.box_padding).max(0.0);
    let inner_h = (frame_box.dimension.height - 2.0 * config.box_padding).max(0.0);
    if render.html_labels {
        let _ = write!(
            out,
            "<foreignObject x=\"{inner_x:.2}\" y=\"{inner_y:.2}\" width=\"{inner_w:.2}\" height=\"{inner_h:.2}\"><xhtml:div style=\"display: table; height: 100%; width: 100%;\"><span style=\"display: table-cell; text-align: center; vertical-align: middle;\">{}</span></xhtml:div></foreignObject>",
            frame_box.text
        );
    } else {
        out.push_str(&native_text_svg(
            frame_box,
            inner_x + inner_w / 2.0,
            inner_y,
            inner_h,
            theme,
        ));
    }
    out.push_str("</g>");
    out
}

/// Box text as plain SVG lines, vertically centered in the inner box.
fn native_text_svg(frame_box: &FrameBox, center_x: f32, top: f32, height: f32, theme: &Theme) -> String {
    let lines: Vec<_> = frame_box
        .text_lines
        .iter()
        .filter(|line| !line.text.trim().is_empty())
        .collect();
    if lines.is_empty() {
        return String::new();
    }
    let line_height = |size: f32| size * 1.2;
    let total: f32 = lines.iter().map(|line| line_height(line.style.font_size)).sum();
    let mut baseline = top + ((height - total) / 2.0).max(0.0);

    let mut text = format!(
        "<text x=\"{center_x:.2}\" text-anchor=\"middle\" xml:space=\"preserve\" fill=\"{}\">",
        theme.text_color
    );
    for line in lines {
        baseline += line.style.font_size;
        let _ = write!(
            text,
            "<tspan x=\"{center_x:.2}\" y=\"{baseline:.2}\" font-family=\"{family}\" font-size=\"{size}\" font-weight=\"{weight}\">{content}</tspan>",
            family = escape_xml(&line.style.font_family),
            size = line.style.font_size,
            weight = line.style.weight(),
            content = escape_xml(&line.text),
        );
        baseline += line_height(line.style.font_size) - line.style.font_size;
    }
    text.push_str("</text>");
    text
}

/// Straight arrow from the right third of the source box to the left third
/// of the target box. Upward arrows leave the source's top edge and enter the
/// target's bottom edge; downward arrows do the opposite.
fn relation_svg(layout: &LayoutContext, relation: &Relation, config: &LayoutConfig) -> Option<String> {
    let source = layout.boxes.get(relation.source_box)?;
    let target = layout.boxes.get(relation.target_box)?;
    let source_top = layout.box_top(source, config);
    let target_top = layout.box_top(target, config);

    let source_x = source.x + source.dimension.width * 2.0 / 3.0;
    let target_x = target.x + target.dimension.width / 3.0;
    let (source_y, target_y) = if source_top > target_top {
        (source_top, target_top + target.dimension.height)
    } else {
        (source_top + source.dimension.height, target_top)
    };

    Some(format!(
        "<path class=\"em-relation\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"1\" marker-end=\"url(#{ARROWHEAD_ID})\" d=\"M{source_x:.2} {source_y:.2} L{target_x:.2} {target_y:.2}\"/>",
        fill = escape_xml(&relation.visual.fill),
        stroke = escape_xml(&relation.visual.stroke),
    ))
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

/// Rasterize an SVG produced with `html_labels` off.
#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .map(|family| family.trim().trim_matches(['"', '\'']).to_string())
        .unwrap_or_else(|| "sans-serif".to_string());
    opt.fontdb_mut().load_system_fonts();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    tracing::info!(path = %output.display(), width = size.width(), height = size.height(), "wrote png");
    Ok(())
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{EventModel, Frame, ModelEntityType};
    use crate::layout::compute_layout;
    use crate::text_metrics::FixedMetrics;

    fn render(frames: Vec<Frame>, render: &RenderConfig) -> (LayoutContext, String) {
        let model = EventModel {
            frames,
            data_entities: Vec::new(),
        };
        let theme = Theme::default();
        let config = LayoutConfig::default();
        let layout = compute_layout(&model, &theme, &config, &FixedMetrics).expect("layout");
        let svg = render_svg(&layout, &theme, &config, render);
        (layout, svg)
    }

    #[test]
    fn renders_lanes_boxes_and_arrows() {
        let (layout, svg) = render(
            vec![
                Frame::new("01", ModelEntityType::Command, "AddItem"),
                Frame::new("02", ModelEntityType::Event, "ItemAdded"),
            ],
            &RenderConfig::default(),
        );
        let config = LayoutConfig::default();
        let width = layout.canvas_width(&config);
        let height = layout.canvas_height(&config);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(&format!("viewBox=\"0 0 {width} {height}\"")));
        assert_eq!(svg.matches("class=\"em-swimlane\"").count(), 2);
        assert_eq!(svg.matches("class=\"em-box\"").count(), 2);
        assert_eq!(svg.matches("class=\"em-relation\"").count(), 1);
        assert_eq!(svg.matches("<marker id=\"arrowhead\"").count(), 1);
        assert!(svg.contains("marker-end=\"url(#arrowhead)\""));
        assert!(svg.contains("Command/Read Model"));
        assert!(svg.contains("<b>ItemAdded</b>"));
        assert!(svg.contains("<foreignObject"));
        assert!(svg.contains("pre{margin:0;"));
    }

    #[test]
    fn downward_relation_leaves_source_bottom() {
        let (layout, svg) = render(
            vec![
                Frame::new("01", ModelEntityType::Command, "Add"),
                Frame::new("02", ModelEntityType::Event, "Added"),
            ],
            &RenderConfig::default(),
        );
        let config = LayoutConfig::default();
        let source = &layout.boxes[0];
        let target = &layout.boxes[1];
        let sx = source.x + source.dimension.width * 2.0 / 3.0;
        let sy = layout.box_top(source, &config) + source.dimension.height;
        let tx = target.x + target.dimension.width / 3.0;
        let ty = layout.box_top(target, &config);
        assert!(svg.contains(&format!("d=\"M{sx:.2} {sy:.2} L{tx:.2} {ty:.2}\"")));
    }

    #[test]
    fn upward_relation_enters_target_bottom() {
        let (layout, svg) = render(
            vec![
                Frame::new("01", ModelEntityType::Event, "Added"),
                Frame::new("02", ModelEntityType::ReadModel, "Cart"),
            ],
            &RenderConfig::default(),
        );
        let config = LayoutConfig::default();
        let source = &layout.boxes[0];
        let target = &layout.boxes[1];
        let sy = layout.box_top(source, &config);
        let ty = layout.box_top(target, &config) + target.dimension.height;
        assert!(svg.contains(&format!(" {sy:.2} L")));
        assert!(svg.contains(&format!(" {ty:.2}\"/>")));
    }

    #[test]
    fn native_text_when_html_labels_off() {
        let render_cfg = RenderConfig {
            html_labels: false,
            ..RenderConfig::default()
        };
        let (_, svg) = render(
            vec![Frame::new("01", ModelEntityType::Screen, "Cart & <Checkout>")],
            &render_cfg,
        );
        assert!(!svg.contains("<foreignObject"));
        assert!(svg.contains("<tspan"));
        assert!(svg.contains("Cart &amp; &lt;Checkout&gt;"));
    }

    #[test]
    fn empty_layout_renders_minimum_canvas() {
        let (_, svg) = render(Vec::new(), &RenderConfig::default());
        let config = LayoutConfig::default();
        assert!(svg.contains(&format!(
            "width=\"{}\" height=\"{}\"",
            config.min_canvas_width(),
            config.min_canvas_height()
        )));
        assert!(!svg.contains("em-box"));
    }
}
