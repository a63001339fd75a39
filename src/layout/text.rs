use crate::config::{LayoutConfig, TextStyles};
use crate::ir::{DataEntity, Frame};
use crate::text_metrics::{MeasureOptions, TextLine, TextMeasurer, TextStyle};

use super::TextProps;

pub const UNNAMED_LABEL: &str = "<unnamed>";

#[derive(Debug, Clone, PartialEq)]
pub enum ContentFragment {
    Bold(Vec<String>),
    LineBreak,
    Preformatted {
        lines: Vec<String>,
        max_width: Option<f32>,
    },
}

impl ContentFragment {
    fn style<'a>(&self, styles: &'a TextStyles) -> &'a TextStyle {
        match self {
            ContentFragment::Bold(_) => &styles.bold,
            ContentFragment::LineBreak => &styles.line_break,
            ContentFragment::Preformatted { .. } => &styles.code,
        }
    }

    fn lines(&self) -> &[String] {
        match self {
            ContentFragment::Bold(lines) | ContentFragment::Preformatted { lines, .. } => lines,
            ContentFragment::LineBreak => &[],
        }
    }
}

pub fn build_content(
    frame: &Frame,
    data_entities: &[DataEntity],
    config: &LayoutConfig,
) -> Vec<ContentFragment> {
    let label = frame.short_name().unwrap_or(UNNAMED_LABEL);
    let mut content = vec![ContentFragment::Bold(vec![label.to_string()])];

    if let Some(inline) = frame.data_inline_value.as_deref() {
        let stripped = strip_inline_value(inline);
        if !stripped.trim().is_empty() {
            content.push(ContentFragment::LineBreak);
            content.push(ContentFragment::Preformatted {
                lines: vec![stripped],
                max_width: None,
            });
        }
    }

    if let Some(reference) = frame.data_reference.as_deref() {
        match data_entities.iter().find(|entity| entity.name == reference) {
            Some(entity) => {
                let lines = strip_block_value(&entity.data_block_value);
                if !lines.is_empty() {
                    content.push(ContentFragment::LineBreak);
                    content.push(ContentFragment::Preformatted {
                        lines,
                        max_width: Some(config.text_max_width),
                    });
                }
            }
            None => tracing::debug!(
                frame = %frame.name,
                reference,
                "data reference does not name a known data entity"
            ),
        }
    }

    content
}

/// Content between the first `{` and the last `}`. A format tag in front of
/// the brace is dropped with it. Values without braces are kept whole.
pub fn strip_inline_value(value: &str) -> String {
    let Some(open) = value.find('{') else {
        return value.trim().to_string();
    };
    let inner = &value[open + 1..];
    let inner = match inner.rfind('}') {
        Some(close) => &inner[..close],
        None => inner,
    };
    inner.trim().to_string()
}

/// Lines of a multi-line data block: everything after the opening `{` line
/// and before the closing `}`. Surrounding blank lines are dropped.
pub fn strip_block_value(value: &str) -> Vec<String> {
    let body = match value.find('{') {
        Some(open) => {
            let rest = &value[open + 1..];
            match rest.find('\n') {
                Some(newline) if rest[..newline].trim().is_empty() => &rest[newline + 1..],
                _ => rest,
            }
        }
        None => value,
    };
    let body = match body.rfind('}') {
        Some(close) => &body[..close],
        None => body,
    };

    let mut lines: Vec<String> = body
        .lines()
        .map(|line| line.trim_end().to_string())
        .collect();
    while lines.first().is_some_and(|line| line.trim().is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    lines
}

pub fn content_lines(content: &[ContentFragment], styles: &TextStyles) -> Vec<TextLine> {
    content
        .iter()
        .flat_map(|fragment| {
            let style = fragment.style(styles);
            let max_width = match fragment {
                ContentFragment::Preformatted { max_width, .. } => *max_width,
                _ => None,
            };
            fragment.lines().iter().map(move |line| TextLine {
                text: line.clone(),
                style: style.clone(),
                max_width,
            })
        })
        .collect()
}

pub fn content_markup(content: &[ContentFragment]) -> String {
    content
        .iter()
        .flat_map(fragment_markup)
        .collect::<Vec<_>>()
        .join("\n")
}

fn fragment_markup(fragment: &ContentFragment) -> Vec<String> {
    match fragment {
        ContentFragment::Bold(lines) => wrap_in_tag("<b>", "</b>", lines),
        ContentFragment::LineBreak => vec!["<br/>".to_string()],
        ContentFragment::Preformatted { lines, max_width } => {
            let open = match max_width {
                Some(width) => format!("<pre style=\"text-align: left; max-width: {width}px\">"),
                None => "<pre style=\"text-align: left;\">".to_string(),
            };
            wrap_in_tag(&open, "</pre>", lines)
        }
    }
}

fn wrap_in_tag(open: &str, close: &str, lines: &[String]) -> Vec<String> {
    let count = lines.len();
    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let mut out = String::new();
            if idx == 0 {
                out.push_str(open);
            }
            out.push_str(&escape_markup(line));
            if idx + 1 == count {
                out.push_str(close);
            }
            out
        })
        .collect()
}

pub(crate) fn escape_markup(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn calculate_text_props(
    frame: &Frame,
    data_entities: &[DataEntity],
    config: &LayoutConfig,
    measurer: &dyn TextMeasurer,
) -> TextProps {
    let content = build_content(frame, data_entities, config);
    let lines = content_lines(&content, &config.text);
    let options = MeasureOptions {
        max_width: config.measure_max_width,
        line_gap: config.line_gap,
        width_ratio: config.text_width_ratio,
    };
    let size = measurer.measure(&lines, &options);
    let props = TextProps {
        content: content_markup(&content),
        lines,
        width: size.width,
        height: size.height,
    };
    tracing::debug!(
        frame = %frame.name,
        identifier = %frame.entity_identifier,
        width = props.width,
        height = props.height,
        "measured frame text"
    );
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ModelEntityType;
    use crate::text_metrics::FixedMetrics;

    #[test]
    fn strip_inline_value_drops_braces_and_tag() {
        assert_eq!(strip_inline_value("{ a: b }"), "a: b");
        assert_eq!(strip_inline_value("`jsobj`{ a: { c: d } }"), "a: { c: d }");
        assert_eq!(strip_inline_value("plain"), "plain");
    }

    #[test]
    fn strip_block_value_splits_lines() {
        let lines = strip_block_value("{\n  a: 'abc'\n  b: 1\n}");
        assert_eq!(lines, vec!["  a: 'abc'".to_string(), "  b: 1".to_string()]);
        let tagged = strip_block_value("`jsobj` {\n  { a: b }\n}");
        assert_eq!(tagged, vec!["  { a: b }".to_string()]);
    }

    #[test]
    fn label_drops_namespace_or_falls_back() {
        let config = LayoutConfig::default();
        let frame = Frame::new("01", ModelEntityType::Event, "Cart.ItemAdded");
        let content = build_content(&frame, &[], &config);
        assert_eq!(content, vec![ContentFragment::Bold(vec!["ItemAdded".to_string()])]);

        let unnamed = Frame::new("02", ModelEntityType::Event, "Cart.");
        let content = build_content(&unnamed, &[], &config);
        assert_eq!(content, vec![ContentFragment::Bold(vec![UNNAMED_LABEL.to_string()])]);
    }

    #[test]
    fn inline_and_linked_content_become_preformatted_blocks() {
        let config = LayoutConfig::default();
        let entities = vec![DataEntity::new("Items", "{\n  id: 1\n  qty: 2\n}")];
        let frame = Frame::new("03", ModelEntityType::ReadModel, "CartItems")
            .with_inline_value("{ a: true }")
            .with_data_reference("Items");
        let content = build_content(&frame, &entities, &config);
        assert_eq!(content.len(), 5);
        assert_eq!(
            content[4],
            ContentFragment::Preformatted {
                lines: vec!["  id: 1".to_string(), "  qty: 2".to_string()],
                max_width: Some(430.0),
            }
        );

        let markup = content_markup(&content);
        assert!(markup.starts_with("<b>CartItems</b>\n<br/>\n<pre style=\"text-align: left;\">a: true</pre>"));
        assert!(markup.ends_with("<pre style=\"text-align: left; max-width: 430px\">  id: 1\n  qty: 2</pre>"));
    }

    #[test]
    fn unknown_data_reference_adds_nothing() {
        let config = LayoutConfig::default();
        let frame = Frame::new("04", ModelEntityType::ReadModel, "X").with_data_reference("Nope");
        assert_eq!(build_content(&frame, &[], &config).len(), 1);
    }

    #[test]
    fn markup_is_escaped() {
        let content = vec![ContentFragment::Preformatted {
            lines: vec!["a < b && c".to_string()],
            max_width: None,
        }];
        assert!(content_markup(&content).contains("a &lt; b &amp;&amp; c"));
    }

    #[test]
    fn text_props_grow_with_content() {
        let config = LayoutConfig::default();
        let bare = Frame::new("01", ModelEntityType::Event, "Start");
        let rich = bare.clone().with_inline_value("{ line one }");
        let small = calculate_text_props(&bare, &[], &config, &FixedMetrics);
        let large = calculate_text_props(&rich, &[], &config, &FixedMetrics);
        assert!(small.height > 0.0);
        assert!(large.height > small.height);
        assert_eq!(small.lines.len(), 1);
        assert_eq!(large.lines.len(), 2);
    }
}
