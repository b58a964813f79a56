//! Recursive rendering of a metrics document into report lines.
//!
//! Rules, per entry in document order:
//! - `title` and `type` are folded into the owning group's label
//!   (`"<title> [<type>]"`) and never rendered on their own
//! - numeric leaves are millisecond durations (`"12.34ms"`), annotated
//!   with a per-frame value when the frame count is not 1, unless the
//!   key is excluded (rates, counts, timestamps), which print raw
//! - nested documents recurse one indent step deeper; an ANIMATION
//!   group's `frameCount` applies to its own subtree only
//! - an empty document still prints `{}`

use super::document::{animation_frame_count, is_group_key, is_structural_key, MetricsDocument, TITLE_KEY, TYPE_KEY};
use crate::utils::config::{RenderConfig, EMPTY_DOCUMENT_MARKER, FALLBACK_LABEL_TEXT};
use log::debug;
use serde_json::Value;
use std::fmt;

/// How a label should be styled on a terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    /// Top-level metric group
    Group,
    Default,
}

#[derive(Debug, Clone, PartialEq)]
enum LineContent {
    Entry {
        label: String,
        style: LabelStyle,
        value: Option<String>,
        width: usize,
    },
    Empty,
}

/// One rendered row of the report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    indent: usize,
    content: LineContent,
}

impl ReportLine {
    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Label text without the trailing colon
    pub fn label(&self) -> Option<&str> {
        match &self.content {
            LineContent::Entry { label, .. } => Some(label),
            LineContent::Empty => None,
        }
    }

    pub fn style(&self) -> Option<LabelStyle> {
        match &self.content {
            LineContent::Entry { style, .. } => Some(*style),
            LineContent::Empty => None,
        }
    }

    /// Formatted value; `None` for a nested-document header or an empty marker
    pub fn value(&self) -> Option<&str> {
        match &self.content {
            LineContent::Entry { value, .. } => value.as_deref(),
            LineContent::Empty => None,
        }
    }

    pub fn is_empty_marker(&self) -> bool {
        self.content == LineContent::Empty
    }

    /// Indent plus `"<label>:"` padded to its column (unpadded on headers)
    pub fn padded_label(&self) -> String {
        let padding = " ".repeat(self.indent);
        match &self.content {
            LineContent::Entry {
                label,
                value: Some(_),
                width,
                ..
            } => format!("{}{:<width$}", padding, format!("{}:", label), width = *width),
            LineContent::Entry { label, .. } => format!("{}{}:", padding, label),
            LineContent::Empty => format!("{}{}", padding, EMPTY_DOCUMENT_MARKER),
        }
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.padded_label())?;
        if let Some(value) = self.value() {
            f.write_str(value)?;
        }
        Ok(())
    }
}

/// Renders metrics documents with a fixed layout configuration
///
/// **Public** - main entry point for report rendering
#[derive(Debug, Clone, Default)]
pub struct MetricsReportRenderer {
    config: RenderConfig,
}

impl MetricsReportRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render at indent 0 with a frame count of 1
    pub fn render(&self, document: &MetricsDocument) -> Vec<ReportLine> {
        self.render_with(document, 0, 1.0)
    }

    /// Render starting from the given indent and ambient frame count
    pub fn render_with(&self, document: &MetricsDocument, indent: usize, frame_count: f64) -> Vec<ReportLine> {
        let mut lines = Vec::new();
        self.render_into(document, indent, frame_count, &mut lines);
        debug!("Rendered {} report lines", lines.len());
        lines
    }

    fn render_into(&self, document: &MetricsDocument, indent: usize, frame_count: f64, lines: &mut Vec<ReportLine>) {
        if document.is_empty() {
            lines.push(ReportLine {
                indent,
                content: LineContent::Empty,
            });
            return;
        }

        let width = self.config.padding_distance.saturating_sub(indent);

        for (key, value) in document {
            if is_structural_key(key) {
                continue;
            }

            let mut entry_frames = frame_count;
            let (label, style) = if is_group_key(key) {
                if let Value::Object(group) = value {
                    if let Some(frames) = animation_frame_count(group) {
                        entry_frames = frames;
                    }
                }
                (group_label(value), LabelStyle::Group)
            } else {
                (key.clone(), LabelStyle::Default)
            };

            let value_text = match value {
                Value::Object(nested) => {
                    lines.push(ReportLine {
                        indent,
                        content: LineContent::Entry {
                            label,
                            style,
                            value: None,
                            width,
                        },
                    });
                    self.render_into(nested, indent + self.config.indent_step, entry_frames, lines);
                    continue;
                }
                Value::Number(number) => match number.as_f64() {
                    Some(n) => self.format_metric(key, n, entry_frames),
                    None => number.to_string(),
                },
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };

            lines.push(ReportLine {
                indent,
                content: LineContent::Entry {
                    label,
                    style,
                    value: Some(value_text),
                    width,
                },
            });
        }
    }

    /// Format a numeric leaf as milliseconds, or raw for excluded keys
    fn format_metric(&self, key: &str, value: f64, frame_count: f64) -> String {
        if self.config.is_excluded(key) {
            return raw_number(value);
        }

        let text = format!("{:.2}ms", value);
        if frame_count == 1.0 {
            return text;
        }

        let per_frame = format!("{:.2}ms", value / frame_count);
        format!(
            "{:<width$} ({} per frame)",
            text,
            per_frame,
            width = self.config.per_frame_width
        )
    }
}

/// Render with the default layout
pub fn render(document: &MetricsDocument) -> Vec<ReportLine> {
    MetricsReportRenderer::default().render(document)
}

/// Join rendered lines as plain text, one per line
pub fn lines_to_string(lines: &[ReportLine]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// `"<title> [<type>]"`, with `undefined` for anything missing
fn group_label(group: &Value) -> String {
    let part = |key: &str| match group.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => FALLBACK_LABEL_TEXT.to_string(),
    };

    format!("{} [{}]", part(TITLE_KEY), part(TYPE_KEY))
}

/// Integral values without a fraction, others in shortest form
fn raw_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e21 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> MetricsDocument {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn test_group_label_and_style() {
        let lines = render(&doc(json!({"0": {"title": "Load", "type": "DURATION", "loadTime": 5}})));

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].label(), Some("Load [DURATION]"));
        assert_eq!(lines[0].style(), Some(LabelStyle::Group));
        assert_eq!(lines[0].to_string(), "Load [DURATION]:");
        assert_eq!(lines[1].indent(), 2);
        assert_eq!(lines[1].style(), Some(LabelStyle::Default));
        assert_eq!(lines[1].value(), Some("5"));
    }

    #[test]
    fn test_missing_title_and_type_fall_back() {
        let lines = render(&doc(json!({"3": {"duration": 1}})));
        assert_eq!(lines[0].label(), Some("undefined [undefined]"));

        let lines = render(&doc(json!({"3": 7})));
        assert_eq!(lines[0].label(), Some("undefined [undefined]"));
        assert_eq!(lines[0].value(), Some("7.00ms"));
    }

    #[test]
    fn test_padding() {
        let lines = render(&doc(json!({"paint": 1.5})));
        let text = lines[0].to_string();
        assert!(text.starts_with("paint:"));
        assert_eq!(text.len(), 40 + "1.50ms".len());
        assert!(text.ends_with("1.50ms"));
    }

    #[test]
    fn test_per_frame_annotation_width() {
        let renderer = MetricsReportRenderer::default();
        assert_eq!(
            renderer.format_metric("paint", 10.0, 4.0),
            "10.00ms      (2.50ms per frame)"
        );
        assert_eq!(renderer.format_metric("paint", 10.0, 1.0), "10.00ms");
    }

    #[test]
    fn test_raw_number() {
        assert_eq!(raw_number(60.0), "60");
        assert_eq!(raw_number(59.5), "59.5");
        assert_eq!(raw_number(-0.0), "0");
    }

    #[test]
    fn test_non_numeric_values() {
        let lines = render(&doc(json!({"name": "x", "ok": true, "list": [1, 2], "none": null})));
        let values: Vec<Option<&str>> = lines.iter().map(|l| l.value()).collect();
        assert_eq!(values, vec![Some("x"), Some("true"), Some("[1,2]"), Some("null")]);
    }

    #[test]
    fn test_top_level_empty_document() {
        let lines = render(&MetricsDocument::new());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_empty_marker());
        assert_eq!(lines[0].to_string(), "{}");
    }
}
