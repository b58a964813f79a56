//! Metrics document model.
//!
//! A metrics document is an ordered JSON object. Entries whose key is a
//! small non-negative integer string are top-level metric groups and
//! carry `title` and `type`; everything else is a leaf metric or a
//! nested sub-document.

use crate::utils::error::ParseError;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Ordered mapping from metric key to value
pub type MetricsDocument = Map<String, Value>;

/// Structural key naming a group's label
pub const TITLE_KEY: &str = "title";

/// Structural key naming a group's type
pub const TYPE_KEY: &str = "type";

/// Frame count an ANIMATION group normalizes its subtree by
pub const FRAME_COUNT_KEY: &str = "frameCount";

/// Kind of a top-level metric group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricGroupType {
    Duration,
    Animation,
    Count,
}

impl FromStr for MetricGroupType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DURATION" => Ok(MetricGroupType::Duration),
            "ANIMATION" => Ok(MetricGroupType::Animation),
            "COUNT" => Ok(MetricGroupType::Count),
            other => Err(ParseError::InvalidFormat(format!(
                "Unknown metric group type: {}",
                other
            ))),
        }
    }
}

/// Whether `key` marks a top-level metric group
///
/// True for non-empty keys made only of ASCII digits.
pub fn is_group_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Whether `key` is folded into its group's label rather than rendered
pub fn is_structural_key(key: &str) -> bool {
    key == TITLE_KEY || key == TYPE_KEY
}

/// Frame count declared by an ANIMATION group, if usable
///
/// Only positive, finite numbers count; anything else leaves the
/// ambient frame count in place.
pub fn animation_frame_count(group: &MetricsDocument) -> Option<f64> {
    let group_type = group.get(TYPE_KEY)?.as_str()?.parse::<MetricGroupType>().ok()?;
    if group_type != MetricGroupType::Animation {
        return None;
    }

    group
        .get(FRAME_COUNT_KEY)?
        .as_f64()
        .filter(|frames| frames.is_finite() && *frames > 0.0)
}

/// Parse a metrics document from JSON text
///
/// # Errors
/// * `ParseError::JsonError` - Text is not valid JSON
/// * `ParseError::InvalidFormat` - Top level is not an object
pub fn parse_document(raw: &str) -> Result<MetricsDocument, ParseError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(document) => Ok(document),
        other => Err(ParseError::InvalidFormat(format!(
            "Expected a JSON object at the top level, found {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
