//! Attribute values attached to allocator dumps.

use crate::units::{ScalarUnit, Unit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value stored under a name on an allocator dump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Attribute {
    /// Numeric, unit-bearing value (sizes, counts)
    Scalar(ScalarUnit),

    /// Opaque text; never aggregated
    Text { value: String },
}

impl Attribute {
    pub fn scalar(value: f64, unit: Unit) -> Self {
        Attribute::Scalar(ScalarUnit::new(value, unit))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Attribute::Text {
            value: value.into(),
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarUnit> {
        match self {
            Attribute::Scalar(scalar) => Some(scalar),
            Attribute::Text { .. } => None,
        }
    }

    /// Kind name used in diagnostic messages
    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::Scalar(_) => AttributeKind::Scalar,
            Attribute::Text { .. } => AttributeKind::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Scalar,
    Text,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Scalar => f.write_str("scalar"),
            AttributeKind::Text => f.write_str("text"),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Scalar(scalar) => write!(f, "{}", scalar),
            Attribute::Text { value } => f.write_str(value),
        }
    }
}
