//! Collected import warnings.
//!
//! Warnings describe malformed size data found while aggregating or
//! reading dumps. They never abort anything; they are gathered here and
//! reported once the output has been written.

use log::debug;
use serde::Serialize;
use std::fmt;

/// Category of an import warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A size attribute exists but is not scalar
    MemoryDumpParseError,

    /// Child attributes could not be combined
    AttributeParseError,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::MemoryDumpParseError => f.write_str("memory_dump_parse_error"),
            WarningKind::AttributeParseError => f.write_str("attribute_parse_error"),
        }
    }
}

/// One structured warning record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportWarning {
    pub kind: WarningKind,
    pub message: String,
}

/// Sink for import warnings
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    warnings: Vec<ImportWarning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning
    pub fn report(&mut self, kind: WarningKind, message: impl Into<String>) {
        let message = message.into();
        debug!("Recorded {}: {}", kind, message);
        self.warnings.push(ImportWarning { kind, message });
    }

    pub fn warnings(&self) -> &[ImportWarning] {
        &self.warnings
    }

    pub fn count_of(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}
