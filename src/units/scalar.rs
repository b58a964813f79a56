//! Immutable (value, unit) pairs and their display rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary prefixes used for sizes, smallest first
const BINARY_PREFIXES: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];

/// Unit a scalar value is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Unit {
    /// Absolute point in time, milliseconds since trace start
    #[serde(rename = "tsMs")]
    TimeStampInMs,

    /// Elapsed time in milliseconds
    #[serde(rename = "ms")]
    TimeDurationInMs,

    /// Memory size in bytes
    #[serde(rename = "bytes")]
    SizeInBytes,

    /// Number of occurrences
    #[serde(rename = "count")]
    Count,

    #[serde(rename = "unitless")]
    Unitless,
}

impl Unit {
    /// Short identifier, matches the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::TimeStampInMs => "tsMs",
            Unit::TimeDurationInMs => "ms",
            Unit::SizeInBytes => "bytes",
            Unit::Count => "count",
            Unit::Unitless => "unitless",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric value tagged with its unit
///
/// **Public** - also used as the payload of scalar dump attributes
///
/// Constructed once and never mutated; the value is exposed read-only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarUnit {
    value: f64,
    unit: Unit,
}

impl ScalarUnit {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Time stamp in milliseconds
    pub fn time_stamp(ms: f64) -> Self {
        Self::new(ms, Unit::TimeStampInMs)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Alias of `value()` for time stamps
    pub fn timestamp(&self) -> f64 {
        self.value
    }

    /// Format using the unit's display rule
    pub fn format(&self) -> String {
        format(self.unit, self.value)
    }
}

impl fmt::Display for ScalarUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Format `value` with the display rule registered for `unit`
///
/// **Public** - main entry point for unit formatting
///
/// Deterministic, and the displayed quantity never decreases as
/// `value` grows.
///
/// # Example
/// ```ignore
/// assert_eq!(format(Unit::TimeDurationInMs, 1234.5), "1,234.500 ms");
/// assert_eq!(format(Unit::SizeInBytes, 1536.0), "1.5 KiB");
/// ```
pub fn format(unit: Unit, value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    match unit {
        Unit::TimeStampInMs | Unit::TimeDurationInMs => {
            format!("{} ms", group_thousands(value, 3))
        }
        Unit::SizeInBytes => format_size(value),
        Unit::Count => group_thousands(value.round(), 0),
        Unit::Unitless => format!("{:.3}", value),
    }
}

/// Fixed-precision number with ',' between groups of three digits
fn group_thousands(value: f64, precision: usize) -> String {
    let digits = format!("{:.*}", precision, value.abs());
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits.as_str(), None),
    };

    let mut out = String::with_capacity(digits.len() + int_part.len() / 3 + 1);

    // No "-0.000"
    let is_zero = digits.chars().all(|c| c == '0' || c == '.');
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }

    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }

    out
}

fn format_size(value: f64) -> String {
    let mut scaled = value.abs();
    let mut prefix = 0;

    while scaled >= 1024.0 && prefix < BINARY_PREFIXES.len() - 1 {
        scaled /= 1024.0;
        prefix += 1;
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{:.1} {}", sign, scaled, BINARY_PREFIXES[prefix])
}
