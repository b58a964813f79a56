//! Configuration and constants for report rendering and memory rollups.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Column at which rendered values start (label plus indent)
pub const DEFAULT_PADDING_DISTANCE: usize = 40;

/// Extra indent applied for each nested document level
pub const DEFAULT_INDENT_STEP: usize = 2;

/// Width the millisecond value is padded to before the per-frame annotation
pub const DEFAULT_PER_FRAME_WIDTH: usize = 12;

/// Written for a document with no entries so it is not mistaken for missing output
pub const EMPTY_DOCUMENT_MARKER: &str = "{}";

/// Shown in a group label when `title` or `type` is missing
pub const FALLBACK_LABEL_TEXT: &str = "undefined";

/// Key the memory size summary is folded under in a metrics document
pub const MEMORY_SUMMARY_KEY: &str = "memory";

// Metric keys that hold rates, counts or absolute timestamps.
// They are printed raw: no "ms" suffix and no per-frame annotation.
pub const EXCLUDED_METRIC_KEYS: &[&str] = &[
    "fps",
    "frameCount",
    "forcedRecalcs",
    "forcedLayouts",
    "start",
    "end",
    "totalDuration",
    "domContentLoaded",
    "loadTime",
    "firstPaint",
];

/// Allocator dump attribute shown in the memory summary
pub const SIZE_ATTRIBUTE_NAME: &str = "size";

/// Layout settings for the pretty-printed report
///
/// Every field falls back to its default when missing from the TOML file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Column at which values start
    pub padding_distance: usize,

    /// Indent added per nesting level
    pub indent_step: usize,

    /// Width of the millisecond value before the per-frame annotation
    pub per_frame_width: usize,

    /// Keys rendered raw (no "ms", no per-frame value)
    pub excluded_keys: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            padding_distance: DEFAULT_PADDING_DISTANCE,
            indent_step: DEFAULT_INDENT_STEP,
            per_frame_width: DEFAULT_PER_FRAME_WIDTH,
            excluded_keys: EXCLUDED_METRIC_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl RenderConfig {
    /// Whether `key` is rendered as a raw number
    pub fn is_excluded(&self, key: &str) -> bool {
        self.excluded_keys.iter().any(|k| k == key)
    }
}

/// Load a render configuration from a TOML file
///
/// # Errors
/// * `ConfigError::IoError` - If file cannot be read
/// * `ConfigError::TomlError` - If TOML is invalid
/// * `ConfigError::InvalidValue` - If the indent step is zero
///
/// # Example
/// ```ignore
/// let config = load_render_config("render.toml")?;
/// ```
pub fn load_render_config(path: impl AsRef<Path>) -> Result<RenderConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: RenderConfig = toml::from_str(&contents)?;

    if config.indent_step == 0 {
        return Err(ConfigError::InvalidValue(
            "indent_step must be at least 1".to_string(),
        ));
    }

    Ok(config)
}
