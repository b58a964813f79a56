//! Metrics report rendering.
//!
//! This module handles:
//! - The metrics document model and key classification
//! - Recursive rendering with per-frame normalization
//! - Terminal colouring of the rendered lines

pub mod document;
pub mod renderer;
pub mod terminal;

// Re-export main types and functions
pub use document::{is_group_key, parse_document, MetricGroupType, MetricsDocument};
pub use renderer::{lines_to_string, render, LabelStyle, MetricsReportRenderer, ReportLine};
pub use terminal::render_terminal_report;
