//! Terminal styling for rendered report lines.
//!
//! Group labels are bright magenta, other labels cyan. Colours follow
//! `colored`'s own switches (`NO_COLOR`, `CLICOLOR_FORCE`, non-tty).

use super::renderer::{LabelStyle, ReportLine};
use colored::*;

/// One line with its label coloured by style
pub fn colorize_line(line: &ReportLine) -> String {
    let label = line.padded_label();
    let styled = match line.style() {
        Some(LabelStyle::Group) => label.bright_magenta().to_string(),
        Some(LabelStyle::Default) => label.cyan().to_string(),
        None => label,
    };

    match line.value() {
        Some(value) => format!("{}{}", styled, value),
        None => styled,
    }
}

/// Render the whole report for the terminal
pub fn render_terminal_report(lines: &[ReportLine]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&colorize_line(line));
        out.push('\n');
    }
    out
}
