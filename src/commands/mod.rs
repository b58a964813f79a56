//! CLI command implementations.
//!
//! Commands orchestrate the library components to perform user tasks.

pub mod report;
pub mod utils;

// Re-export main command functions
pub use report::{build_report, execute_report, validate_args, ReportArgs, ReportOutput};
pub use utils::display_version;
