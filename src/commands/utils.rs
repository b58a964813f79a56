use crate::utils::config::EXCLUDED_METRIC_KEYS;

/// Display version information
pub fn display_version() {
    println!("bigrig v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Structured metrics reports for browser performance traces.");
    println!("Raw-printed metric keys: {}", EXCLUDED_METRIC_KEYS.join(", "));
}
