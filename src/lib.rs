//! bigrig
//!
//! Turns an analyzed browser performance trace into a structured,
//! human-readable metrics report, and models allocator memory dumps
//! to validate and roll up their sizes.
//!
//! This crate provides the core implementation for the `bigrig` CLI.
//!
//! ## Getting Started
//!
//! ```bash
//! bigrig report --file results.json --pretty-print
//! bigrig report --file results.json --memory dumps.json --pretty-print
//! ```

pub mod commands;
pub mod memory;
pub mod report;
pub mod units;
pub mod utils;
