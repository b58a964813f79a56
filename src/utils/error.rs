//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Structural errors raised while building an allocator dump graph
///
/// Each one aborts a single insertion. The caller decides whether the
/// whole run stops or the offending record is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DumpGraphError {
    #[error("Duplicate allocator dump name: '{full_name}' in {container}")]
    DuplicateName { container: String, full_name: String },

    #[error("Duplicate attribute name: {name} (dump {dump})")]
    DuplicateAttribute { dump: String, name: String },

    #[error("Allocator dump {dump} already owns {current_target}")]
    OwnershipConflict { dump: String, current_target: String },

    #[error("Invalid allocator dump name: '{0}'")]
    InvalidName(String),

    #[error("Unknown allocator dump id: {0}")]
    UnknownDump(usize),

    #[error("Unknown container id: {0}")]
    UnknownContainer(usize),

    #[error("No allocator dump named '{full_name}' in {container}")]
    UnknownDumpName { container: String, full_name: String },
}

/// Errors that can occur while parsing input documents
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid input format: {0}")]
    InvalidFormat(String),
}

/// Errors that can occur while loading render configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}
