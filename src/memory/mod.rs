//! Allocator dump graph and size aggregation.
//!
//! This module handles:
//! - Building the per-container dump tree with ownership and retention edges
//! - Bottom-up attribute aggregation
//! - Collecting warnings for malformed size data
//! - Loading graphs from snapshots and summarising sizes for reports

pub mod aggregate;
pub mod attribute;
pub mod diagnostics;
pub mod dump;
pub mod snapshot;
pub mod summary;

// Re-export main types
pub use attribute::{Attribute, AttributeKind};
pub use diagnostics::{Diagnostics, ImportWarning, WarningKind};
pub use dump::{AllocatorDump, ContainerDump, ContainerId, DumpId, DumpLink, MemoryDumpGraph};
pub use snapshot::{build_graph, parse_snapshot, DumpSnapshot};
pub use summary::size_summary;
