//! Declarative dump-graph snapshots.
//!
//! A snapshot lists containers, their dumps with attributes, and the
//! ownership/retention edges between dumps. `build_graph` replays it
//! into a `MemoryDumpGraph`.

use super::attribute::Attribute;
use super::dump::{ContainerId, DumpId, MemoryDumpGraph};
use crate::units::Unit;
use crate::utils::error::{DumpGraphError, ParseError};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Top-level snapshot structure read from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DumpSnapshot {
    #[serde(default)]
    pub containers: Vec<ContainerEntry>,

    #[serde(default)]
    pub edges: Vec<EdgeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerEntry {
    pub name: String,

    #[serde(default)]
    pub dumps: Vec<DumpEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpEntry {
    pub full_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,

    #[serde(default)]
    pub attributes: Vec<AttributeEntry>,
}

/// One attribute; a list (not a map) so duplicates are visible
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AttributeEntry {
    Scalar {
        name: String,
        units: Unit,
        value: f64,
    },
    Text {
        name: String,
        value: String,
    },
}

impl AttributeEntry {
    fn into_parts(self) -> (String, Attribute) {
        match self {
            AttributeEntry::Scalar { name, units, value } => (name, Attribute::scalar(value, units)),
            AttributeEntry::Text { name, value } => (name, Attribute::text(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Ownership,
    Retention,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeEntry {
    pub kind: EdgeKind,
    pub source: DumpRef,
    pub target: DumpRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<i32>,
}

/// A dump addressed by container name and full name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpRef {
    pub container: String,
    pub name: String,
}

/// Parse a snapshot from JSON text
pub fn parse_snapshot(raw: &str) -> Result<DumpSnapshot, ParseError> {
    let snapshot: DumpSnapshot = serde_json::from_str(raw)?;
    debug!(
        "Parsed dump snapshot: {} containers, {} edges",
        snapshot.containers.len(),
        snapshot.edges.len()
    );
    Ok(snapshot)
}

/// Replay a snapshot into a new graph
///
/// **Public** - used by the report command
///
/// # Arguments
/// * `snapshot` - Parsed snapshot
/// * `strict` - Fail on the first structural error instead of skipping
///   the offending record
///
/// # Errors
/// In strict mode, the first `DumpGraphError` met (duplicate name,
/// duplicate attribute, ownership conflict, unknown reference).
pub fn build_graph(snapshot: DumpSnapshot, strict: bool) -> Result<MemoryDumpGraph, DumpGraphError> {
    let mut graph = MemoryDumpGraph::new();
    let mut skipped = 0usize;

    let mut record = |result: Result<(), DumpGraphError>| -> Result<(), DumpGraphError> {
        match result {
            Ok(()) => Ok(()),
            Err(e) if strict => Err(e),
            Err(e) => {
                warn!("Skipping snapshot record: {}", e);
                skipped += 1;
                Ok(())
            }
        }
    };

    for container in snapshot.containers {
        let container_id = match graph.find_container(&container.name) {
            Some(id) => id,
            None => graph.add_container(container.name),
        };

        for entry in container.dumps {
            let dump = match graph.add_dump(container_id, &entry.full_name, entry.guid.as_deref()) {
                Ok(dump) => dump,
                Err(e) => {
                    record(Err(e))?;
                    continue;
                }
            };

            for attribute in entry.attributes {
                let (name, value) = attribute.into_parts();
                record(graph.add_attribute(dump, &name, value))?;
            }
        }
    }

    for edge in snapshot.edges {
        let result = resolve(&graph, &edge.source)
            .and_then(|source| resolve(&graph, &edge.target).map(|target| (source, target)))
            .and_then(|(source, target)| match edge.kind {
                EdgeKind::Ownership => graph.set_owner(source, target, edge.importance),
                EdgeKind::Retention => graph.add_retention(source, target, edge.importance),
            });
        record(result)?;
    }

    info!(
        "Built dump graph with {} dumps ({} records skipped)",
        graph.len(),
        skipped
    );

    Ok(graph)
}

fn resolve(graph: &MemoryDumpGraph, dump_ref: &DumpRef) -> Result<DumpId, DumpGraphError> {
    let unknown = || DumpGraphError::UnknownDumpName {
        container: dump_ref.container.clone(),
        full_name: dump_ref.name.clone(),
    };

    let container: ContainerId = graph.find_container(&dump_ref.container).ok_or_else(unknown)?;
    graph.find_dump(container, &dump_ref.name).ok_or_else(unknown)
}
