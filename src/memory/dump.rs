//! Allocator dump graph.
//!
//! Dumps live in an arena owned by `MemoryDumpGraph`. Parent, child,
//! container and edge references are plain handles into that arena.
//!
//! Containment follows the `/`-separated `fullName`: adding `a/b/c`
//! links it under `a/b`, creating missing ancestors as implicit dumps.
//! A parent is always a strict path prefix, so the parent chain cannot
//! cycle.
//!
//! Each dump stores only its last path segment and the index is keyed by
//! `(container, parent, segment)`. Full names are rebuilt on demand, so
//! memory stays linear in the number of dumps however deep the paths go.

use super::attribute::Attribute;
use crate::utils::error::DumpGraphError;
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Handle to an allocator dump inside one `MemoryDumpGraph`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DumpId(pub(crate) usize);

/// Handle to a container inside one `MemoryDumpGraph`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub(crate) usize);

/// Directed edge between two dumps (ownership or retention)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpLink {
    pub source: DumpId,
    pub target: DumpId,
    pub importance: Option<i32>,
}

/// A memory snapshot scope (one process, or the global space)
#[derive(Debug, Clone)]
pub struct ContainerDump {
    name: String,
    roots: Vec<DumpId>,
}

impl ContainerDump {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Top-level dumps, in discovery order
    pub fn roots(&self) -> &[DumpId] {
        &self.roots
    }
}

/// A named node accounting for a region of memory
#[derive(Debug, Clone)]
pub struct AllocatorDump {
    name: String,
    container: ContainerId,
    parent: Option<DumpId>,
    children: Vec<DumpId>,
    pub(crate) attributes: BTreeMap<String, Attribute>,
    owns: Option<DumpLink>,
    owned_by: Vec<DumpLink>,
    retains: Vec<DumpLink>,
    retained_by: Vec<DumpLink>,
    guid: Option<String>,
    implicit: bool,
}

impl AllocatorDump {
    /// Last path segment of the full name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container(&self) -> ContainerId {
        self.container
    }

    pub fn parent(&self) -> Option<DumpId> {
        self.parent
    }

    pub fn children(&self) -> &[DumpId] {
        &self.children
    }

    pub fn attributes(&self) -> &BTreeMap<String, Attribute> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn owns(&self) -> Option<&DumpLink> {
        self.owns.as_ref()
    }

    pub fn owned_by(&self) -> &[DumpLink] {
        &self.owned_by
    }

    pub fn retains(&self) -> &[DumpLink] {
        &self.retains
    }

    pub fn retained_by(&self) -> &[DumpLink] {
        &self.retained_by
    }

    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    /// True when the dump only exists because a descendant named it
    pub fn is_implicit(&self) -> bool {
        self.implicit
    }
}

/// Arena of containers and allocator dumps
///
/// **Public** - built by the snapshot loader, read by aggregation and
/// the size summary
#[derive(Debug, Clone, Default)]
pub struct MemoryDumpGraph {
    containers: Vec<ContainerDump>,
    dumps: Vec<AllocatorDump>,
    index: HashMap<(ContainerId, Option<DumpId>, String), DumpId>,
}

impl MemoryDumpGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new container
    pub fn add_container(&mut self, name: impl Into<String>) -> ContainerId {
        let id = ContainerId(self.containers.len());
        self.containers.push(ContainerDump {
            name: name.into(),
            roots: Vec::new(),
        });
        id
    }

    pub fn find_container(&self, name: &str) -> Option<ContainerId> {
        self.containers
            .iter()
            .position(|c| c.name == name)
            .map(ContainerId)
    }

    pub fn container(&self, id: ContainerId) -> Option<&ContainerDump> {
        self.containers.get(id.0)
    }

    /// All containers with their handles, in creation order
    pub fn containers(&self) -> impl Iterator<Item = (ContainerId, &ContainerDump)> {
        self.containers
            .iter()
            .enumerate()
            .map(|(i, c)| (ContainerId(i), c))
    }

    pub fn roots(&self, container: ContainerId) -> &[DumpId] {
        self.containers
            .get(container.0)
            .map(|c| c.roots.as_slice())
            .unwrap_or(&[])
    }

    pub fn dump(&self, id: DumpId) -> Option<&AllocatorDump> {
        self.dumps.get(id.0)
    }

    pub fn find_dump(&self, container: ContainerId, full_name: &str) -> Option<DumpId> {
        let mut current = None;
        for segment in full_name.split('/') {
            current = Some(self.find_child(container, current, segment)?);
        }
        current
    }

    /// Slash-joined path from the container root down to `dump`
    pub fn full_name(&self, dump: DumpId) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = Some(dump);
        while let Some(id) = current {
            let d = self.dumps.get(id.0)?;
            segments.push(d.name.as_str());
            current = d.parent;
        }
        segments.reverse();
        Some(segments.join("/"))
    }

    fn find_child(
        &self,
        container: ContainerId,
        parent: Option<DumpId>,
        segment: &str,
    ) -> Option<DumpId> {
        self.index
            .get(&(container, parent, segment.to_string()))
            .copied()
    }

    /// Number of dumps, implicit ones included
    pub fn len(&self) -> usize {
        self.dumps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dumps.is_empty()
    }

    /// Add a dump named `full_name` under `container`
    ///
    /// **Public** - main entry point for graph construction
    ///
    /// Missing ancestors are created as implicit dumps. Adding the name
    /// of an implicit dump claims it instead of creating a new one.
    ///
    /// # Errors
    /// * `DumpGraphError::DuplicateName` - `full_name` was already added to `container`
    /// * `DumpGraphError::InvalidName` - empty name or empty path segment
    /// * `DumpGraphError::UnknownContainer` - `container` is not from this graph
    pub fn add_dump(
        &mut self,
        container: ContainerId,
        full_name: &str,
        guid: Option<&str>,
    ) -> Result<DumpId, DumpGraphError> {
        if container.0 >= self.containers.len() {
            return Err(DumpGraphError::UnknownContainer(container.0));
        }
        if full_name.is_empty() || full_name.split('/').any(str::is_empty) {
            return Err(DumpGraphError::InvalidName(full_name.to_string()));
        }

        let mut segments: Vec<&str> = full_name.split('/').collect();
        let leaf = segments.pop().unwrap_or(full_name);

        // Shallowest first, so every ancestor's parent is already resolved
        let mut parent = None;
        for segment in segments {
            parent = Some(match self.find_child(container, parent, segment) {
                Some(existing) => existing,
                None => self.insert_dump(container, parent, segment, None, true),
            });
        }

        if let Some(existing) = self.find_child(container, parent, leaf) {
            let dump = &mut self.dumps[existing.0];
            if !dump.implicit {
                return Err(DumpGraphError::DuplicateName {
                    container: self.containers[container.0].name.clone(),
                    full_name: full_name.to_string(),
                });
            }
            dump.implicit = false;
            dump.guid = guid.map(str::to_string);
            debug!(
                "Claimed implicit allocator dump '{}' in {}",
                full_name, self.containers[container.0].name
            );
            return Ok(existing);
        }

        let id = self.insert_dump(container, parent, leaf, guid.map(str::to_string), false);
        debug!(
            "Added allocator dump '{}' in {}",
            full_name, self.containers[container.0].name
        );
        Ok(id)
    }

    /// Create one dump under an already resolved parent
    fn insert_dump(
        &mut self,
        container: ContainerId,
        parent: Option<DumpId>,
        name: &str,
        guid: Option<String>,
        implicit: bool,
    ) -> DumpId {
        let id = DumpId(self.dumps.len());
        self.dumps.push(AllocatorDump {
            name: name.to_string(),
            container,
            parent,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            owns: None,
            owned_by: Vec::new(),
            retains: Vec::new(),
            retained_by: Vec::new(),
            guid,
            implicit,
        });
        self.index.insert((container, parent, name.to_string()), id);

        match parent {
            Some(parent) => self.dumps[parent.0].children.push(id),
            None => self.containers[container.0].roots.push(id),
        }

        id
    }

    /// Record that `dump`'s memory is attributed to `target`
    ///
    /// # Errors
    /// * `DumpGraphError::OwnershipConflict` - `dump` already owns something;
    ///   the graph is left unchanged
    /// * `DumpGraphError::UnknownDump` - either handle is not from this graph
    pub fn set_owner(
        &mut self,
        dump: DumpId,
        target: DumpId,
        importance: Option<i32>,
    ) -> Result<(), DumpGraphError> {
        self.check(dump)?;
        self.check(target)?;

        if let Some(current) = self.dumps[dump.0].owns {
            return Err(DumpGraphError::OwnershipConflict {
                dump: self.quantified_name(dump),
                current_target: self.quantified_name(current.target),
            });
        }

        let link = DumpLink {
            source: dump,
            target,
            importance,
        };
        self.dumps[dump.0].owns = Some(link);
        self.dumps[target.0].owned_by.push(link);
        Ok(())
    }

    /// Record that `dump` is kept alive by `target`
    ///
    /// Repeated edges between the same pair are allowed.
    pub fn add_retention(
        &mut self,
        dump: DumpId,
        target: DumpId,
        importance: Option<i32>,
    ) -> Result<(), DumpGraphError> {
        self.check(dump)?;
        self.check(target)?;

        let link = DumpLink {
            source: dump,
            target,
            importance,
        };
        self.dumps[dump.0].retains.push(link);
        self.dumps[target.0].retained_by.push(link);
        Ok(())
    }

    /// True when `dump` is `other` or `other` is one of its ancestors
    pub fn is_descendant_of(&self, dump: DumpId, other: DumpId) -> bool {
        let mut current = Some(dump);
        while let Some(id) = current {
            if id == other {
                return true;
            }
            current = self.dumps.get(id.0).and_then(|d| d.parent);
        }
        false
    }

    /// `'<fullName>' in <container>`, for warning messages
    pub fn quantified_name(&self, dump: DumpId) -> String {
        match (self.dumps.get(dump.0), self.full_name(dump)) {
            (Some(d), Some(full_name)) => {
                format!("'{}' in {}", full_name, self.containers[d.container.0].name)
            }
            _ => format!("<unknown dump {}>", dump.0),
        }
    }

    /// Attach an attribute to a dump
    ///
    /// # Errors
    /// * `DumpGraphError::DuplicateAttribute` - `name` is already set; the
    ///   existing value is kept
    pub fn add_attribute(
        &mut self,
        dump: DumpId,
        name: &str,
        value: Attribute,
    ) -> Result<(), DumpGraphError> {
        self.check(dump)?;

        if self.dumps[dump.0].attributes.contains_key(name) {
            return Err(DumpGraphError::DuplicateAttribute {
                dump: self.quantified_name(dump),
                name: name.to_string(),
            });
        }

        self.dumps[dump.0]
            .attributes
            .insert(name.to_string(), value);
        Ok(())
    }

    pub(crate) fn check(&self, dump: DumpId) -> Result<(), DumpGraphError> {
        if dump.0 < self.dumps.len() {
            Ok(())
        } else {
            Err(DumpGraphError::UnknownDump(dump.0))
        }
    }

    pub(crate) fn dump_mut(&mut self, dump: DumpId) -> &mut AllocatorDump {
        &mut self.dumps[dump.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Unit;

    fn graph_with_process() -> (MemoryDumpGraph, ContainerId) {
        let mut graph = MemoryDumpGraph::new();
        let process = graph.add_container("process 1");
        (graph, process)
    }

    #[test]
    fn test_add_dump_links_parent_by_path() {
        let (mut graph, process) = graph_with_process();
        let malloc = graph.add_dump(process, "malloc", None).unwrap();
        let objects = graph.add_dump(process, "malloc/objects", Some("0x1")).unwrap();

        let dump = graph.dump(objects).unwrap();
        assert_eq!(dump.parent(), Some(malloc));
        assert_eq!(dump.name(), "objects");
        assert_eq!(dump.guid(), Some("0x1"));
        assert_eq!(graph.dump(malloc).unwrap().children(), &[objects]);
        assert_eq!(graph.roots(process), &[malloc]);
    }

    #[test]
    fn test_implicit_ancestor_is_claimed() {
        let (mut graph, process) = graph_with_process();
        let leaf = graph.add_dump(process, "v8/heap/old_space", None).unwrap();
        let heap = graph.find_dump(process, "v8/heap").unwrap();
        assert!(graph.dump(heap).unwrap().is_implicit());
        assert_eq!(graph.len(), 3);

        let claimed = graph.add_dump(process, "v8/heap", Some("0x2")).unwrap();
        assert_eq!(claimed, heap);
        assert!(!graph.dump(heap).unwrap().is_implicit());
        assert!(graph.is_descendant_of(leaf, heap));

        assert!(matches!(
            graph.add_dump(process, "v8/heap", None),
            Err(DumpGraphError::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_names_unique_per_container_only() {
        let mut graph = MemoryDumpGraph::new();
        let p1 = graph.add_container("process 1");
        let p2 = graph.add_container("process 2");

        graph.add_dump(p1, "malloc", None).unwrap();
        assert!(graph.add_dump(p2, "malloc", None).is_ok());
        assert!(graph.add_dump(p1, "malloc", None).is_err());
    }

    #[test]
    fn test_invalid_names() {
        let (mut graph, process) = graph_with_process();
        assert!(matches!(
            graph.add_dump(process, "", None),
            Err(DumpGraphError::InvalidName(_))
        ));
        assert!(matches!(
            graph.add_dump(process, "a//b", None),
            Err(DumpGraphError::InvalidName(_))
        ));
        assert!(matches!(
            graph.add_dump(ContainerId(7), "a", None),
            Err(DumpGraphError::UnknownContainer(7))
        ));
    }

    #[test]
    fn test_ownership_is_bidirectional() {
        let (mut graph, process) = graph_with_process();
        let a = graph.add_dump(process, "a", None).unwrap();
        let b = graph.add_dump(process, "b", None).unwrap();
        let c = graph.add_dump(process, "c", None).unwrap();

        graph.set_owner(a, b, Some(2)).unwrap();
        assert_eq!(graph.dump(a).unwrap().owns().unwrap().target, b);
        assert_eq!(graph.dump(b).unwrap().owned_by()[0].source, a);

        let err = graph.set_owner(a, c, None).unwrap_err();
        assert!(matches!(err, DumpGraphError::OwnershipConflict { .. }));
        assert_eq!(graph.dump(a).unwrap().owns().unwrap().target, b);
        assert!(graph.dump(c).unwrap().owned_by().is_empty());
    }

    #[test]
    fn test_retention_allows_repeats() {
        let (mut graph, process) = graph_with_process();
        let a = graph.add_dump(process, "a", None).unwrap();
        let b = graph.add_dump(process, "b", None).unwrap();

        graph.add_retention(a, b, None).unwrap();
        graph.add_retention(a, b, Some(1)).unwrap();

        assert_eq!(graph.dump(a).unwrap().retains().len(), 2);
        assert_eq!(graph.dump(b).unwrap().retained_by().len(), 2);
        assert!(graph.add_retention(a, DumpId(99), None).is_err());
    }

    #[test]
    fn test_duplicate_attribute_keeps_first() {
        let (mut graph, process) = graph_with_process();
        let a = graph.add_dump(process, "a", None).unwrap();

        graph
            .add_attribute(a, "size", Attribute::scalar(10.0, Unit::SizeInBytes))
            .unwrap();
        let err = graph
            .add_attribute(a, "size", Attribute::scalar(20.0, Unit::SizeInBytes))
            .unwrap_err();

        assert!(matches!(err, DumpGraphError::DuplicateAttribute { .. }));
        assert_eq!(
            graph.dump(a).unwrap().attribute("size"),
            Some(&Attribute::scalar(10.0, Unit::SizeInBytes))
        );
    }

    #[test]
    fn test_quantified_name() {
        let (mut graph, process) = graph_with_process();
        let a = graph.add_dump(process, "malloc/x", None).unwrap();
        assert_eq!(graph.quantified_name(a), "'malloc/x' in process 1");
        assert_eq!(graph.full_name(a).as_deref(), Some("malloc/x"));
        assert_eq!(graph.full_name(DumpId(42)), None);
    }

    #[test]
    fn test_deep_path_builds_without_recursion() {
        let (mut graph, process) = graph_with_process();
        let full_name = vec!["a"; 50_000].join("/");

        let leaf = graph.add_dump(process, &full_name, None).unwrap();
        assert_eq!(graph.len(), 50_000);
        assert_eq!(graph.roots(process).len(), 1);
        assert_eq!(graph.find_dump(process, &full_name), Some(leaf));
        assert!(graph.is_descendant_of(leaf, graph.roots(process)[0]));

        let parent = graph.dump(leaf).unwrap().parent().unwrap();
        assert!(graph.dump(parent).unwrap().is_implicit());
        assert!(!graph.dump(leaf).unwrap().is_implicit());
    }
}
