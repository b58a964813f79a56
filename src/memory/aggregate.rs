//! Bottom-up attribute aggregation over the containment tree.
//!
//! Children are always aggregated before their parent. For each name
//! that appears on any direct child, the children's values and the
//! parent's own value are combined into the parent's new value. This is
//! the only place an existing attribute may be overwritten.
//!
//! Malformed data never aborts the walk: mismatches are reported to the
//! diagnostics sink and the parent keeps whatever it had.

use super::attribute::{Attribute, AttributeKind};
use super::diagnostics::{Diagnostics, WarningKind};
use super::dump::{DumpId, MemoryDumpGraph};
use crate::units::ScalarUnit;
use crate::utils::error::DumpGraphError;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

impl MemoryDumpGraph {
    /// Aggregate attributes of `dump` and its whole subtree
    ///
    /// **Public** - main entry point for aggregation
    ///
    /// Running it twice on an unchanged tree gives the same attributes.
    ///
    /// # Errors
    /// * `DumpGraphError::UnknownDump` - `dump` is not from this graph
    pub fn aggregate_attributes(
        &mut self,
        dump: DumpId,
        mut diagnostics: Option<&mut Diagnostics>,
    ) -> Result<(), DumpGraphError> {
        self.check(dump)?;
        self.aggregate_subtree(dump, &mut diagnostics);
        Ok(())
    }

    /// Aggregate every root of every container
    pub fn aggregate_all(&mut self, mut diagnostics: Option<&mut Diagnostics>) {
        let roots: Vec<DumpId> = self
            .containers()
            .flat_map(|(_, container)| container.roots().iter().copied())
            .collect();

        debug!("Aggregating attributes from {} root dumps", roots.len());

        for root in roots {
            self.aggregate_subtree(root, &mut diagnostics);
        }
    }

    /// Size attribute `attr_name` of `dump`, if present and scalar
    ///
    /// A present but non-scalar attribute yields `None` and, when a sink
    /// is supplied, exactly one `MemoryDumpParseError` warning.
    pub fn get_valid_size_attribute(
        &self,
        dump: DumpId,
        attr_name: &str,
        diagnostics: Option<&mut Diagnostics>,
    ) -> Option<&ScalarUnit> {
        let attribute = self.dump(dump)?.attribute(attr_name)?;

        match attribute.as_scalar() {
            Some(scalar) => Some(scalar),
            None => {
                if let Some(sink) = diagnostics {
                    sink.report(
                        WarningKind::MemoryDumpParseError,
                        format!(
                            "'{}' attribute of memory allocator dump {} is not a scalar.",
                            attr_name,
                            self.quantified_name(dump)
                        ),
                    );
                }
                None
            }
        }
    }

    fn aggregate_subtree(&mut self, dump: DumpId, diagnostics: &mut Option<&mut Diagnostics>) {
        // Pre-order walk; in reverse, every child comes before its parent
        let mut order = Vec::new();
        let mut stack = vec![dump];
        while let Some(id) = stack.pop() {
            let Some(current) = self.dump(id) else {
                continue;
            };
            order.push(id);
            stack.extend(current.children().iter().copied());
        }

        for &id in order.iter().rev() {
            self.aggregate_node(id, diagnostics);
        }
    }

    /// Fold the (already aggregated) children of `dump` into it
    fn aggregate_node(&mut self, dump: DumpId, diagnostics: &mut Option<&mut Diagnostics>) {
        let Some(current) = self.dump(dump) else {
            return;
        };
        let children = current.children();
        if children.is_empty() {
            return;
        }

        let names: BTreeSet<&String> = children
            .iter()
            .filter_map(|&child| self.dump(child))
            .flat_map(|child| child.attributes().keys())
            .collect();

        let owner = Owner { graph: &*self, dump };
        let mut aggregated: BTreeMap<String, Attribute> = current.attributes().clone();

        for name in names {
            let child_values: Vec<Option<&Attribute>> = children
                .iter()
                .map(|&child| self.dump(child).and_then(|c| c.attribute(name)))
                .collect();
            let existing = current.attribute(name);

            match combine(name, &owner, &child_values, existing, diagnostics.as_deref_mut()) {
                Some(value) => {
                    aggregated.insert(name.clone(), value);
                }
                None => {
                    aggregated.remove(name);
                }
            }
        }

        self.dump_mut(dump).attributes = aggregated;
    }
}

/// Names the dump being aggregated, only when a warning needs it
struct Owner<'a> {
    graph: &'a MemoryDumpGraph,
    dump: DumpId,
}

impl fmt::Display for Owner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.graph.quantified_name(self.dump))
    }
}

/// Combine child values of one attribute with the parent's existing value
fn combine(
    name: &str,
    owner: &Owner<'_>,
    child_values: &[Option<&Attribute>],
    existing: Option<&Attribute>,
    mut diagnostics: Option<&mut Diagnostics>,
) -> Option<Attribute> {
    let defined: Vec<&Attribute> = child_values.iter().flatten().copied().collect();

    let Some(first) = defined.first() else {
        return existing.cloned();
    };

    let kind = first.kind();
    if defined.iter().any(|a| a.kind() != kind) {
        warn_attribute(
            &mut diagnostics,
            format!(
                "Multiple types of attributes ('{}' of children of dump {}).",
                name, owner
            ),
        );
        return existing.cloned();
    }

    if let Some(parent) = existing {
        if parent.kind() != kind {
            warn_attribute(
                &mut diagnostics,
                format!(
                    "Attribute '{}' of dump {} is {} but its children's are {}.",
                    name,
                    owner,
                    parent.kind(),
                    kind
                ),
            );
            return existing.cloned();
        }
    }

    match kind {
        AttributeKind::Scalar => {
            let scalars: Vec<&ScalarUnit> = defined.iter().filter_map(|a| a.as_scalar()).collect();
            merge_scalars(name, owner, &scalars, existing, diagnostics).or_else(|| existing.cloned())
        }
        AttributeKind::Text => existing.cloned(),
    }
}

/// Sum scalar children; an explicit parent value wins when consistent
fn merge_scalars(
    name: &str,
    owner: &Owner<'_>,
    children: &[&ScalarUnit],
    existing: Option<&Attribute>,
    mut diagnostics: Option<&mut Diagnostics>,
) -> Option<Attribute> {
    let unit = children.first()?.unit();
    if children.iter().any(|c| c.unit() != unit) {
        warn_attribute(
            &mut diagnostics,
            format!(
                "Multiple units of attributes ('{}' of children of dump {}).",
                name, owner
            ),
        );
        return existing.cloned();
    }

    let sum: f64 = children.iter().map(|c| c.value()).sum();

    let Some(parent) = existing.and_then(Attribute::as_scalar) else {
        return Some(Attribute::Scalar(ScalarUnit::new(sum, unit)));
    };

    if parent.unit() != unit {
        warn_attribute(
            &mut diagnostics,
            format!(
                "Attribute '{}' of dump {} has unit {} but its children's have {}.",
                name,
                owner,
                parent.unit(),
                unit
            ),
        );
    } else if parent.value() < sum {
        warn_attribute(
            &mut diagnostics,
            format!(
                "Attribute '{}' of dump {} ({}) is smaller than the sum of its children ({}).",
                name,
                owner,
                parent,
                ScalarUnit::new(sum, unit)
            ),
        );
    }

    existing.cloned()
}

fn warn_attribute(diagnostics: &mut Option<&mut Diagnostics>, message: String) {
    if let Some(sink) = diagnostics.as_deref_mut() {
        sink.report(WarningKind::AttributeParseError, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Unit;

    fn bytes(value: f64) -> Attribute {
        Attribute::scalar(value, Unit::SizeInBytes)
    }

    #[test]
    fn test_scalar_children_are_summed() {
        let mut graph = MemoryDumpGraph::new();
        let p = graph.add_container("process 1");
        let root = graph.add_dump(p, "malloc", None).unwrap();
        let a = graph.add_dump(p, "malloc/a", None).unwrap();
        let b = graph.add_dump(p, "malloc/b", None).unwrap();
        graph.add_attribute(a, "size", bytes(100.0)).unwrap();
        graph.add_attribute(b, "size", bytes(28.0)).unwrap();

        let mut diagnostics = Diagnostics::new();
        graph.aggregate_attributes(root, Some(&mut diagnostics)).unwrap();

        assert_eq!(graph.dump(root).unwrap().attribute("size"), Some(&bytes(128.0)));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_deepest_first() {
        let mut graph = MemoryDumpGraph::new();
        let p = graph.add_container("process 1");
        let leaf1 = graph.add_dump(p, "v8/heap/new", None).unwrap();
        let leaf2 = graph.add_dump(p, "v8/heap/old", None).unwrap();
        let other = graph.add_dump(p, "v8/code", None).unwrap();
        graph.add_attribute(leaf1, "size", bytes(1.0)).unwrap();
        graph.add_attribute(leaf2, "size", bytes(2.0)).unwrap();
        graph.add_attribute(other, "size", bytes(4.0)).unwrap();

        let root = graph.find_dump(p, "v8").unwrap();
        graph.aggregate_attributes(root, None).unwrap();

        let heap = graph.find_dump(p, "v8/heap").unwrap();
        assert_eq!(graph.dump(heap).unwrap().attribute("size"), Some(&bytes(3.0)));
        assert_eq!(graph.dump(root).unwrap().attribute("size"), Some(&bytes(7.0)));
    }

    #[test]
    fn test_explicit_parent_value_is_kept() {
        let mut graph = MemoryDumpGraph::new();
        let p = graph.add_container("process 1");
        let root = graph.add_dump(p, "malloc", None).unwrap();
        let a = graph.add_dump(p, "malloc/a", None).unwrap();
        graph.add_attribute(root, "size", bytes(500.0)).unwrap();
        graph.add_attribute(a, "size", bytes(100.0)).unwrap();

        let mut diagnostics = Diagnostics::new();
        graph.aggregate_attributes(root, Some(&mut diagnostics)).unwrap();

        assert_eq!(graph.dump(root).unwrap().attribute("size"), Some(&bytes(500.0)));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_parent_smaller_than_children_is_reported() {
        let mut graph = MemoryDumpGraph::new();
        let p = graph.add_container("process 1");
        let root = graph.add_dump(p, "malloc", None).unwrap();
        let a = graph.add_dump(p, "malloc/a", None).unwrap();
        graph.add_attribute(root, "size", bytes(10.0)).unwrap();
        graph.add_attribute(a, "size", bytes(100.0)).unwrap();

        let mut diagnostics = Diagnostics::new();
        graph.aggregate_attributes(root, Some(&mut diagnostics)).unwrap();

        assert_eq!(graph.dump(root).unwrap().attribute("size"), Some(&bytes(10.0)));
        assert_eq!(diagnostics.count_of(WarningKind::AttributeParseError), 1);
    }

    #[test]
    fn test_mixed_kinds_are_reported_not_thrown() {
        let mut graph = MemoryDumpGraph::new();
        let p = graph.add_container("process 1");
        let root = graph.add_dump(p, "root", None).unwrap();
        let a = graph.add_dump(p, "root/a", None).unwrap();
        let b = graph.add_dump(p, "root/b", None).unwrap();
        graph.add_attribute(a, "size", bytes(1.0)).unwrap();
        graph.add_attribute(b, "size", Attribute::text("big")).unwrap();
        graph.add_attribute(a, "count", Attribute::scalar(2.0, Unit::Count)).unwrap();

        let mut diagnostics = Diagnostics::new();
        graph.aggregate_attributes(root, Some(&mut diagnostics)).unwrap();

        let dump = graph.dump(root).unwrap();
        assert_eq!(dump.attribute("size"), None);
        assert_eq!(dump.attribute("count"), Some(&Attribute::scalar(2.0, Unit::Count)));
        assert_eq!(diagnostics.count_of(WarningKind::AttributeParseError), 1);
    }

    #[test]
    fn test_mixed_units_are_reported() {
        let mut graph = MemoryDumpGraph::new();
        let p = graph.add_container("process 1");
        let root = graph.add_dump(p, "root", None).unwrap();
        let a = graph.add_dump(p, "root/a", None).unwrap();
        let b = graph.add_dump(p, "root/b", None).unwrap();
        graph.add_attribute(a, "size", bytes(1.0)).unwrap();
        graph.add_attribute(b, "size", Attribute::scalar(1.0, Unit::Count)).unwrap();

        let mut diagnostics = Diagnostics::new();
        graph.aggregate_attributes(root, Some(&mut diagnostics)).unwrap();

        assert_eq!(graph.dump(root).unwrap().attribute("size"), None);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_text_attributes_are_not_aggregated() {
        let mut graph = MemoryDumpGraph::new();
        let p = graph.add_container("process 1");
        let root = graph.add_dump(p, "root", None).unwrap();
        let a = graph.add_dump(p, "root/a", None).unwrap();
        graph.add_attribute(a, "label", Attribute::text("x")).unwrap();

        graph.aggregate_attributes(root, None).unwrap();
        assert_eq!(graph.dump(root).unwrap().attribute("label"), None);
    }

    #[test]
    fn test_deep_path_aggregates_without_recursion() {
        let mut graph = MemoryDumpGraph::new();
        let p = graph.add_container("process 1");
        let leaf = graph
            .add_dump(p, &vec!["a"; 50_000].join("/"), None)
            .unwrap();
        graph.add_attribute(leaf, "size", bytes(64.0)).unwrap();

        let mut diagnostics = Diagnostics::new();
        graph.aggregate_all(Some(&mut diagnostics));

        let root = graph.roots(p)[0];
        assert_eq!(graph.dump(root).unwrap().attribute("size"), Some(&bytes(64.0)));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_valid_size_attribute() {
        let mut graph = MemoryDumpGraph::new();
        let p = graph.add_container("process 1");
        let a = graph.add_dump(p, "a", None).unwrap();
        graph.add_attribute(a, "size", bytes(8.0)).unwrap();
        graph.add_attribute(a, "effective_size", Attribute::text("n/a")).unwrap();

        let mut diagnostics = Diagnostics::new();
        assert_eq!(
            graph
                .get_valid_size_attribute(a, "size", Some(&mut diagnostics))
                .map(|s| s.value()),
            Some(8.0)
        );
        assert!(diagnostics.is_empty());

        assert!(graph
            .get_valid_size_attribute(a, "effective_size", Some(&mut diagnostics))
            .is_none());
        assert_eq!(diagnostics.count_of(WarningKind::MemoryDumpParseError), 1);

        assert!(graph
            .get_valid_size_attribute(a, "resident_size", Some(&mut diagnostics))
            .is_none());
        assert_eq!(diagnostics.len(), 1);
    }
}
