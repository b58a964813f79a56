//! Fold aggregated dump sizes into a metrics document.

use super::diagnostics::Diagnostics;
use super::dump::MemoryDumpGraph;
use crate::report::{is_group_key, MetricsDocument};
use crate::utils::config::SIZE_ATTRIBUTE_NAME;
use serde_json::Value;

/// Build a document of formatted root sizes, one sub-document per container
///
/// Roots without a valid scalar `size` are left out; non-scalar sizes
/// are reported to `diagnostics`. Run aggregation first so roots carry
/// their children's totals. Digit-only names get a `container ` or
/// `dump ` prefix so the renderer does not read them as metric groups.
///
/// # Example
/// ```ignore
/// graph.aggregate_all(Some(&mut diagnostics));
/// let memory = size_summary(&graph, Some(&mut diagnostics));
/// // {"process 1": {"malloc": "1.5 KiB"}}
/// ```
pub fn size_summary(graph: &MemoryDumpGraph, mut diagnostics: Option<&mut Diagnostics>) -> MetricsDocument {
    let mut summary = MetricsDocument::new();

    for (container_id, container) in graph.containers() {
        let mut sizes = MetricsDocument::new();

        for &root in graph.roots(container_id) {
            let Some(dump) = graph.dump(root) else {
                continue;
            };
            if let Some(size) =
                graph.get_valid_size_attribute(root, SIZE_ATTRIBUTE_NAME, diagnostics.as_deref_mut())
            {
                sizes.insert(summary_key("dump", dump.name()), Value::String(size.format()));
            }
        }

        summary.insert(summary_key("container", container.name()), Value::Object(sizes));
    }

    summary
}

fn summary_key(kind: &str, name: &str) -> String {
    if is_group_key(name) {
        format!("{} {}", kind, name)
    } else {
        name.to_string()
    }
}
