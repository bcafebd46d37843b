//! Dependency edge extraction from analysis exports
//!
//! Edges can appear in three places of an export. All three are probed and
//! their edges accumulated in this order:
//!
//! 1. `content.Dependencies.dependency_graph.edges` (`[source, target, ...]`)
//! 2. `content.Dependencies.coupling_metrics` (`{"from": .., "to": ..}`)
//! 3. `content.Topology.coupling_metrics` (same record shape)
//!
//! Entries that do not have the expected shape are skipped one by one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{AnalysisDocument, Lookup};

/// `source` depends on `target`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: String,
    pub target: String,
}

impl DependencyEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Extract every dependency edge from a document, in discovery order
///
/// Duplicates are kept; the graph builder collapses them.
pub fn extract_dependencies(doc: &AnalysisDocument) -> Vec<DependencyEdge> {
    let content = doc.at().get("content");
    let dependencies = content.get("Dependencies");

    let mut edges = Vec::new();
    let mut skipped = 0usize;

    for entry in dependencies.path(&["dependency_graph", "edges"]).items() {
        match edge_from_pair(entry) {
            Some(edge) => edges.push(edge),
            None => skipped += 1,
        }
    }

    skipped += collect_coupling(dependencies, &mut edges);
    skipped += collect_coupling(content.get("Topology"), &mut edges);

    if skipped > 0 {
        tracing::debug!(skipped, "skipped malformed dependency entries");
    }
    tracing::info!(count = edges.len(), "extracted dependency relationships");

    edges
}

/// Append edges from a section's `coupling_metrics`, returning the skip count
fn collect_coupling(section: Lookup<'_>, edges: &mut Vec<DependencyEdge>) -> usize {
    let mut skipped = 0;
    for metric in section.get("coupling_metrics").items() {
        match edge_from_record(metric) {
            Some(edge) => edges.push(edge),
            None => skipped += 1,
        }
    }
    skipped
}

fn edge_from_pair(entry: &Value) -> Option<DependencyEdge> {
    let pair = entry.as_array()?;
    if pair.len() < 2 {
        return None;
    }
    Some(DependencyEdge::new(endpoint(&pair[0])?, endpoint(&pair[1])?))
}

fn edge_from_record(entry: &Value) -> Option<DependencyEdge> {
    let record = entry.as_object()?;
    Some(DependencyEdge::new(
        endpoint(record.get("from")?)?,
        endpoint(record.get("to")?)?,
    ))
}

/// Node identity for a JSON endpoint; scalars only
fn endpoint(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
