//! Label lookup and small-neighborhood assembly for graph visualisation.
//!
//! Not part of scored resolution: no temporal mask, belief or citation
//! rules apply here.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::atom::AtomId;
use crate::error::{CnsResult, ValidationError};
use crate::storage::FactStore;

/// A node with a synthetic 1-based id, stable for one response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: u64,
    pub label: String,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub src_id: u64,
    pub dst_id: u64,
    pub predicate: String,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphNeighborhood {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Atoms whose label contains `text` (case-insensitive), shortest label first.
///
/// # Errors
///
/// Returns a storage error if the lookup fails.
pub fn nearest_atoms(store: &dyn FactStore, text: &str, k: usize) -> CnsResult<Vec<AtomId>> {
    Ok(store.resolve_labels_by_substring(text, k)?)
}

/// Outgoing edges around atoms matching `label`.
///
/// Node ids are assigned in sorted label order. The queried label is always
/// a node, even without outgoing edges, as long as something matched it.
///
/// # Errors
///
/// - `ValidationError::EmptyLabel` for a blank label
/// - `ValidationError::InvalidHops` when `hops` is 0
/// - a storage error if the store fails
pub fn graph_neighborhood(
    store: &dyn FactStore,
    label: &str,
    hops: usize,
    limit: usize,
) -> CnsResult<GraphNeighborhood> {
    if label.trim().is_empty() {
        return Err(ValidationError::EmptyLabel.into());
    }
    if hops < 1 {
        return Err(ValidationError::InvalidHops { hops }.into());
    }

    let ids = nearest_atoms(store, label, limit)?;
    if ids.is_empty() {
        return Ok(GraphNeighborhood::default());
    }
    let raw = store.fetch_neighborhood(&ids, hops, None, limit)?;

    let labels: BTreeSet<&str> = raw
        .iter()
        .flat_map(|e| [e.src_label.as_str(), e.dst_label.as_str()])
        .chain(std::iter::once(label))
        .collect();
    let node_ids: BTreeMap<&str, u64> = labels.iter().copied().zip(1u64..).collect();

    let nodes = node_ids
        .iter()
        .map(|(label, id)| GraphNode {
            id: *id,
            label: (*label).to_string(),
            kind: None,
        })
        .collect();
    let edges = raw
        .iter()
        .filter_map(|e| {
            Some(GraphEdge {
                src_id: *node_ids.get(e.src_label.as_str())?,
                dst_id: *node_ids.get(e.dst_label.as_str())?,
                predicate: e.predicate.clone(),
                confidence: None,
            })
        })
        .collect();

    tracing::debug!(label, hops, matched = ids.len(), edges = raw.len(), "neighborhood assembled");
    Ok(GraphNeighborhood { nodes, edges })
}
