//! The fact store contract consumed by the core.
//!
//! The core never writes through this trait; every method is a read over a
//! snapshot. A failing call aborts the whole query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aspect::Provenance;
use crate::atom::{AtomId, AtomKind};
use crate::error::ValidationError;
use crate::fact::FactId;
use crate::time::ValidityInterval;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Atom not found.
    #[error("Atom not found: {0}")]
    AtomNotFound(AtomId),

    /// Fact not found.
    #[error("Fact not found: {0}")]
    FactNotFound(FactId),

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// A write carried invalid data.
    #[error("Invalid write: {0}")]
    Validation(#[from] ValidationError),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Connection failed.
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// One fact joined with its endpoints and (optional) aspect.
///
/// A fact without an aspect has an open validity interval and no belief,
/// observation time or provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCandidate {
    pub fact_id: FactId,
    pub subject_label: String,
    pub predicate: String,
    pub object_label: String,
    pub validity: ValidityInterval,
    pub base_belief: Option<f64>,
    pub observed_at: Option<DateTime<Utc>>,
    pub provenance: Option<Provenance>,
}

/// One side of a relational candidate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactSide {
    pub fact_id: FactId,
    pub object_id: AtomId,
    pub object_label: String,
    pub validity: ValidityInterval,
}

/// Two facts sharing a subject atom and predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationalPair {
    pub subject_id: AtomId,
    pub subject_label: String,
    pub predicate: String,
    pub left: FactSide,
    pub right: FactSide,
}

/// One side of a textual candidate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomSide {
    pub atom_id: AtomId,
    pub text: Option<String>,
    /// `None` when the atom has no aspect at all.
    pub validity: Option<ValidityInterval>,
}

/// Two atoms sharing kind and label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextualPair {
    pub kind: AtomKind,
    pub label: String,
    pub left: AtomSide,
    pub right: AtomSide,
}

/// A labeled edge `(src_label, predicate, dst_label)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub src_label: String,
    pub predicate: String,
    pub dst_label: String,
}

/// Read-only fact store interface.
///
/// Candidate pair methods may return pairs in either orientation and may
/// include a fact or atom paired with itself; the contradiction detector
/// applies canonical ordering.
pub trait FactStore: Send + Sync {
    /// Facts whose subject label and predicate match the given filters.
    fn fetch_facts(
        &self,
        label: Option<&str>,
        predicate: Option<&str>,
    ) -> Result<Vec<FactCandidate>, StorageError>;

    /// Pairs of annotated facts sharing subject and predicate.
    fn fetch_overlap_candidates_relational(
        &self,
        label: Option<&str>,
        predicate: Option<&str>,
    ) -> Result<Vec<RelationalPair>, StorageError>;

    /// Pairs of atoms sharing kind and label.
    fn fetch_overlap_candidates_textual(
        &self,
        kind: Option<AtomKind>,
        label: Option<&str>,
    ) -> Result<Vec<TextualPair>, StorageError>;

    /// Atom ids whose label contains `text`, best match first, at most `k`.
    fn resolve_labels_by_substring(&self, text: &str, k: usize) -> Result<Vec<AtomId>, StorageError>;

    /// Outgoing edges reachable from `ids` within `hops`.
    fn fetch_neighborhood(
        &self,
        ids: &[AtomId],
        hops: usize,
        predicates: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<Edge>, StorageError>;
}
