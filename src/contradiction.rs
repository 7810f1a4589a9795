//! Contradiction detection.
//!
//! Two independent passes share one overlap primitive
//! ([`ValidityInterval::overlaps`]):
//!
//! - **Relational**: facts with the same subject atom and predicate that point
//!   at different objects while their validity intervals overlap.
//! - **Textual**: atoms with the same `(kind, label)` holding different text.
//!   An atom without an aspect is valid at all times.
//!
//! Contradictions are reported, never resolved. The store may return
//! candidate pairs in any orientation; each pass keeps only the canonical
//! orientation (`left.id < right.id`), which removes self-pairs and mirrored
//! duplicates in one step.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::atom::{AtomId, AtomKind};
use crate::error::CnsResult;
use crate::storage::{FactStore, RelationalPair, TextualPair};
use crate::time::ValidityInterval;

/// Predicate recorded for textual contradictions.
pub const TEXT_MISMATCH_PREDICATE: &str = "text_mismatch";

/// Characters of atom text kept in `object*_label`.
pub const STORED_SNIPPET_CHARS: usize = 100;

/// Characters of atom text quoted in the reason sentence.
pub const REASON_SNIPPET_CHARS: usize = 50;

/// Which detector produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionKind {
    Relational,
    Textual,
}

impl fmt::Display for ContradictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relational => write!(f, "relational"),
            Self::Textual => write!(f, "textual"),
        }
    }
}

/// A detected contradiction.
///
/// For textual reports the subject is the first atom of the pair and the
/// object labels hold truncated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contradiction {
    pub kind: ContradictionKind,
    pub subject_id: AtomId,
    pub subject_label: String,
    pub predicate: String,
    pub object1_id: AtomId,
    pub object1_label: String,
    pub object2_id: AtomId,
    pub object2_label: String,
    /// `[max(start), min(end)]`; a `None` bound is unbounded.
    pub overlap: ValidityInterval,
    pub reason: String,
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn is_canonical_relational(pair: &RelationalPair) -> bool {
    pair.left.fact_id < pair.right.fact_id
}

fn has_distinct_objects(pair: &RelationalPair) -> bool {
    pair.left.object_id != pair.right.object_id
}

fn relational_overlap(pair: &RelationalPair) -> Option<ValidityInterval> {
    pair.left.validity.overlap_window(&pair.right.validity)
}

fn is_canonical_textual(pair: &TextualPair) -> bool {
    pair.left.atom_id < pair.right.atom_id
}

fn has_conflicting_text(pair: &TextualPair) -> bool {
    matches!(
        (&pair.left.text, &pair.right.text),
        (Some(a), Some(b)) if a != b
    )
}

/// A side without an aspect never excludes the pair; the window is then the
/// other side's interval as stored, zero-length ones included.
fn textual_overlap(pair: &TextualPair) -> Option<ValidityInterval> {
    match (pair.left.validity, pair.right.validity) {
        (Some(left), Some(right)) => left.overlap_window(&right),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => Some(ValidityInterval::open()),
    }
}

fn relational_report(pair: RelationalPair, overlap: ValidityInterval) -> Contradiction {
    let reason = format!(
        "Same subject '{}' has predicate '{}' pointing to both '{}' and '{}' during overlapping time periods",
        pair.subject_label, pair.predicate, pair.left.object_label, pair.right.object_label
    );
    Contradiction {
        kind: ContradictionKind::Relational,
        subject_id: pair.subject_id,
        subject_label: pair.subject_label,
        predicate: pair.predicate,
        object1_id: pair.left.object_id,
        object1_label: pair.left.object_label,
        object2_id: pair.right.object_id,
        object2_label: pair.right.object_label,
        overlap,
        reason,
    }
}

fn textual_report(pair: TextualPair, overlap: ValidityInterval) -> Contradiction {
    let text1 = pair.left.text.as_deref().unwrap_or_default();
    let text2 = pair.right.text.as_deref().unwrap_or_default();
    let reason = format!(
        "Atoms with same kind+label '{}' have different text values: '{}...' vs '{}...'",
        pair.label,
        truncate_chars(text1, REASON_SNIPPET_CHARS),
        truncate_chars(text2, REASON_SNIPPET_CHARS),
    );
    Contradiction {
        kind: ContradictionKind::Textual,
        subject_id: pair.left.atom_id,
        subject_label: pair.label.clone(),
        predicate: TEXT_MISMATCH_PREDICATE.to_string(),
        object1_id: pair.left.atom_id,
        object1_label: truncate_chars(text1, STORED_SNIPPET_CHARS),
        object2_id: pair.right.atom_id,
        object2_label: truncate_chars(text2, STORED_SNIPPET_CHARS),
        overlap,
        reason,
    }
}

/// Runs contradiction passes against a fact store.
pub struct ContradictionDetector<'a> {
    store: &'a dyn FactStore,
}

impl<'a> ContradictionDetector<'a> {
    #[must_use]
    pub fn new(store: &'a dyn FactStore) -> Self {
        Self { store }
    }

    /// Relational contradictions, optionally narrowed by subject label and predicate.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the candidate fetch fails.
    pub fn detect_relational(
        &self,
        label: Option<&str>,
        predicate: Option<&str>,
        limit: usize,
    ) -> CnsResult<Vec<Contradiction>> {
        let pairs = self
            .store
            .fetch_overlap_candidates_relational(label, predicate)
            .map_err(|e| {
                tracing::warn!(error = %e, "relational candidate fetch failed");
                e
            })?;
        let found: Vec<Contradiction> = pairs
            .into_iter()
            .filter(is_canonical_relational)
            .filter(has_distinct_objects)
            .filter_map(|pair| relational_overlap(&pair).map(|w| relational_report(pair, w)))
            .take(limit)
            .collect();
        tracing::debug!(found = found.len(), limit, "relational contradiction pass");
        Ok(found)
    }

    /// Textual contradictions, optionally narrowed by atom kind and label.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the candidate fetch fails.
    pub fn detect_textual(
        &self,
        kind: Option<AtomKind>,
        label: Option<&str>,
        limit: usize,
    ) -> CnsResult<Vec<Contradiction>> {
        let pairs = self
            .store
            .fetch_overlap_candidates_textual(kind, label)
            .map_err(|e| {
                tracing::warn!(error = %e, "textual candidate fetch failed");
                e
            })?;
        let found: Vec<Contradiction> = pairs
            .into_iter()
            .filter(is_canonical_textual)
            .filter(has_conflicting_text)
            .filter_map(|pair| textual_overlap(&pair).map(|w| textual_report(pair, w)))
            .take(limit)
            .collect();
        tracing::debug!(found = found.len(), limit, "textual contradiction pass");
        Ok(found)
    }

    /// Relational pass first, then textual reports for whatever room is left.
    ///
    /// Never returns more than `limit` reports.
    ///
    /// # Errors
    ///
    /// Returns a storage error if either candidate fetch fails.
    pub fn detect_all(&self, limit: usize) -> CnsResult<Vec<Contradiction>> {
        let mut found = self.detect_relational(None, None, limit)?;
        let remaining = limit.saturating_sub(found.len());
        if remaining > 0 {
            found.extend(self.detect_textual(None, None, remaining)?);
        }
        Ok(found)
    }
}

impl fmt::Debug for ContradictionDetector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContradictionDetector").finish_non_exhaustive()
    }
}
