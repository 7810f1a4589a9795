//! Facts: directed, predicate-typed edges between atoms.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::atom::AtomId;
use crate::error::ValidationError;

/// Stable fact identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactId(Uuid);

impl FactId {
    /// Creates a new random fact ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a fact ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for FactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed typed edge `src -predicate-> dst`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub id: FactId,
    pub src: AtomId,
    pub dst: AtomId,
    pub predicate: String,
}

impl Fact {
    /// Creates a new fact.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyPredicate` if the predicate is blank.
    pub fn new(src: AtomId, dst: AtomId, predicate: impl Into<String>) -> Result<Self, ValidationError> {
        let predicate = predicate.into();
        if predicate.trim().is_empty() {
            return Err(ValidationError::EmptyPredicate);
        }
        Ok(Self {
            id: FactId::new(),
            src,
            dst,
            predicate,
        })
    }
}
