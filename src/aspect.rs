//! Aspects and provenance.
//!
//! An [`Aspect`] is the single bitemporal annotation attached to an atom or a
//! fact: validity interval, observation time, stored belief and provenance.
//! Provenance is a named optional structure rather than an open map so the
//! citation contract can be checked without guessing at keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::atom::AtomId;
use crate::error::ValidationError;
use crate::fact::FactId;
use crate::time::ValidityInterval;

/// The subject an aspect is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "subject_kind", content = "subject_id", rename_all = "snake_case")]
pub enum SubjectRef {
    Atom(AtomId),
    Fact(FactId),
}

impl From<AtomId> for SubjectRef {
    fn from(id: AtomId) -> Self {
        Self::Atom(id)
    }
}

impl From<FactId> for SubjectRef {
    fn from(id: FactId) -> Self {
        Self::Fact(id)
    }
}

/// Citation metadata for a stored claim.
///
/// Any subset of fields may be present.
///
/// # Examples
///
/// ```
/// use cnsql::Provenance;
///
/// let cited = Provenance::from_uri("https://example.org/policy");
/// assert!(cited.is_cited());
/// assert!(!Provenance::default().is_cited());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default)]
    pub source_id: Option<String>,

    #[serde(default)]
    pub uri: Option<String>,

    #[serde(default)]
    pub line_span: Option<String>,

    #[serde(default)]
    pub fetched_at: Option<String>,

    #[serde(default)]
    pub hash: Option<String>,
}

fn non_empty(field: Option<&String>) -> bool {
    field.is_some_and(|s| !s.trim().is_empty())
}

impl Provenance {
    /// Provenance identified by a source id.
    #[must_use]
    pub fn from_source(source_id: impl Into<String>) -> Self {
        Self {
            source_id: Some(source_id.into()),
            ..Self::default()
        }
    }

    /// Provenance identified by a URI.
    #[must_use]
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn with_line_span(mut self, line_span: impl Into<String>) -> Self {
        self.line_span = Some(line_span.into());
        self
    }

    #[must_use]
    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = Some(fetched_at.to_rfc3339());
        self
    }

    /// Sets `hash` to the BLAKE3 digest of the identifying fields.
    #[must_use]
    pub fn with_content_hash(mut self) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.source_id.as_deref().unwrap_or_default().as_bytes());
        hasher.update(b"|");
        hasher.update(self.uri.as_deref().unwrap_or_default().as_bytes());
        self.hash = Some(hasher.finalize().to_hex().to_string());
        self
    }

    /// True if the record has a non-empty `source_id` or `uri`.
    #[must_use]
    pub fn is_cited(&self) -> bool {
        non_empty(self.source_id.as_ref()) || non_empty(self.uri.as_ref())
    }
}

/// Bitemporal annotation with belief and provenance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Aspect {
    /// When the annotated claim holds in the world.
    #[serde(default)]
    pub validity: ValidityInterval,

    /// When the claim was last observed.
    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,

    /// Stored base belief in `[0, 1]`. Absent is read as 0.
    #[serde(default)]
    pub belief: Option<f64>,

    #[serde(default)]
    pub provenance: Option<Provenance>,
}

impl Aspect {
    /// Creates an aspect with the given validity and nothing else.
    #[must_use]
    pub fn new(validity: ValidityInterval) -> Self {
        Self {
            validity,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = Some(at);
        self
    }

    #[must_use]
    pub fn belief(mut self, belief: f64) -> Self {
        self.belief = Some(belief);
        self
    }

    #[must_use]
    pub fn provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Checks the belief range and interval ordering.
    ///
    /// # Errors
    ///
    /// - `BeliefOutOfRange` if belief is outside `[0, 1]` or not a number
    /// - `InvalidInterval` if `valid_from > valid_to`
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(b) = self.belief {
            if !(0.0..=1.0).contains(&b) {
                return Err(ValidationError::BeliefOutOfRange { value: b });
            }
        }
        ValidityInterval::new(self.validity.from, self.validity.to)?;
        Ok(())
    }
}
