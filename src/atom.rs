//! Atoms: labeled nodes of the knowledge graph.
//!
//! Labels are human readable and not required to be unique. Two atoms with
//! the same kind and label but different text are a textual contradiction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Stable atom identifier.
///
/// Ordered so contradiction pairs can be reported canonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtomId(Uuid);

impl AtomId {
    /// Creates a new random atom ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an atom ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AtomId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classification of an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomKind {
    Entity,
    Concept,
    Rule,
    Program,
}

impl AtomKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 4] = [Self::Entity, Self::Concept, Self::Rule, Self::Program];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Entity => "Entity",
            Self::Concept => "Concept",
            Self::Rule => "Rule",
            Self::Program => "Program",
        }
    }
}

impl fmt::Display for AtomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AtomKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidConfig {
                key: "kind".to_string(),
                value: s.to_string(),
                reason: "expected one of Entity, Concept, Rule, Program".to_string(),
            })
    }
}

/// A labeled node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    pub id: AtomId,
    pub kind: AtomKind,
    pub label: String,

    /// Optional long-form text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Atom {
    /// Creates an atom without text.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyLabel` if the label is blank.
    pub fn new(kind: AtomKind, label: impl Into<String>) -> Result<Self, ValidationError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(ValidationError::EmptyLabel);
        }
        Ok(Self {
            id: AtomId::new(),
            kind,
            label,
            text: None,
        })
    }

    /// Sets the text payload.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_id_unique_and_ordered() {
        let a = AtomId::new();
        let b = AtomId::new();
        assert_ne!(a, b);
        assert!(a < b || b < a);
    }

    #[test]
    fn test_atom_new_rejects_blank_label() {
        assert!(matches!(
            Atom::new(AtomKind::Entity, "   "),
            Err(ValidationError::EmptyLabel)
        ));
    }

    #[test]
    fn test_atom_with_text() {
        let atom = Atom::new(AtomKind::Concept, "TLS1.3")
            .unwrap()
            .with_text("Transport Layer Security 1.3");
        assert_eq!(atom.text.as_deref(), Some("Transport Layer Security 1.3"));
    }

    #[test]
    fn test_kind_parse_is_case_insensitive() {
        assert_eq!("entity".parse::<AtomKind>().unwrap(), AtomKind::Entity);
        assert_eq!("PROGRAM".parse::<AtomKind>().unwrap(), AtomKind::Program);
        assert!("Event".parse::<AtomKind>().is_err());
    }

    #[test]
    fn test_kind_serializes_as_name() {
        let json = serde_json::to_string(&AtomKind::Rule).unwrap();
        assert_eq!(json, "\"Rule\"");
    }
}
