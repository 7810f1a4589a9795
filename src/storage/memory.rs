//! In-memory storage backend.
//!
//! A thread-safe, in-process [`FactStore`] holding atoms, facts and at most
//! one aspect per subject. It is intended for embedded usage, tests, the CLI
//! demo, and as a reference for what a persistent backend must return.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use crate::aspect::{Aspect, Provenance, SubjectRef};
use crate::atom::{Atom, AtomId, AtomKind};
use crate::fact::{Fact, FactId};
use crate::storage::traits::{
    AtomSide, Edge, FactCandidate, FactSide, FactStore, RelationalPair, StorageError, TextualPair,
};
use crate::time::ValidityInterval;

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct GraphState {
    // Insertion order is the iteration order of every read.
    atoms: Vec<Atom>,
    atom_index: HashMap<AtomId, usize>,
    facts: Vec<Fact>,
    fact_index: HashMap<FactId, usize>,
    aspects: HashMap<SubjectRef, Aspect>,
}

impl GraphState {
    fn atom(&self, id: AtomId) -> Result<&Atom, StorageError> {
        self.atom_index
            .get(&id)
            .and_then(|&i| self.atoms.get(i))
            .ok_or(StorageError::AtomNotFound(id))
    }

    fn push_atom(&mut self, atom: Atom) -> AtomId {
        let id = atom.id;
        self.atom_index.insert(id, self.atoms.len());
        self.atoms.push(atom);
        id
    }

    fn subject_exists(&self, subject: SubjectRef) -> bool {
        match subject {
            SubjectRef::Atom(id) => self.atom_index.contains_key(&id),
            SubjectRef::Fact(id) => self.fact_index.contains_key(&id),
        }
    }

    /// Facts joined with both endpoint atoms, filtered on subject label and predicate.
    fn joined_facts<'a>(
        &'a self,
        label: Option<&'a str>,
        predicate: Option<&'a str>,
    ) -> impl Iterator<Item = Result<(&'a Fact, &'a Atom, &'a Atom), StorageError>> + 'a {
        self.facts
            .iter()
            .filter(move |f| predicate.map_or(true, |p| f.predicate == p))
            .map(move |f| -> Result<_, StorageError> {
                Ok((f, self.atom(f.src)?, self.atom(f.dst)?))
            })
            .filter(move |row| match (row, label) {
                (Ok((_, src, _)), Some(l)) => src.label == l,
                _ => true,
            })
    }
}

/// Thread-safe in-memory knowledge graph.
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    state: RwLock<GraphState>,
}

impl InMemoryGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an atom. Returns an error if its ID already exists.
    pub fn insert_atom(&self, atom: Atom) -> Result<AtomId, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("graph.insert_atom"))?;
        if state.atom_index.contains_key(&atom.id) {
            return Err(StorageError::DuplicateKey(atom.id.to_string()));
        }
        Ok(state.push_atom(atom))
    }

    /// Returns the first atom with this `(kind, label)`, inserting one if none exists.
    pub fn upsert_atom(
        &self,
        kind: AtomKind,
        label: &str,
        text: Option<&str>,
    ) -> Result<AtomId, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("graph.upsert_atom"))?;
        if let Some(existing) = state.atoms.iter().find(|a| a.kind == kind && a.label == label) {
            return Ok(existing.id);
        }
        let mut atom = Atom::new(kind, label)?;
        atom.text = text.map(str::to_string);
        Ok(state.push_atom(atom))
    }

    /// Inserts a fact between two existing atoms.
    pub fn insert_fact(
        &self,
        src: AtomId,
        dst: AtomId,
        predicate: &str,
    ) -> Result<FactId, StorageError> {
        let fact = Fact::new(src, dst, predicate)?;
        let mut state = self.state.write().map_err(|_| lock_err("graph.insert_fact"))?;
        state.atom(src)?;
        state.atom(dst)?;
        let id = fact.id;
        let idx = state.facts.len();
        state.facts.push(fact);
        state.fact_index.insert(id, idx);
        Ok(id)
    }

    /// Attaches an aspect to a subject, replacing any existing one.
    pub fn set_aspect(&self, subject: impl Into<SubjectRef>, aspect: Aspect) -> Result<(), StorageError> {
        let subject = subject.into();
        aspect.validate()?;
        let mut state = self.state.write().map_err(|_| lock_err("graph.set_aspect"))?;
        if !state.subject_exists(subject) {
            return Err(match subject {
                SubjectRef::Atom(id) => StorageError::AtomNotFound(id),
                SubjectRef::Fact(id) => StorageError::FactNotFound(id),
            });
        }
        state.aspects.insert(subject, aspect);
        Ok(())
    }

    /// Inserts a fact and its aspect in one call. `observed_at` is set to now.
    pub fn link_with_validity(
        &self,
        src: AtomId,
        dst: AtomId,
        predicate: &str,
        validity: ValidityInterval,
        belief: Option<f64>,
        provenance: Option<Provenance>,
    ) -> Result<FactId, StorageError> {
        let aspect = Aspect {
            validity,
            observed_at: Some(Utc::now()),
            belief,
            provenance,
        };
        // Validate before the fact exists so a bad aspect leaves no orphan edge.
        aspect.validate()?;
        let id = self.insert_fact(src, dst, predicate)?;
        self.set_aspect(id, aspect)?;
        Ok(id)
    }

    /// Looks up an atom by ID.
    pub fn atom(&self, id: AtomId) -> Result<Option<Atom>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("graph.atom"))?;
        Ok(state.atom(id).ok().cloned())
    }

    /// Looks up the aspect attached to a subject.
    pub fn aspect(&self, subject: impl Into<SubjectRef>) -> Result<Option<Aspect>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("graph.aspect"))?;
        Ok(state.aspects.get(&subject.into()).cloned())
    }

    /// Number of stored facts.
    pub fn fact_count(&self) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("graph.fact_count"))?;
        Ok(state.facts.len())
    }
}

impl FactStore for InMemoryGraph {
    fn fetch_facts(
        &self,
        label: Option<&str>,
        predicate: Option<&str>,
    ) -> Result<Vec<FactCandidate>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("graph.fetch_facts"))?;
        state
            .joined_facts(label, predicate)
            .map(|row| -> Result<FactCandidate, StorageError> {
                let (fact, src, dst) = row?;
                let aspect = state.aspects.get(&SubjectRef::Fact(fact.id));
                Ok(FactCandidate {
                    fact_id: fact.id,
                    subject_label: src.label.clone(),
                    predicate: fact.predicate.clone(),
                    object_label: dst.label.clone(),
                    validity: aspect.map(|a| a.validity).unwrap_or_default(),
                    base_belief: aspect.and_then(|a| a.belief),
                    observed_at: aspect.and_then(|a| a.observed_at),
                    provenance: aspect.and_then(|a| a.provenance.clone()),
                })
            })
            .collect()
    }

    fn fetch_overlap_candidates_relational(
        &self,
        label: Option<&str>,
        predicate: Option<&str>,
    ) -> Result<Vec<RelationalPair>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("graph.fetch_overlap_candidates_relational"))?;

        // Only annotated facts take part; grouped by (subject, predicate) in first-seen order.
        let mut groups: Vec<((AtomId, &str), Vec<(&Atom, FactSide)>)> = Vec::new();
        for row in state.joined_facts(label, predicate) {
            let (fact, src, dst) = row?;
            let Some(aspect) = state.aspects.get(&SubjectRef::Fact(fact.id)) else {
                continue;
            };
            let side = FactSide {
                fact_id: fact.id,
                object_id: dst.id,
                object_label: dst.label.clone(),
                validity: aspect.validity,
            };
            let key = (src.id, fact.predicate.as_str());
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push((src, side)),
                None => groups.push((key, vec![(src, side)])),
            }
        }

        let mut pairs = Vec::new();
        for ((_, predicate), members) in &groups {
            for (subject, left) in members {
                for (_, right) in members {
                    pairs.push(RelationalPair {
                        subject_id: subject.id,
                        subject_label: subject.label.clone(),
                        predicate: (*predicate).to_string(),
                        left: left.clone(),
                        right: right.clone(),
                    });
                }
            }
        }
        Ok(pairs)
    }

    fn fetch_overlap_candidates_textual(
        &self,
        kind: Option<AtomKind>,
        label: Option<&str>,
    ) -> Result<Vec<TextualPair>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("graph.fetch_overlap_candidates_textual"))?;

        let mut groups: Vec<((AtomKind, &str), Vec<AtomSide>)> = Vec::new();
        let selected = state
            .atoms
            .iter()
            .filter(|a| kind.map_or(true, |k| a.kind == k))
            .filter(|a| label.map_or(true, |l| a.label == l));
        for atom in selected {
            let side = AtomSide {
                atom_id: atom.id,
                text: atom.text.clone(),
                validity: state
                    .aspects
                    .get(&SubjectRef::Atom(atom.id))
                    .map(|a| a.validity),
            };
            let key = (atom.kind, atom.label.as_str());
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(side),
                None => groups.push((key, vec![side])),
            }
        }

        let mut pairs = Vec::new();
        for ((kind, label), members) in &groups {
            for left in members {
                for right in members {
                    pairs.push(TextualPair {
                        kind: *kind,
                        label: (*label).to_string(),
                        left: left.clone(),
                        right: right.clone(),
                    });
                }
            }
        }
        Ok(pairs)
    }

    fn resolve_labels_by_substring(&self, text: &str, k: usize) -> Result<Vec<AtomId>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("graph.resolve_labels_by_substring"))?;
        let needle = text.to_lowercase();
        let mut matches: Vec<&Atom> = state
            .atoms
            .iter()
            .filter(|a| a.label.to_lowercase().contains(&needle))
            .collect();
        // Stable: equal lengths keep insertion order.
        matches.sort_by_key(|a| a.label.chars().count());
        Ok(matches.into_iter().take(k).map(|a| a.id).collect())
    }

    fn fetch_neighborhood(
        &self,
        ids: &[AtomId],
        hops: usize,
        predicates: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<Edge>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let state = self.state.read().map_err(|_| lock_err("graph.fetch_neighborhood"))?;
        let allowed = |f: &Fact| predicates.map_or(true, |ps| ps.iter().any(|p| *p == f.predicate));
        let first_hop = state
            .facts
            .iter()
            .filter(|f| ids.contains(&f.src))
            .filter(|f| allowed(*f));

        let mut edges = Vec::new();
        for f1 in first_hop {
            if hops <= 1 {
                if edges.len() >= limit {
                    break;
                }
                edges.push(Edge {
                    src_label: state.atom(f1.src)?.label.clone(),
                    predicate: f1.predicate.clone(),
                    dst_label: state.atom(f1.dst)?.label.clone(),
                });
                continue;
            }
            // Two-hop paths are reported as (first source, first predicate, final target).
            for f2 in state.facts.iter().filter(|f2| f2.src == f1.dst) {
                if edges.len() >= limit {
                    return Ok(edges);
                }
                edges.push(Edge {
                    src_label: state.atom(f1.src)?.label.clone(),
                    predicate: f1.predicate.clone(),
                    dst_label: state.atom(f2.dst)?.label.clone(),
                });
            }
        }
        Ok(edges)
    }
}
