//! # cnsql - point-in-time fact resolution over a bitemporal knowledge graph
//!
//! cnsql answers "what was true about X at time T, how much should we
//! believe it, and where did it come from?" over a graph of labeled atoms
//! joined by predicate-typed facts. Each atom or fact may carry one aspect:
//! a validity interval, an observation time, a stored belief and provenance.
//!
//! ## Core Concepts
//!
//! - **Query intent**: the parsed form of a lenient textual query
//! - **As-of filter**: keeps facts whose validity interval contains an instant
//! - **Citation contract**: a fact without provenance is never returned
//! - **Confidence**: stored belief adjusted for recency and squashed to `[0, 1]`
//! - **Contradiction**: two claims about the same thing that overlap in time but disagree
//! - **Explain trace**: per-stage timings and counters attached on request
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use cnsql::{demo, InMemoryGraph, QueryEngine};
//!
//! let graph = InMemoryGraph::new();
//! demo::seed_demo(&graph)?;
//!
//! let engine = QueryEngine::new(Arc::new(graph));
//! let response = engine.cql("LABEL FrameworkX PREDICATE supports_tls ASOF 2024-12-31T12:00:00Z")?;
//! assert_eq!(response.results[0].object_label, "TLS1.2");
//! # Ok::<(), cnsql::CnsError>(())
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Data model
pub mod aspect;
pub mod atom;
pub mod error;
pub mod fact;
pub mod time;

// Pipeline
pub mod belief;
pub mod citation;
pub mod config;
pub mod engine;
pub mod explain;
pub mod query;

// Storage and peripheral reads
pub mod contradiction;
pub mod demo;
pub mod neighborhood;
pub mod storage;

pub use aspect::{Aspect, Provenance, SubjectRef};
pub use atom::{Atom, AtomId, AtomKind};
pub use belief::{BeliefBreakdown, BeliefConfig};
pub use config::{CoreConfig, EndBoundary};
pub use contradiction::{Contradiction, ContradictionDetector, ContradictionKind};
pub use engine::{QueryEngine, QueryResponse, ResultItem};
pub use error::{CnsError, CnsResult, ExecutionError, ValidationError};
pub use explain::{ExplainReport, StageTrace};
pub use fact::{Fact, FactId};
pub use neighborhood::{graph_neighborhood, GraphNeighborhood};
pub use query::{parse, plan, Plan, QueryIntent, Stage};
pub use storage::{FactStore, InMemoryGraph, StorageError};
pub use time::ValidityInterval;
