//! Query execution.
//!
//! [`QueryEngine`] runs one read-only pipeline per query over a shared
//! [`FactStore`]: plan, (reserved) shortlist, temporal mask, traversal and
//! belief scoring. Each stage feeds the next; a store failure aborts the
//! whole query and no partial result is returned.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::aspect::Provenance;
use crate::belief::{self, BeliefBreakdown};
use crate::citation;
use crate::config::CoreConfig;
use crate::contradiction::ContradictionDetector;
use crate::error::{CnsError, CnsResult, ExecutionError};
use crate::explain::{BeliefAggregate, ExplainCollector, ExplainReport};
use crate::query::{self, QueryIntent, Stage};
use crate::storage::{FactCandidate, FactStore, StorageError};
use crate::time::{is_visible, parse_instant};

/// One resolved fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    pub subject_label: String,
    pub predicate: String,
    pub object_label: String,
    pub confidence: f64,
    /// Never empty.
    pub provenance: Vec<Provenance>,
    /// Terms behind `confidence`. Kept off the wire; the explain trace carries them.
    #[serde(skip)]
    pub belief: Option<BeliefBreakdown>,
}

/// A query response: results plus the optional explain trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<ResultItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explain: Option<ExplainReport>,
}

/// Candidates surviving `graph_traverse`, with its counters.
struct Traversal {
    candidates: Vec<FactCandidate>,
    rows: usize,
    masked: usize,
    below_threshold: usize,
}

/// The query engine.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn FactStore>,
    config: CoreConfig,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl QueryEngine {
    /// Creates an engine with the default configuration.
    #[must_use]
    pub fn new(store: Arc<dyn FactStore>) -> Self {
        Self::with_config(store, CoreConfig::default())
    }

    #[must_use]
    pub fn with_config(store: Arc<dyn FactStore>, config: CoreConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn FactStore {
        self.store.as_ref()
    }

    /// A contradiction detector over the same store.
    #[must_use]
    pub fn detector(&self) -> ContradictionDetector<'_> {
        ContradictionDetector::new(self.store.as_ref())
    }

    fn storage_err(err: StorageError) -> CnsError {
        tracing::warn!(error = %err, "fact store call failed; aborting query");
        CnsError::Storage(err)
    }

    /// Parses and executes a textual query.
    ///
    /// # Errors
    ///
    /// - `ExecutionError::EmptyQuery` for blank input
    /// - anything [`execute`](Self::execute) returns
    pub fn cql(&self, text: &str) -> CnsResult<QueryResponse> {
        if text.trim().is_empty() {
            return Err(ExecutionError::EmptyQuery.into());
        }
        self.execute(&query::parse(text))
    }

    /// Executes an intent, scoring recency against the current time.
    ///
    /// # Errors
    ///
    /// - `ExecutionError::InvalidAsOf` if the ASOF value is not a timestamp
    /// - `CnsError::Storage` if the fact store fails
    pub fn execute(&self, intent: &QueryIntent) -> CnsResult<QueryResponse> {
        self.execute_at(intent, Utc::now())
    }

    /// Executes an intent with an explicit "now" for recency scoring.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub fn execute_at(&self, intent: &QueryIntent, now: DateTime<Utc>) -> CnsResult<QueryResponse> {
        let mut trace = ExplainCollector::new();

        let plan = trace.time(Stage::Planner, || {
            let plan = query::plan(intent);
            let extra = plan.hints(Stage::Planner).cloned().unwrap_or_default();
            Ok::<_, CnsError>((plan, extra))
        })?;
        tracing::debug!(plan = %plan.describe(), "planned query");

        // No shortlist index yet; the stage is recorded so traces keep a stable shape.
        trace.record(Stage::AnnShortlist, 0.0, Map::new());

        let asof = trace.time(Stage::TemporalMask, || {
            let asof = intent.asof.as_deref().map(parse_instant).transpose()?;
            let mut extra = Map::new();
            extra.insert("asof".into(), json!(intent.asof));
            extra.insert("end_boundary".into(), json!(self.config.end_boundary));
            Ok::<_, CnsError>((asof, extra))
        })?;

        let traversal = trace.time(Stage::GraphTraverse, || {
            let traversal = self.traverse(intent, asof)?;
            let mut extra = Map::new();
            extra.insert("rows".into(), json!(traversal.rows));
            extra.insert("masked".into(), json!(traversal.masked));
            extra.insert("below_threshold".into(), json!(traversal.below_threshold));
            Ok::<_, CnsError>((traversal, extra))
        })?;

        let results = trace.time(Stage::BeliefCompute, || {
            Ok::<_, CnsError>(self.score(traversal.candidates, now))
        })?;

        let report = trace.finish();
        tracing::debug!(
            results = results.len(),
            total_ms = report.total_ms,
            "query complete"
        );
        Ok(QueryResponse {
            results,
            explain: intent.explain.then_some(report),
        })
    }

    fn traverse(
        &self,
        intent: &QueryIntent,
        asof: Option<DateTime<Utc>>,
    ) -> CnsResult<Traversal> {
        let fetched = self
            .store
            .fetch_facts(intent.label.as_deref(), intent.predicate.as_deref())
            .map_err(Self::storage_err)?;
        let rows = fetched.len();

        let boundary = self.config.end_boundary;
        let visible: Vec<FactCandidate> = fetched
            .into_iter()
            .filter(|c| is_visible(asof, &c.validity, boundary))
            .collect();
        let masked = rows - visible.len();

        let threshold = intent.belief_ge;
        let meets_threshold =
            |c: &FactCandidate| threshold.map_or(true, |t| c.base_belief.unwrap_or(0.0) >= t);
        let candidates: Vec<FactCandidate> = visible.into_iter().filter(meets_threshold).collect();
        let below_threshold = rows - masked - candidates.len();

        tracing::debug!(rows, masked, below_threshold, "graph traversal");
        Ok(Traversal {
            candidates,
            rows,
            masked,
            below_threshold,
        })
    }

    fn score(
        &self,
        candidates: Vec<FactCandidate>,
        now: DateTime<Utc>,
    ) -> (Vec<ResultItem>, Map<String, Value>) {
        let (cited, uncited) = citation::enforce(candidates);

        let scored: Vec<(FactCandidate, f64, BeliefBreakdown)> = cited
            .into_iter()
            .map(|c| {
                let (confidence, terms) =
                    belief::compute(c.base_belief, c.observed_at, now, &self.config.belief);
                (c, confidence, terms)
            })
            .collect();

        let aggregate = scored
            .iter()
            .fold(BeliefAggregate::default(), |acc, (_, conf, terms)| acc.add(*conf, terms));

        let belief_terms: Map<String, Value> = scored
            .iter()
            .map(|(c, conf, terms)| {
                (
                    c.fact_id.to_string(),
                    json!({ "before": terms.base_belief, "after": conf, "terms": terms }),
                )
            })
            .collect();

        let mut results: Vec<ResultItem> = scored
            .into_iter()
            .map(|(c, confidence, terms)| ResultItem {
                provenance: citation::emitted_provenance(&c),
                subject_label: c.subject_label,
                predicate: c.predicate,
                object_label: c.object_label,
                confidence,
                belief: Some(terms),
            })
            .collect();
        results.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });
        results.truncate(self.config.result_limit);

        let mut extra = Map::new();
        extra.insert("items".into(), json!(aggregate.count));
        extra.insert("uncited".into(), json!(uncited));
        extra.insert("belief_terms".into(), Value::Object(belief_terms));
        aggregate.write_averages(&mut extra);
        (results, extra)
    }
}
