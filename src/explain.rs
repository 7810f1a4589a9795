//! Per-stage timing and metadata for the explain trace.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::belief::BeliefBreakdown;
use crate::query::Stage;

/// One timed pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    pub name: String,
    pub ms: f64,
    pub extra: Map<String, Value>,
}

/// The trace attached to a response when the query asked for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainReport {
    pub total_ms: f64,
    pub steps: Vec<StageTrace>,
}

impl ExplainReport {
    /// The trace of a named stage, if it ran.
    #[must_use]
    pub fn step(&self, stage: Stage) -> Option<&StageTrace> {
        self.steps.iter().find(|s| s.name == stage.as_str())
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

/// Collects stage traces over one pipeline run.
///
/// Created when the run starts; [`finish`](Self::finish) measures the total.
#[derive(Debug)]
pub struct ExplainCollector {
    started: Instant,
    steps: Vec<StageTrace>,
}

impl Default for ExplainCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ExplainCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            steps: Vec::with_capacity(Stage::ORDER.len()),
        }
    }

    /// Records a stage with an externally measured duration.
    pub fn record(&mut self, stage: Stage, ms: f64, extra: Map<String, Value>) {
        tracing::debug!(stage = %stage, ms, "stage complete");
        self.steps.push(StageTrace {
            name: stage.as_str().to_string(),
            ms,
            extra,
        });
    }

    /// Runs `f` as `stage` and records its wall-clock time and metadata.
    ///
    /// A failing stage is not recorded; the error is returned unchanged.
    pub fn time<T, E, F>(&mut self, stage: Stage, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<(T, Map<String, Value>), E>,
    {
        let started = Instant::now();
        let (value, extra) = f()?;
        self.record(stage, elapsed_ms(started), extra);
        Ok(value)
    }

    #[must_use]
    pub fn finish(self) -> ExplainReport {
        ExplainReport {
            total_ms: elapsed_ms(self.started),
            steps: self.steps,
        }
    }
}

/// Running totals over scored items.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BeliefAggregate {
    pub count: usize,
    pub sum_base: f64,
    pub sum_conf: f64,
    pub sum_recency: f64,
}

/// Means over a non-empty [`BeliefAggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeliefAverages {
    pub avg_base_belief: f64,
    pub avg_confidence: f64,
    pub avg_recency: f64,
}

impl BeliefAggregate {
    /// Fold step: adds one scored item.
    #[must_use]
    pub fn add(self, confidence: f64, terms: &BeliefBreakdown) -> Self {
        Self {
            count: self.count + 1,
            sum_base: self.sum_base + terms.base_belief,
            sum_conf: self.sum_conf + confidence,
            sum_recency: self.sum_recency + terms.recency,
        }
    }

    /// Averages, or `None` when nothing was counted.
    #[must_use]
    pub fn averages(&self) -> Option<BeliefAverages> {
        if self.count == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.count as f64;
        Some(BeliefAverages {
            avg_base_belief: self.sum_base / n,
            avg_confidence: self.sum_conf / n,
            avg_recency: self.sum_recency / n,
        })
    }

    /// Writes the averages into stage metadata; writes nothing when empty.
    pub fn write_averages(&self, extra: &mut Map<String, Value>) {
        if let Some(avg) = self.averages() {
            extra.insert("avg_base_belief".into(), json!(avg.avg_base_belief));
            extra.insert("avg_confidence".into(), json!(avg.avg_confidence));
            extra.insert("avg_recency".into(), json!(avg.avg_recency));
        }
    }
}
