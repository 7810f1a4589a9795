//! Descriptive stage planning.
//!
//! The plan always lists the same five stages in the same order. Cost hints
//! are naive and exist only for the explain trace; they never reorder or
//! prune stages.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::query::QueryIntent;

/// A named pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Planner,
    /// Reserved for an approximate-nearest-neighbour shortlist; a no-op today.
    AnnShortlist,
    TemporalMask,
    GraphTraverse,
    BeliefCompute,
}

impl Stage {
    /// Fixed execution order.
    pub const ORDER: [Self; 5] = [
        Self::Planner,
        Self::AnnShortlist,
        Self::TemporalMask,
        Self::GraphTraverse,
        Self::BeliefCompute,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::AnnShortlist => "ann_shortlist",
            Self::TemporalMask => "temporal_mask",
            Self::GraphTraverse => "graph_traverse",
            Self::BeliefCompute => "belief_compute",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One planned stage with its informational hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStage {
    pub stage: Stage,
    pub hints: Map<String, Value>,
}

/// Ordered stage list for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub stages: Vec<PlanStage>,
}

impl Plan {
    /// Hints attached to a stage, if planned.
    #[must_use]
    pub fn hints(&self, stage: Stage) -> Option<&Map<String, Value>> {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| &s.hints)
    }

    /// Human-readable chain of the active filters, or `"No-op plan"`.
    #[must_use]
    pub fn describe(&self) -> String {
        let planner = self.hints(Stage::Planner);
        let get = |key: &str| planner.and_then(|h| h.get(key));
        let text = |key: &str| get(key).and_then(Value::as_str).map(str::to_string);

        let mut steps = Vec::new();
        if let Some(asof) = text("asof") {
            steps.push(format!("Temporal mask at {asof}"));
        }
        if let Some(predicate) = text("predicate") {
            steps.push(format!("Graph expand via predicate '{predicate}'"));
        }
        if let Some(label) = text("label") {
            steps.push(format!("Filter by label == '{label}'"));
        }
        if let Some(threshold) = get("belief_ge").and_then(Value::as_f64) {
            steps.push(format!("Belief >= {threshold}"));
        }

        if steps.is_empty() {
            "No-op plan".to_string()
        } else {
            steps.join(" -> ")
        }
    }
}

/// Builds the stage plan for an intent.
///
/// # Examples
///
/// ```
/// use cnsql::query::{parse, plan, Stage};
///
/// let p = plan(&parse("LABEL FrameworkX"));
/// let hints = p.hints(Stage::Planner).unwrap();
/// assert_eq!(hints["est_base"], 1);
/// assert_eq!(hints["est_fanout"], 5);
/// ```
#[must_use]
pub fn plan(intent: &QueryIntent) -> Plan {
    let mut planner = Map::new();
    if let Some(label) = &intent.label {
        planner.insert("label".into(), json!(label));
    }
    if let Some(predicate) = &intent.predicate {
        planner.insert("predicate".into(), json!(predicate));
    }
    if let Some(asof) = &intent.asof {
        planner.insert("asof".into(), json!(asof));
    }
    if let Some(threshold) = intent.belief_ge {
        planner.insert("belief_ge".into(), json!(threshold));
    }
    let est_base = if intent.label.is_some() { 1 } else { 10 };
    let est_fanout = if intent.predicate.is_some() { 2 } else { 5 };
    planner.insert("est_base".into(), json!(est_base));
    planner.insert("est_fanout".into(), json!(est_fanout));

    let stages = Stage::ORDER
        .into_iter()
        .map(|stage| {
            let hints = match stage {
                Stage::Planner => planner.clone(),
                Stage::TemporalMask => {
                    let mut m = Map::new();
                    m.insert("asof".into(), json!(intent.asof));
                    m
                }
                Stage::GraphTraverse => {
                    let mut m = Map::new();
                    m.insert("est_rows".into(), json!(est_base * est_fanout));
                    m
                }
                Stage::AnnShortlist | Stage::BeliefCompute => Map::new(),
            };
            PlanStage { stage, hints }
        })
        .collect();

    Plan { stages }
}
