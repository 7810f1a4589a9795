//! Belief → confidence scoring.
//!
//! The stored base belief is remapped onto a logit-like range centred on 0.5,
//! nudged by an exponential recency term, and squashed with a saturating
//! sigmoid:
//!
//! ```text
//! evidence = (b - 0.5) * 6
//! recency  = 0.5 ^ (|now - observed_at| / half_life)      (0 if unobserved)
//! x        = w_evidence * evidence + w_recency * recency
//! conf     = sigmoid(x)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lower bound applied to the half-life before dividing by it.
pub const MIN_HALF_LIFE_DAYS: f64 = 1e-6;

/// Beyond this magnitude the sigmoid is pinned to 0 or 1.
pub const SIGMOID_SATURATION: f64 = 50.0;

const EVIDENCE_SCALE: f64 = 6.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Weights for the confidence model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeliefConfig {
    pub w_evidence: f64,
    /// Small nudge toward fresh observations.
    pub w_recency: f64,
    pub recency_half_life_days: f64,
}

impl Default for BeliefConfig {
    fn default() -> Self {
        Self {
            w_evidence: 1.0,
            w_recency: 0.25,
            recency_half_life_days: 365.0,
        }
    }
}

/// The weights that produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeliefWeights {
    pub w_evidence: f64,
    pub w_recency: f64,
}

/// Every term of a confidence computation, for audit via the explain trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeliefBreakdown {
    pub base_belief: f64,
    pub evidence_score: f64,
    pub recency: f64,
    pub weights: BeliefWeights,
    /// The pre-sigmoid value `x`.
    pub logit: f64,
}

/// Logistic function with explicit saturation.
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    if x > SIGMOID_SATURATION {
        return 1.0;
    }
    if x < -SIGMOID_SATURATION {
        return 0.0;
    }
    1.0 / (1.0 + (-x).exp())
}

/// Exponential recency decay: 1.0 at zero elapsed time, 0.5 after one half-life.
///
/// Elapsed time is taken as an absolute value, so observations in the future
/// decay the same way as observations in the past.
#[must_use]
pub fn recency(
    observed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    half_life_days: f64,
) -> f64 {
    let Some(observed_at) = observed_at else {
        return 0.0;
    };
    #[allow(clippy::cast_precision_loss)]
    let elapsed_days = (now - observed_at).num_milliseconds().unsigned_abs() as f64 / MILLIS_PER_DAY;
    0.5_f64
        .powf(elapsed_days / half_life_days.max(MIN_HALF_LIFE_DAYS))
        .clamp(0.0, 1.0)
}

/// Computes `(confidence, breakdown)` for one fact.
///
/// # Examples
///
/// ```
/// use cnsql::belief::{compute, BeliefConfig};
/// use chrono::Utc;
///
/// let (conf, terms) = compute(Some(0.5), None, Utc::now(), &BeliefConfig::default());
/// assert_eq!(terms.recency, 0.0);
/// assert!((conf - 0.5).abs() < 1e-12);
/// ```
#[must_use]
pub fn compute(
    base_belief: Option<f64>,
    observed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &BeliefConfig,
) -> (f64, BeliefBreakdown) {
    let b = base_belief.unwrap_or(0.0);
    let rec = recency(observed_at, now, config.recency_half_life_days);
    let evidence_score = (b - 0.5) * EVIDENCE_SCALE;
    let x = config.w_evidence * evidence_score + config.w_recency * rec;

    let breakdown = BeliefBreakdown {
        base_belief: b,
        evidence_score,
        recency: rec,
        weights: BeliefWeights {
            w_evidence: config.w_evidence,
            w_recency: config.w_recency,
        },
        logit: x,
    };
    (sigmoid(x), breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn sigmoid_extremes_and_midpoint() {
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert_eq!(sigmoid(f64::INFINITY), 1.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn recency_none_is_exactly_zero() {
        assert_eq!(recency(None, Utc::now(), 365.0), 0.0);
        assert_eq!(recency(None, Utc::now(), 0.0), 0.0);
    }

    #[test]
    fn recency_at_zero_elapsed_is_one() {
        let now = Utc::now();
        assert!((recency(Some(now), now, 10.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn recency_at_half_life_is_half() {
        let now = Utc::now();
        let r = recency(Some(now - Duration::days(10)), now, 10.0);
        assert!((r - 0.5).abs() < 0.05);
    }

    #[test]
    fn recency_is_symmetric_in_time() {
        let now = Utc::now();
        let past = recency(Some(now - Duration::days(3)), now, 10.0);
        let future = recency(Some(now + Duration::days(3)), now, 10.0);
        assert!((past - future).abs() < 1e-12);
    }

    #[test]
    fn recency_very_old_tends_to_zero() {
        let now = Utc::now();
        let r = recency(Some(now - Duration::days(10_000)), now, 10.0);
        assert!((0.0..=0.01).contains(&r));
    }

    #[test]
    fn recency_zero_half_life_does_not_divide_by_zero() {
        let now = Utc::now();
        let r = recency(Some(now - Duration::days(1)), now, 0.0);
        assert!(r.is_finite());
        assert_eq!(r, 0.0);
    }

    #[test]
    fn compute_absent_belief_reads_as_zero() {
        let (conf, terms) = compute(None, None, Utc::now(), &BeliefConfig::default());
        assert_eq!(terms.base_belief, 0.0);
        assert_eq!(terms.evidence_score, -3.0);
        assert!((conf - sigmoid(-3.0)).abs() < 1e-12);
    }

    #[test]
    fn compute_breakdown_is_consistent() {
        let cfg = BeliefConfig::default();
        let now = Utc::now();
        let (conf, terms) = compute(Some(0.95), Some(now), now, &cfg);
        assert!((terms.evidence_score - 2.7).abs() < 1e-9);
        assert!((terms.recency - 1.0).abs() < 1e-12);
        assert!((terms.logit - (2.7 + 0.25)).abs() < 1e-9);
        assert_eq!(terms.weights.w_evidence, 1.0);
        assert_eq!(terms.weights.w_recency, 0.25);
        assert!((conf - sigmoid(terms.logit)).abs() < 1e-12);
    }

    #[test]
    fn compute_custom_weights() {
        let cfg = BeliefConfig {
            w_evidence: 2.0,
            w_recency: 0.0,
            recency_half_life_days: 1.0,
        };
        let now = Utc::now();
        let (_, terms) = compute(Some(0.75), Some(now), now, &cfg);
        assert!((terms.logit - 3.0).abs() < 1e-9);
    }

    #[test]
    fn compute_saturates_large_weights() {
        let cfg = BeliefConfig {
            w_evidence: 1e6,
            ..BeliefConfig::default()
        };
        let now = Utc::now();
        assert_eq!(compute(Some(1.0), None, now, &cfg).0, 1.0);
        assert_eq!(compute(Some(0.0), None, now, &cfg).0, 0.0);
    }

    #[test]
    fn breakdown_serializes_all_terms() {
        let (_, terms) = compute(Some(0.5), None, Utc::now(), &BeliefConfig::default());
        let json = serde_json::to_value(terms).unwrap();
        for key in ["base_belief", "evidence_score", "recency", "weights", "logit"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json["weights"].get("w_evidence").is_some());
    }
}
