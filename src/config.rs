//! Process-wide, read-only configuration.
//!
//! A [`CoreConfig`] is built once at startup (usually via
//! [`CoreConfig::from_env`]) and handed to the [`QueryEngine`](crate::QueryEngine),
//! which threads it explicitly into the temporal filter and belief engine.

use serde::{Deserialize, Serialize};

use crate::belief::BeliefConfig;
use crate::error::ValidationError;

/// Environment variable selecting the inclusive end-boundary policy (`"1"`).
pub const ENV_ASOF_END_INCLUSIVE: &str = "CNS_ASOF_END_INCLUSIVE";
/// Environment variable overriding the evidence weight.
pub const ENV_W_EVIDENCE: &str = "CNS_BELIEF_W_EVIDENCE";
/// Environment variable overriding the recency weight.
pub const ENV_W_RECENCY: &str = "CNS_BELIEF_W_RECENCY";
/// Environment variable overriding the recency half-life in days.
pub const ENV_HALF_LIFE_DAYS: &str = "CNS_BELIEF_HALF_LIFE_DAYS";
/// Environment variable overriding the maximum number of results.
pub const ENV_RESULT_LIMIT: &str = "CNS_RESULT_LIMIT";

/// Default maximum number of result rows per query.
pub const DEFAULT_RESULT_LIMIT: usize = 100;

/// How the end of a validity interval is compared with an as-of instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndBoundary {
    /// `valid_to > ts`: a fact ending exactly at the instant is no longer visible.
    #[default]
    Exclusive,

    /// `valid_to >= ts`: a fact ending exactly at the instant is still visible.
    Inclusive,
}

impl std::fmt::Display for EndBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exclusive => write!(f, "exclusive"),
            Self::Inclusive => write!(f, "inclusive"),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// End-boundary policy for as-of filtering.
    pub end_boundary: EndBoundary,

    /// Default belief weights.
    pub belief: BeliefConfig,

    /// Maximum number of results returned by one query.
    pub result_limit: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            end_boundary: EndBoundary::Exclusive,
            belief: BeliefConfig::default(),
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

impl CoreConfig {
    /// Returns a copy with the given end-boundary policy.
    #[must_use]
    pub fn with_end_boundary(mut self, end_boundary: EndBoundary) -> Self {
        self.end_boundary = end_boundary;
        self
    }

    /// Returns a copy with the given belief weights.
    #[must_use]
    pub fn with_belief(mut self, belief: BeliefConfig) -> Self {
        self.belief = belief;
        self
    }

    /// Returns a copy with the given result limit.
    #[must_use]
    pub fn with_result_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit;
        self
    }

    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidConfig` if a numeric override cannot be
    /// parsed, or any error from [`CoreConfig::validate`].
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Unset keys keep their defaults.
    ///
    /// # Errors
    ///
    /// See [`CoreConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if lookup(ENV_ASOF_END_INCLUSIVE).as_deref().map(str::trim) == Some("1") {
            config.end_boundary = EndBoundary::Inclusive;
        }
        if let Some(v) = parse_var::<f64>(&lookup, ENV_W_EVIDENCE)? {
            config.belief.w_evidence = v;
        }
        if let Some(v) = parse_var::<f64>(&lookup, ENV_W_RECENCY)? {
            config.belief.w_recency = v;
        }
        if let Some(v) = parse_var::<f64>(&lookup, ENV_HALF_LIFE_DAYS)? {
            config.belief.recency_half_life_days = v;
        }
        if let Some(v) = parse_var::<usize>(&lookup, ENV_RESULT_LIMIT)? {
            config.result_limit = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// - `HalfLifeNotPositive` if the half-life is not a positive finite number
    /// - `InvalidConfig` if a weight is not finite or the result limit is zero
    pub fn validate(&self) -> Result<(), ValidationError> {
        let half_life = self.belief.recency_half_life_days;
        if !half_life.is_finite() || half_life <= 0.0 {
            return Err(ValidationError::HalfLifeNotPositive { value: half_life });
        }
        for (key, w) in [
            (ENV_W_EVIDENCE, self.belief.w_evidence),
            (ENV_W_RECENCY, self.belief.w_recency),
        ] {
            if !w.is_finite() {
                return Err(ValidationError::InvalidConfig {
                    key: key.to_string(),
                    value: w.to_string(),
                    reason: "weight must be finite".to_string(),
                });
            }
        }
        if self.result_limit == 0 {
            return Err(ValidationError::InvalidConfig {
                key: ENV_RESULT_LIMIT.to_string(),
                value: "0".to_string(),
                reason: "limit must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ValidationError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|e| ValidationError::InvalidConfig {
            key: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}
