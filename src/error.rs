//! Error types for cnsql.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! specific conditions. Parsing never produces an error; everything here
//! comes from writes into a store, configuration, timestamp interpretation
//! or the store itself.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::storage::StorageError;

/// Validation errors that occur during input validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Belief value {value} is out of range [0.0, 1.0]")]
    BeliefOutOfRange {
        value: f64,
    },

    #[error("Invalid validity interval: from ({from}) must not be after to ({to})")]
    InvalidInterval {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    #[error("Atom label cannot be empty")]
    EmptyLabel,

    #[error("Predicate cannot be empty")]
    EmptyPredicate,

    #[error("Hop count must be at least 1, got {hops}")]
    InvalidHops {
        hops: usize,
    },

    #[error("Recency half-life must be positive, got {value}")]
    HalfLifeNotPositive {
        value: f64,
    },

    #[error("Invalid configuration value for '{key}': '{value}' ({reason})")]
    InvalidConfig {
        key: String,
        value: String,
        reason: String,
    },
}

/// Execution errors that occur while running a query.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Invalid ASOF timestamp '{value}': {reason}")]
    InvalidAsOf {
        value: String,
        reason: String,
    },

    #[error("Empty query")]
    EmptyQuery,
}

/// Top-level error type for cnsql.
#[derive(Debug, Error)]
pub enum CnsError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl CnsError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this error came from the fact store.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if this error is retryable.
    ///
    /// Always false: a store failure aborts the query and the engine never
    /// retries on the caller's behalf.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        false
    }
}

/// Result type alias for cnsql operations.
pub type CnsResult<T> = Result<T, CnsError>;
