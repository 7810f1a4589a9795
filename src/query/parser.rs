//! Token-walk parser producing a [`QueryIntent`].

use serde::{Deserialize, Serialize};

/// Structured form of a query.
///
/// `asof` is kept as opaque text; it is interpreted (and may fail) only
/// when the query executes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
    pub label: Option<String>,
    pub predicate: Option<String>,
    pub asof: Option<String>,
    pub belief_ge: Option<f64>,
    pub explain: bool,
    pub provenance: bool,
}

impl Default for QueryIntent {
    fn default() -> Self {
        Self {
            label: None,
            predicate: None,
            asof: None,
            belief_ge: None,
            explain: true,
            provenance: true,
        }
    }
}

impl QueryIntent {
    /// Starts a builder with default flags.
    #[must_use]
    pub fn builder() -> QueryIntentBuilder {
        QueryIntentBuilder::default()
    }

    /// True if no filter clause is active.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.label.is_none()
            && self.predicate.is_none()
            && self.asof.is_none()
            && self.belief_ge.is_none()
    }
}

/// Accumulator for a [`QueryIntent`].
///
/// Used by the parser while walking tokens and by callers that want to
/// build an intent without going through text.
#[derive(Debug, Clone, Default)]
pub struct QueryIntentBuilder {
    intent: QueryIntent,
}

impl QueryIntentBuilder {
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.intent.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn predicate(mut self, predicate: impl Into<String>) -> Self {
        self.intent.predicate = Some(predicate.into());
        self
    }

    #[must_use]
    pub fn asof(mut self, asof: impl Into<String>) -> Self {
        self.intent.asof = Some(asof.into());
        self
    }

    #[must_use]
    pub fn belief_ge(mut self, threshold: f64) -> Self {
        self.intent.belief_ge = Some(threshold);
        self
    }

    /// Requests the explain report. It is requested by default.
    #[must_use]
    pub fn explain(mut self, explain: bool) -> Self {
        self.intent.explain = explain;
        self
    }

    /// Requests provenance in results. It is requested by default.
    #[must_use]
    pub fn provenance(mut self, provenance: bool) -> Self {
        self.intent.provenance = provenance;
        self
    }

    #[must_use]
    pub fn build(self) -> QueryIntent {
        self.intent
    }
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

/// Parses a free-text query. Never fails.
///
/// # Examples
///
/// ```
/// use cnsql::query::parse;
///
/// let q = parse(r#"MATCH label="X" BELIEF >= 0.7 RETURN"#);
/// assert_eq!(q.label.as_deref(), Some("X"));
/// assert_eq!(q.belief_ge, Some(0.7));
/// assert!(q.explain && q.provenance);
/// ```
#[must_use]
pub fn parse(query: &str) -> QueryIntent {
    let tokens: Vec<&str> = query.split_whitespace().collect();
    let mut out = QueryIntentBuilder::default();
    let mut i = 0;

    while i < tokens.len() {
        let tok = tokens[i];
        let upper = tok.to_ascii_uppercase();
        let next = tokens.get(i + 1).copied();

        i += match upper.as_str() {
            "LABEL" => match next {
                Some(value) => {
                    out = out.label(strip_quotes(value));
                    2
                }
                None => 1,
            },
            _ if upper.starts_with("LABEL=") => {
                let (_, value) = tok.split_once('=').unwrap_or((tok, ""));
                out = out.label(strip_quotes(value.trim()));
                1
            }
            "PREDICATE" => match next {
                Some(value) => {
                    out = out.predicate(value);
                    2
                }
                None => 1,
            },
            "ASOF" => match next {
                Some(value) => {
                    out = out.asof(value);
                    2
                }
                None => 1,
            },
            "BELIEF" => match (next, tokens.get(i + 2)) {
                (Some(">=" | ">"), Some(number)) => {
                    if let Some(threshold) = parse_threshold(number) {
                        out = out.belief_ge(threshold);
                    }
                    3
                }
                _ => 1,
            },
            "EXPLAIN" => {
                out = out.explain(true);
                1
            }
            "PROVENANCE" => {
                out = out.provenance(true);
                1
            }
            // MATCH, RETURN and anything unrecognized.
            _ => 1,
        };
    }

    out.build()
}

fn parse_threshold(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}
