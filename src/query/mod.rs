//! The query front-end: a lenient textual query language and its planner.
//!
//! ```text
//! [MATCH] [label="<value>" | LABEL <token>] [PREDICATE <token>] [ASOF <token>]
//!         [BELIEF (>=|>) <float>] [RETURN] [EXPLAIN] [PROVENANCE]
//! ```
//!
//! Every clause is optional, keywords are case-insensitive and clause order
//! does not matter. Parsing is total: malformed clauses leave fields unset.

mod parser;
mod planner;

pub use parser::{parse, QueryIntent, QueryIntentBuilder};
pub use planner::{plan, Plan, PlanStage, Stage};
