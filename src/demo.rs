//! Demo data: a framework switching TLS versions at the start of 2025.

use chrono::{TimeZone, Utc};

use crate::aspect::{Aspect, Provenance};
use crate::atom::{AtomId, AtomKind};
use crate::error::{CnsError, CnsResult};
use crate::fact::FactId;
use crate::storage::InMemoryGraph;
use crate::time::ValidityInterval;

/// Source URI cited by every seeded fact.
pub const DEMO_URI: &str = "https://example.org/demo/tls-policy";

/// The as-of query the CLI runs when none is given.
pub const DEMO_QUERY: &str =
    "MATCH LABEL FrameworkX PREDICATE supports_tls ASOF 2025-06-01T00:00:00Z RETURN EXPLAIN PROVENANCE";

/// Fact ids created by [`seed_demo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoFacts {
    pub tls12: FactId,
    pub tls13: FactId,
}

/// Seeds `FrameworkX -supports_tls-> TLS1.2` (until 2025-01-01, belief 0.95)
/// and `-> TLS1.3` (from 2025-01-01, belief 0.98), both cited.
///
/// # Errors
///
/// Returns a storage error if any write fails.
pub fn seed_demo(graph: &InMemoryGraph) -> CnsResult<DemoFacts> {
    let cutoff = Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| CnsError::internal("demo cutoff is not a valid instant"))?;

    let framework = graph.upsert_atom(AtomKind::Entity, "FrameworkX", None)?;
    let tls12 = graph.upsert_atom(AtomKind::Concept, "TLS1.2", None)?;
    let tls13 = graph.upsert_atom(AtomKind::Concept, "TLS1.3", None)?;

    let link = |dst: AtomId, validity: ValidityInterval, belief: f64| -> CnsResult<FactId> {
        let id = graph.insert_fact(framework, dst, "supports_tls")?;
        let provenance = Provenance::from_source(format!("demo_seed:fact:{id}"))
            .with_uri(DEMO_URI)
            .with_fetched_at(Utc::now())
            .with_content_hash();
        let aspect = Aspect::new(validity)
            .observed_at(Utc::now())
            .belief(belief)
            .provenance(provenance);
        graph.set_aspect(id, aspect)?;
        Ok(id)
    };

    let facts = DemoFacts {
        tls12: link(tls12, ValidityInterval::until(cutoff), 0.95)?,
        tls13: link(tls13, ValidityInterval::starting_at(cutoff), 0.98)?,
    };
    tracing::info!(?facts, "seeded demo graph");
    Ok(facts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FactStore;

    #[test]
    fn seed_writes_two_cited_facts() {
        let graph = InMemoryGraph::new();
        let facts = seed_demo(&graph).unwrap();
        let rows = graph.fetch_facts(Some("FrameworkX"), Some("supports_tls")).unwrap();
        assert_eq!(rows.len(), 2);

        let prov = graph.aspect(facts.tls12).unwrap().unwrap().provenance.unwrap();
        assert_eq!(prov.source_id, Some(format!("demo_seed:fact:{}", facts.tls12)));
        assert_eq!(prov.uri.as_deref(), Some(DEMO_URI));
        assert!(prov.hash.is_some());
        assert!(prov.fetched_at.is_some());
    }

    #[test]
    fn reseeding_reuses_atoms() {
        let graph = InMemoryGraph::new();
        seed_demo(&graph).unwrap();
        seed_demo(&graph).unwrap();
        assert_eq!(graph.fact_count().unwrap(), 4);
        assert_eq!(graph.resolve_labels_by_substring("FrameworkX", 10).unwrap().len(), 1);
    }
}
