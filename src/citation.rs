//! Citation enforcement.
//!
//! A candidate is only scored and emitted if it carries provenance with a
//! non-empty `source_id` or `uri`. Uncited candidates are dropped silently;
//! the only trace they leave is a stage counter.

use crate::aspect::Provenance;
use crate::storage::FactCandidate;

/// True if the provenance payload satisfies the citation contract.
#[must_use]
pub fn has_citation(provenance: Option<&Provenance>) -> bool {
    provenance.is_some_and(Provenance::is_cited)
}

/// Candidate predicate form of [`has_citation`].
#[must_use]
pub fn is_cited(candidate: &FactCandidate) -> bool {
    has_citation(candidate.provenance.as_ref())
}

/// Splits candidates into the cited ones and a count of those dropped.
pub fn enforce<I>(candidates: I) -> (Vec<FactCandidate>, usize)
where
    I: IntoIterator<Item = FactCandidate>,
{
    let mut dropped = 0usize;
    let cited = candidates
        .into_iter()
        .filter(|c| {
            let keep = is_cited(c);
            if !keep {
                dropped += 1;
                tracing::trace!(fact_id = %c.fact_id, "dropping uncited candidate");
            }
            keep
        })
        .collect();
    (cited, dropped)
}

/// The provenance record emitted for a cited candidate.
///
/// A record that only has a `uri` gets `fact:<id>` as its `source_id`, so
/// every emitted record names its origin.
#[must_use]
pub fn emitted_provenance(candidate: &FactCandidate) -> Vec<Provenance> {
    let Some(stored) = candidate.provenance.as_ref().filter(|p| p.is_cited()) else {
        return Vec::new();
    };
    let mut record = stored.clone();
    if record.source_id.as_deref().map_or(true, |s| s.trim().is_empty()) {
        record.source_id = Some(format!("fact:{}", candidate.fact_id));
    }
    vec![record]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::FactId;
    use crate::time::ValidityInterval;

    fn candidate(provenance: Option<Provenance>) -> FactCandidate {
        FactCandidate {
            fact_id: FactId::new(),
            subject_label: "s".to_string(),
            predicate: "p".to_string(),
            object_label: "o".to_string(),
            validity: ValidityInterval::open(),
            base_belief: Some(0.9),
            observed_at: None,
            provenance,
        }
    }

    #[test]
    fn absent_provenance_is_not_cited() {
        assert!(!has_citation(None));
        assert!(!is_cited(&candidate(None)));
    }

    #[test]
    fn hash_only_provenance_is_not_cited() {
        let prov = Provenance {
            hash: Some("deadbeef".to_string()),
            line_span: Some("1-2".to_string()),
            ..Provenance::default()
        };
        assert!(!has_citation(Some(&prov)));
    }

    #[test]
    fn enforce_counts_dropped() {
        let (kept, dropped) = enforce(vec![
            candidate(Some(Provenance::from_source("a"))),
            candidate(None),
            candidate(Some(Provenance::default())),
            candidate(Some(Provenance::from_uri("https://x"))),
        ]);
        assert_eq!(kept.len(), 2);
        assert_eq!(dropped, 2);
        assert!(kept.iter().all(is_cited));
    }

    #[test]
    fn emitted_provenance_keeps_source_id() {
        let c = candidate(Some(Provenance::from_source("doc-7").with_uri("https://x")));
        let emitted = emitted_provenance(&c);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].source_id.as_deref(), Some("doc-7"));
    }

    #[test]
    fn emitted_provenance_defaults_source_id_from_fact() {
        let c = candidate(Some(Provenance::from_uri("https://x")));
        let emitted = emitted_provenance(&c);
        assert_eq!(emitted[0].source_id, Some(format!("fact:{}", c.fact_id)));
        assert_eq!(emitted[0].uri.as_deref(), Some("https://x"));
    }

    #[test]
    fn emitted_provenance_empty_for_uncited() {
        assert!(emitted_provenance(&candidate(None)).is_empty());
    }
}
