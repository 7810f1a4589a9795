use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};

use cnsql::contradiction::{TEXT_MISMATCH_PREDICATE, STORED_SNIPPET_CHARS};
use cnsql::{
    Aspect, Atom, AtomKind, ContradictionDetector, ContradictionKind, InMemoryGraph,
    ValidityInterval,
};

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn window(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> ValidityInterval {
    ValidityInterval::new(from, to).unwrap()
}

/// FrameworkX supports TLS1.2 through mid-2025 and TLS1.3 from 2025, plus a
/// non-overlapping SSL3 claim and a duplicate TLS1.3 edge.
fn overlapping_graph() -> InMemoryGraph {
    let g = InMemoryGraph::new();
    let fw = g.upsert_atom(AtomKind::Entity, "FrameworkX", None).unwrap();
    let t12 = g.upsert_atom(AtomKind::Concept, "TLS1.2", None).unwrap();
    let t13 = g.upsert_atom(AtomKind::Concept, "TLS1.3", None).unwrap();
    let ssl = g.upsert_atom(AtomKind::Concept, "SSL3", None).unwrap();
    let link = |dst, validity| {
        g.link_with_validity(fw, dst, "supports_tls", validity, Some(0.9), None)
            .unwrap();
    };
    link(t12, window(Some(at(2020, 1, 1)), Some(at(2025, 6, 1))));
    link(t13, window(Some(at(2025, 1, 1)), None));
    link(t13, window(Some(at(2025, 3, 1)), None));
    link(ssl, window(None, Some(at(2019, 1, 1))));
    g
}

#[test]
fn relational_reports_each_overlapping_pair_once() {
    let g = overlapping_graph();
    let found = ContradictionDetector::new(&g)
        .detect_relational(Some("FrameworkX"), Some("supports_tls"), 100)
        .unwrap();

    // TLS1.2 overlaps both TLS1.3 edges; TLS1.3 vs TLS1.3 shares an object; SSL3 overlaps nothing.
    assert_eq!(found.len(), 2);
    let mut seen = HashSet::new();
    for c in &found {
        assert_eq!(c.kind, ContradictionKind::Relational);
        assert_ne!(c.object1_id, c.object2_id);
        let key = if c.object1_label < c.object2_label {
            (c.object1_label.clone(), c.object2_label.clone(), c.overlap)
        } else {
            (c.object2_label.clone(), c.object1_label.clone(), c.overlap)
        };
        assert!(seen.insert(key), "duplicate report: {c:?}");
        assert!(c.overlap.to == Some(at(2025, 6, 1)));
        assert!(c.reason.starts_with("Same subject 'FrameworkX' has predicate 'supports_tls'"));
    }
    let starts: HashSet<_> = found.iter().map(|c| c.overlap.from).collect();
    assert_eq!(starts, HashSet::from([Some(at(2025, 1, 1)), Some(at(2025, 3, 1))]));
}

#[test]
fn relational_filters_and_limit() {
    let g = overlapping_graph();
    let detector = ContradictionDetector::new(&g);
    assert!(detector
        .detect_relational(Some("TLS1.2"), None, 100)
        .unwrap()
        .is_empty());
    assert!(detector
        .detect_relational(None, Some("other"), 100)
        .unwrap()
        .is_empty());
    assert_eq!(detector.detect_relational(None, None, 1).unwrap().len(), 1);
    assert!(detector.detect_relational(None, None, 0).unwrap().is_empty());
}

#[test]
fn demo_timeline_is_not_contradictory() {
    let g = InMemoryGraph::new();
    cnsql::demo::seed_demo(&g).unwrap();
    assert!(ContradictionDetector::new(&g).detect_all(100).unwrap().is_empty());
}

#[test]
fn textual_contradictions() {
    let g = InMemoryGraph::new();
    let long_text = "x".repeat(300);
    let a = g
        .insert_atom(Atom::new(AtomKind::Rule, "max_tls").unwrap().with_text(long_text.clone()))
        .unwrap();
    let b = g
        .insert_atom(Atom::new(AtomKind::Rule, "max_tls").unwrap().with_text("1.3"))
        .unwrap();
    // Same text: not a contradiction.
    g.insert_atom(Atom::new(AtomKind::Rule, "max_tls").unwrap().with_text("1.3"))
        .unwrap();
    // No text: never participates.
    g.insert_atom(Atom::new(AtomKind::Rule, "max_tls").unwrap()).unwrap();
    g.set_aspect(a, Aspect::new(window(Some(at(2024, 1, 1)), Some(at(2025, 1, 1)))))
        .unwrap();

    let found = ContradictionDetector::new(&g)
        .detect_textual(Some(AtomKind::Rule), Some("max_tls"), 100)
        .unwrap();
    // The long text conflicts with each "1.3" atom.
    assert_eq!(found.len(), 2);
    for c in &found {
        assert_eq!(c.kind, ContradictionKind::Textual);
        assert_eq!(c.predicate, TEXT_MISMATCH_PREDICATE);
        assert_eq!(c.subject_label, "max_tls");
        assert_eq!(c.subject_id, c.object1_id);
        let long_label = if c.object1_id == a { &c.object1_label } else { &c.object2_label };
        assert_eq!(long_label.len(), STORED_SNIPPET_CHARS);
        // The aspect-less side does not narrow the window.
        assert_eq!(c.overlap, window(Some(at(2024, 1, 1)), Some(at(2025, 1, 1))));
    }
    assert!(found.iter().any(|c| c.object1_id == b || c.object2_id == b));
}

#[test]
fn textual_requires_overlap_when_both_have_aspects() {
    let g = InMemoryGraph::new();
    let a = g
        .insert_atom(Atom::new(AtomKind::Concept, "policy").unwrap().with_text("old"))
        .unwrap();
    let b = g
        .insert_atom(Atom::new(AtomKind::Concept, "policy").unwrap().with_text("new"))
        .unwrap();
    g.set_aspect(a, Aspect::new(ValidityInterval::until(at(2025, 1, 1)))).unwrap();
    g.set_aspect(b, Aspect::new(ValidityInterval::starting_at(at(2025, 1, 1)))).unwrap();

    let detector = ContradictionDetector::new(&g);
    assert!(detector.detect_textual(None, None, 100).unwrap().is_empty());

    g.set_aspect(b, Aspect::new(ValidityInterval::starting_at(at(2024, 6, 1)))).unwrap();
    assert_eq!(detector.detect_textual(None, Some("policy"), 100).unwrap().len(), 1);
    assert!(detector
        .detect_textual(Some(AtomKind::Entity), None, 100)
        .unwrap()
        .is_empty());
}

#[test]
fn zero_length_aspect_conflicts_with_aspectless_partner() {
    let g = InMemoryGraph::new();
    let instant = window(Some(at(2025, 1, 1)), Some(at(2025, 1, 1)));
    let one = g
        .insert_atom(Atom::new(AtomKind::Rule, "r").unwrap().with_text("one"))
        .unwrap();
    g.insert_atom(Atom::new(AtomKind::Rule, "r").unwrap().with_text("two"))
        .unwrap();
    g.set_aspect(one, Aspect::new(instant)).unwrap();

    let found = ContradictionDetector::new(&g)
        .detect_textual(None, None, 100)
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].overlap, instant);
}

#[test]
fn combined_run_fills_with_textual_and_respects_limit() {
    let g = overlapping_graph();
    g.insert_atom(Atom::new(AtomKind::Entity, "E").unwrap().with_text("one")).unwrap();
    g.insert_atom(Atom::new(AtomKind::Entity, "E").unwrap().with_text("two")).unwrap();
    let detector = ContradictionDetector::new(&g);

    let all = detector.detect_all(100).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].kind, ContradictionKind::Relational);
    assert_eq!(all[1].kind, ContradictionKind::Relational);
    assert_eq!(all[2].kind, ContradictionKind::Textual);

    let capped = detector.detect_all(2).unwrap();
    assert_eq!(capped.len(), 2);
    assert!(capped.iter().all(|c| c.kind == ContradictionKind::Relational));

    assert_eq!(detector.detect_all(1).unwrap().len(), 1);
    assert!(detector.detect_all(0).unwrap().is_empty());
}

#[test]
fn reports_serialize_with_overlap_window() {
    let g = overlapping_graph();
    let found = ContradictionDetector::new(&g).detect_all(1).unwrap();
    let json = serde_json::to_value(&found).unwrap();
    assert_eq!(json[0]["kind"], "relational");
    assert!(json[0]["overlap"]["from"].is_string());
    assert!(json[0]["overlap"]["to"].is_string());
}
