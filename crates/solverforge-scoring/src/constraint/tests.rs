//! Graph and runtime tests driven with hand-made fact handles.

use std::sync::Arc;

use solverforge_core::{FactId, FactRef, SimpleScore, SolverForgeError, Value};

use super::graph::NodeGraph;
use super::{Constraint, ConstraintRuntime};
use crate::stream::collector::{count, sum};
use crate::stream::joiner::{equal_bi, equal_by, overlapping};
use crate::stream::{ConstraintBuilder, ConstraintFactory, GroupArg, Mapping, Predicate};

#[derive(Debug, Clone)]
struct Shift {
    employee: &'static str,
    start: i64,
    end: i64,
}

#[derive(Debug)]
struct Employee {
    name: &'static str,
}

fn factory() -> ConstraintFactory {
    ConstraintFactory::new("roster")
}

fn shift(id: u64, employee: &'static str, start: i64, end: i64) -> FactRef {
    FactRef::new(
        FactId(id),
        Shift {
            employee,
            start,
            end,
        },
        None,
    )
}

fn employee(id: u64, name: &'static str) -> FactRef {
    FactRef::new(FactId(id), Employee { name }, None)
}

fn build(builder: ConstraintBuilder<SimpleScore>, name: &str) -> Constraint<SimpleScore> {
    builder.as_constraint(name).unwrap()
}

fn runtime(constraint: Constraint<SimpleScore>) -> ConstraintRuntime<SimpleScore> {
    let weight = constraint.weight();
    ConstraintRuntime::new(Arc::new(constraint), weight)
}

fn overlapping_shifts() -> Constraint<SimpleScore> {
    build(
        factory()
            .for_each_unique_pair::<Shift>(vec![
                equal_by(Mapping::of(|s: &Shift| s.employee)),
                overlapping(
                    Mapping::of(|s: &Shift| s.start),
                    Mapping::of(|s: &Shift| s.end),
                ),
            ])
            .penalize(SimpleScore::ONE),
        "Overlapping shifts",
    )
}

#[test]
fn test_self_join_compiles_source_once() {
    let constraint = overlapping_shifts();
    let graph = NodeGraph::compile(&constraint.stream);
    assert_eq!(graph.labels(), &["for_each", "join"]);
    assert_eq!(graph.describe(), "for_each -> join");
}

#[test]
fn test_unique_pairs_penalize_each_collision_once() {
    let mut rt = runtime(overlapping_shifts());
    let shifts = [
        shift(1, "Ann", 0, 10),
        shift(2, "Ann", 5, 15),
        shift(3, "Ann", 8, 12),
        shift(4, "Bob", 0, 10),
    ];
    for s in &shifts {
        rt.insert(s, true).unwrap();
    }
    assert_eq!(rt.match_count(), 3);
    assert_eq!(rt.score(), SimpleScore::of(-3));

    rt.retract(&shifts[1], true).unwrap();
    assert_eq!(rt.match_count(), 1);
    assert_eq!(rt.score(), SimpleScore::of(-1));
}

#[test]
fn test_touching_shifts_do_not_overlap() {
    let mut rt = runtime(overlapping_shifts());
    rt.insert(&shift(1, "Ann", 0, 8), true).unwrap();
    rt.insert(&shift(2, "Ann", 8, 16), true).unwrap();
    assert_eq!(rt.match_count(), 0);
}

#[test]
fn test_unassigned_facts_skip_for_each() {
    let mut rt = runtime(build(
        factory().for_each::<Shift>().penalize(SimpleScore::ONE),
        "Shift",
    ));
    rt.insert(&shift(1, "Ann", 0, 8), false).unwrap();
    assert_eq!(rt.match_count(), 0);

    let mut including = runtime(build(
        factory()
            .for_each_including_unassigned::<Shift>()
            .penalize(SimpleScore::ONE),
        "Any shift",
    ));
    including.insert(&shift(1, "Ann", 0, 8), false).unwrap();
    assert_eq!(including.match_count(), 1);
}

#[test]
fn test_group_by_follows_updates() {
    let mut rt = runtime(build(
        factory()
            .for_each::<Shift>()
            .group_by([
                GroupArg::key(Mapping::of(|s: &Shift| s.employee)),
                GroupArg::collect(sum(Mapping::of(|s: &Shift| s.end - s.start))),
            ])
            .filter(Predicate::new(|t| t.int(1) > 10))
            .penalize_with(SimpleScore::ONE, Mapping::new(|t| t.int(1) - 10)),
        "Too many hours",
    ));
    let first = shift(1, "Ann", 0, 8);
    rt.insert(&first, true).unwrap();
    rt.insert(&shift(2, "Ann", 10, 16), true).unwrap();
    assert_eq!(rt.score(), SimpleScore::of(-4));

    // An update is a retraction of the old payload and an insertion of the new one.
    let moved = first.replaced(
        Shift {
            employee: "Bob",
            start: 0,
            end: 8,
        },
        None,
    );
    rt.retract(&first, true).unwrap();
    rt.insert(&moved, true).unwrap();
    assert_eq!(rt.score(), SimpleScore::of(0));
    assert_eq!(rt.match_count(), 0);
}

#[test]
fn test_count_distinct_moves_between_values() {
    let mut rt = runtime(build(
        factory()
            .for_each::<Shift>()
            .group_by([GroupArg::collect(crate::stream::collector::count_distinct(
                Mapping::of(|s: &Shift| s.employee),
            ))])
            .reward_with(SimpleScore::ONE, Mapping::new(|t| t.int(0))),
        "Distinct employees",
    ));
    let a = shift(1, "Ann", 0, 8);
    let b = shift(2, "Ann", 0, 8);
    rt.insert(&a, true).unwrap();
    rt.insert(&b, true).unwrap();
    assert_eq!(rt.score(), SimpleScore::of(1));

    let b_moved = b.replaced(
        Shift {
            employee: "Bob",
            start: 0,
            end: 8,
        },
        None,
    );
    rt.retract(&b, true).unwrap();
    rt.insert(&b_moved, true).unwrap();
    assert_eq!(rt.score(), SimpleScore::of(2));

    rt.retract(&b_moved, true).unwrap();
    rt.insert(&b, true).unwrap();
    assert_eq!(rt.score(), SimpleScore::of(1));
}

#[test]
fn test_if_not_exists_reacts_to_the_other_side() {
    let mut rt = runtime(build(
        factory()
            .for_each::<Shift>()
            .if_not_exists::<Employee>(vec![equal_bi(
                Mapping::of(|s: &Shift| s.employee),
                Mapping::of(|e: &Employee| e.name),
            )])
            .penalize(SimpleScore::ONE),
        "Unknown employee",
    ));
    rt.insert(&shift(1, "Ann", 0, 8), true).unwrap();
    assert_eq!(rt.match_count(), 1);

    let ann = employee(10, "Ann");
    rt.insert(&ann, true).unwrap();
    assert_eq!(rt.match_count(), 0);
    rt.retract(&ann, true).unwrap();
    assert_eq!(rt.match_count(), 1);
}

#[test]
fn test_concat_then_distinct() {
    let shifts = factory().for_each::<Shift>();
    let long = shifts.filter(Predicate::of(|s: &Shift| s.end - s.start > 8));
    let early = shifts.filter(Predicate::of(|s: &Shift| s.start < 6));

    let mut both = runtime(build(
        long.concat(&early).penalize(SimpleScore::ONE),
        "Long or early",
    ));
    let mut distinct = runtime(build(
        long.concat(&early).distinct().penalize(SimpleScore::ONE),
        "Long or early once",
    ));
    for rt in [&mut both, &mut distinct] {
        rt.insert(&shift(1, "Ann", 0, 12), true).unwrap();
        rt.insert(&shift(2, "Ann", 10, 14), true).unwrap();
    }
    assert_eq!(both.match_count(), 2);
    assert_eq!(distinct.match_count(), 1);
}

#[test]
fn test_complement_adds_missing_facts_with_padding() {
    let mut rt = runtime(build(
        factory()
            .for_each::<Employee>()
            .join::<Shift>(vec![equal_bi(
                Mapping::of(|e: &Employee| e.name),
                Mapping::of(|s: &Shift| s.employee),
            )])
            .group_by([
                GroupArg::key(Mapping::element(0)),
                GroupArg::collect(count()),
            ])
            .complement_padded::<Employee>(vec![Mapping::constant(0)])
            .filter(Predicate::new(|t| t.int(1) == 0))
            .penalize(SimpleScore::ONE),
        "Idle employee",
    ));
    let ann = employee(1, "Ann");
    rt.insert(&ann, true).unwrap();
    rt.insert(&employee(2, "Bob"), true).unwrap();
    assert_eq!(rt.match_count(), 2);

    let s = shift(3, "Ann", 0, 8);
    rt.insert(&s, true).unwrap();
    assert_eq!(rt.match_count(), 1);
    let matches = rt.matches();
    assert_eq!(
        matches[0].justification.facts().map(|f| f[1].clone()),
        Some(Value::Int(0))
    );
}

#[test]
fn test_flatten_last_emits_each_item() {
    let mut rt = runtime(build(
        factory()
            .for_each::<Shift>()
            .map(vec![
                Mapping::of(|s: &Shift| s.employee),
                Mapping::of(|s: &Shift| Value::list((s.start..s.end).step_by(4).map(Value::from))),
            ])
            .flatten_last(Mapping::element(0))
            .penalize(SimpleScore::ONE),
        "Blocks",
    ));
    rt.insert(&shift(1, "Ann", 0, 12), true).unwrap();
    assert_eq!(rt.match_count(), 3);
}

#[test]
fn test_panicking_predicate_quarantines_only_its_constraint() {
    let mut broken = runtime(build(
        factory()
            .for_each::<Shift>()
            .filter(Predicate::of(|s: &Shift| {
                if s.employee == "Eve" {
                    panic!("no access to Eve's shifts");
                }
                true
            }))
            .penalize(SimpleScore::ONE),
        "Fragile",
    ));
    let mut healthy = runtime(overlapping_shifts());

    broken.insert(&shift(1, "Ann", 0, 8), true).unwrap();
    let eve = shift(2, "Eve", 0, 8);
    let err = broken.insert(&eve, true).unwrap_err();
    healthy.insert(&eve, true).unwrap();

    match err {
        SolverForgeError::Evaluation {
            constraint,
            message,
        } => {
            assert_eq!(constraint, "roster/Fragile");
            assert!(message.contains("no access to Eve's shifts"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(broken.is_quarantined());
    assert_eq!(broken.score(), SimpleScore::of(0));
    assert!(broken.failure().is_some());
    // Further traffic is skipped.
    broken.insert(&shift(3, "Ann", 0, 8), true).unwrap();
    assert_eq!(broken.match_count(), 0);
    assert!(!healthy.is_quarantined());
}

#[test]
fn test_negative_match_weight_needs_impact() {
    let mut rt = runtime(build(
        factory()
            .for_each::<Shift>()
            .penalize_with(SimpleScore::ONE, Mapping::of(|s: &Shift| s.start - 5)),
        "Early start",
    ));
    let err = rt.insert(&shift(1, "Ann", 0, 8), true).unwrap_err();
    assert!(err.to_string().contains("negative match weight (-5)"));

    let mut mixed = runtime(build(
        factory()
            .for_each::<Shift>()
            .impact_with(SimpleScore::ONE, Mapping::of(|s: &Shift| s.start - 5)),
        "Start offset",
    ));
    mixed.insert(&shift(1, "Ann", 0, 8), true).unwrap();
    assert_eq!(mixed.score(), SimpleScore::of(-5));
}

#[test]
fn test_zero_weight_disables_and_replays() {
    let mut rt = runtime(overlapping_shifts());
    let facts: Vec<(FactRef, bool)> = vec![
        (shift(1, "Ann", 0, 10), true),
        (shift(2, "Ann", 5, 15), true),
    ];
    for (fact, assigned) in &facts {
        rt.insert(fact, *assigned).unwrap();
    }
    rt.set_weight(SimpleScore::of(3), &facts).unwrap();
    assert_eq!(rt.score(), SimpleScore::of(-3));

    rt.set_weight(SimpleScore::of(0), &facts).unwrap();
    assert_eq!(rt.match_count(), 0);
    rt.insert(&shift(3, "Ann", 0, 10), true).unwrap();
    assert_eq!(rt.match_count(), 0);

    rt.set_weight(SimpleScore::of(2), &facts).unwrap();
    assert_eq!(rt.match_count(), 1);
    assert_eq!(rt.score(), SimpleScore::of(-2));
}

#[test]
fn test_retracting_an_unknown_fact_is_an_error() {
    let mut rt = runtime(build(
        factory().for_each::<Shift>().penalize(SimpleScore::ONE),
        "Shift",
    ));
    let err = rt.retract(&shift(1, "Ann", 0, 8), true).unwrap_err();
    assert!(matches!(err, SolverForgeError::Evaluation { .. }));
    assert!(err.to_string().contains("has no match"));
}

#[test]
fn test_default_indictment_dedups_tuple_elements() {
    let mut rt = runtime(build(
        factory()
            .for_each::<Shift>()
            .expand(vec![Mapping::identity()])
            .penalize(SimpleScore::ONE),
        "Twice",
    ));
    let s = shift(1, "Ann", 0, 8);
    rt.insert(&s, true).unwrap();
    let matches = rt.matches();
    assert_eq!(matches[0].indicted_objects, vec![Value::Fact(s)]);
}

#[test]
fn test_map_retracts_the_tuple_it_emitted() {
    let mut rt = runtime(build(
        factory()
            .for_each::<Shift>()
            .map(vec![Mapping::of(|s: &Shift| s.end - s.start)])
            .penalize_with(SimpleScore::ONE, Mapping::new(|t| t.int(0))),
        "Hours",
    ));
    let s = shift(1, "Ann", 0, 8);
    rt.insert(&s, true).unwrap();
    assert_eq!(rt.score(), SimpleScore::of(-8));
    rt.retract(&s, true).unwrap();
    assert_eq!(rt.score(), SimpleScore::of(0));

    let err = rt.retract(&s, true).unwrap_err();
    assert!(err.to_string().contains("map node received a retraction"));
    assert!(rt.is_quarantined());
}
