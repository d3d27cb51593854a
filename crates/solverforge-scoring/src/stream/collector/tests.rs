use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use solverforge_core::{Tuple, Value};

use super::*;
use crate::stream::function::{Mapping, Predicate};

fn ints(values: &[i64]) -> Vec<Tuple> {
    values.iter().map(|v| Tuple::single(*v)).collect()
}

// Accumulates every tuple, then retracts the ones at `retract` positions.
fn run(collector: &Collector, values: &[i64], retract: &[usize]) -> Value {
    let mut acc = collector.create_accumulator();
    let undos: Vec<Undo> = ints(values)
        .iter()
        .map(|t| acc.accumulate(t).unwrap())
        .collect();
    for (i, undo) in undos.into_iter().enumerate() {
        if retract.contains(&i) {
            acc.retract(undo);
        }
    }
    acc.finish()
}

fn remaining(values: &[i64], retract: &[usize]) -> Vec<Tuple> {
    values
        .iter()
        .enumerate()
        .filter(|(i, _)| !retract.contains(i))
        .map(|(_, v)| Tuple::single(*v))
        .collect()
}

#[test]
fn test_count() {
    assert_eq!(run(&count(), &[1, 2, 3], &[1]), Value::Int(2));
    assert_eq!(run(&count(), &[], &[]), Value::Int(0));
}

#[test]
fn test_count_distinct_transitions() {
    let collector = count_distinct(Mapping::identity());
    let mut acc = collector.create_accumulator();
    acc.accumulate(&Tuple::single(7)).unwrap();
    let second = acc.accumulate(&Tuple::single(7)).unwrap();
    assert_eq!(acc.finish(), Value::Int(1));

    // The second entity moves to another value.
    acc.retract(second);
    let moved = acc.accumulate(&Tuple::single(8)).unwrap();
    assert_eq!(acc.finish(), Value::Int(2));

    acc.retract(moved);
    acc.accumulate(&Tuple::single(7)).unwrap();
    assert_eq!(acc.finish(), Value::Int(1));
}

#[test]
fn test_sum_kinds() {
    let collector = sum(Mapping::identity());
    assert_eq!(run(&collector, &[5, 3, 7], &[1]), Value::Int(12));

    let mut acc = collector.create_accumulator();
    acc.accumulate(&Tuple::single(2)).unwrap();
    let half = acc
        .accumulate(&Tuple::single(Decimal::new(5, 1)))
        .unwrap();
    assert_eq!(acc.finish(), Value::Decimal(Decimal::new(25, 1)));
    acc.retract(half);
    assert_eq!(acc.finish(), Value::Int(2));
}

#[test]
fn test_sum_of_strings_needs_monoid() {
    let collector = sum(Mapping::identity());
    let mut acc = collector.create_accumulator();
    let err = acc.accumulate(&Tuple::single("a")).unwrap_err();
    assert!(err.to_string().contains("not implemented"));

    let concat = sum_with(
        Mapping::identity(),
        "",
        |acc, v| Value::from(format!("{}{}", acc, v)),
        |acc, v| {
            let (acc, v) = (acc.to_string(), v.to_string());
            Value::from(acc.replacen(&v, "", 1))
        },
    );
    let mut acc = concat.create_accumulator();
    acc.accumulate(&Tuple::single("ab")).unwrap();
    let cd = acc.accumulate(&Tuple::single("cd")).unwrap();
    assert_eq!(acc.finish(), Value::from("abcd"));
    acc.retract(cd);
    assert_eq!(acc.finish(), Value::from("ab"));
}

#[test]
fn test_average() {
    let collector = average(Mapping::identity());
    assert_eq!(run(&collector, &[], &[]), Value::None);
    assert_eq!(
        run(&collector, &[1, 2, 4], &[2]),
        Value::Decimal(Decimal::new(15, 1))
    );
}

#[test]
fn test_min_max_rederive_after_retracting_extreme() {
    let values = [4, 1, 9, 1, 6];
    assert_eq!(run(&min(Mapping::identity()), &values, &[1]), Value::Int(1));
    assert_eq!(run(&min(Mapping::identity()), &values, &[1, 3]), Value::Int(4));
    assert_eq!(run(&max(Mapping::identity()), &values, &[2]), Value::Int(6));
    assert_eq!(run(&max(Mapping::identity()), &values, &[0, 1, 2, 3, 4]), Value::None);
}

#[test]
fn test_min_by_comparator() {
    // Reverse order turns min into the largest value.
    let collector = min_by(Mapping::identity(), |a, b| b.cmp(a));
    assert_eq!(run(&collector, &[3, 8, 5], &[]), Value::Int(8));
    assert_eq!(run(&collector, &[3, 8, 5], &[1]), Value::Int(5));
}

#[test]
fn test_comparator_ties_pick_the_smallest_value() {
    // Values in the same decade tie.
    let decade = |a: &Value, b: &Value| a.as_int().map(|a| a / 10).cmp(&b.as_int().map(|b| b / 10));
    let histories: [(&[i64], &[usize]); 3] = [(&[15, 12], &[]), (&[12, 15], &[]), (&[12, 15, 12], &[0])];
    for (values, retract) in histories {
        let scratch = min_by(Mapping::identity(), decade).collect(&remaining(values, retract)).unwrap();
        assert_eq!(scratch, Value::Int(12));
        assert_eq!(run(&min_by(Mapping::identity(), decade), values, retract), scratch);
        assert_eq!(run(&max_by(Mapping::identity(), decade), values, retract), scratch);
        assert_eq!(
            run(&to_sorted_set_by(Mapping::identity(), decade), values, retract),
            Value::list([Value::Int(12)])
        );
    }
}

#[test]
fn test_containers() {
    let values = [3, 1, 3, 2];
    assert_eq!(
        run(&to_list(Mapping::identity()), &values, &[0]),
        Value::list(ints(&[1, 2, 3]).into_iter().map(|t| t.get(0).clone()))
    );
    assert_eq!(
        run(&to_set(Mapping::identity()), &values, &[0]),
        Value::set([Value::Int(1), Value::Int(2), Value::Int(3)])
    );
    assert_eq!(
        run(&to_set(Mapping::identity()), &values, &[0, 2]),
        Value::set([Value::Int(1), Value::Int(2)])
    );
    assert_eq!(
        run(&to_sorted_set_by(Mapping::identity(), |a, b| b.cmp(a)), &values, &[]),
        Value::list([Value::Int(3), Value::Int(2), Value::Int(1)])
    );
}

#[test]
fn test_to_map_groups_values_into_sets() {
    let parity = Mapping::new(|t: &Tuple| t.int(0) % 2);
    let collector = to_map(parity.clone(), Mapping::identity());
    let Value::Map(map) = run(&collector, &[1, 2, 3, 5], &[3]) else {
        panic!("expected a map");
    };
    assert_eq!(map[&Value::Int(1)], Value::set([Value::Int(1), Value::Int(3)]));
    assert_eq!(map[&Value::Int(0)], Value::set([Value::Int(2)]));

    let merged = to_map_merged(parity, Mapping::identity(), |a, b| {
        Value::Int(a.as_int().unwrap_or(0) + b.as_int().unwrap_or(0))
    });
    let Value::Map(map) = run(&merged, &[1, 2, 3, 5], &[0]) else {
        panic!("expected a map");
    };
    assert_eq!(map[&Value::Int(1)], Value::Int(8));
}

#[test]
fn test_consecutive_sequences_split_and_merge() {
    let collector = to_consecutive_sequences(Mapping::identity());
    let mut acc = collector.create_accumulator();
    for v in [1, 2, 3, 5, 6] {
        acc.accumulate(&Tuple::single(v)).unwrap();
    }
    let chain = acc.finish();
    let chain = chain.downcast::<SequenceChain>().unwrap();
    assert_eq!(chain.sequences.len(), 2);
    assert_eq!(chain.sequences[0].length, 3);
    assert_eq!(chain.sequences[1].first, Value::Int(5));
    assert_eq!(
        chain.breaks,
        vec![Break {
            previous_end: 3,
            next_start: 5,
            length: 2
        }]
    );

    let four = acc.accumulate(&Tuple::single(4)).unwrap();
    let merged = acc.finish();
    let merged = merged.downcast::<SequenceChain>().unwrap();
    assert_eq!(merged.sequences.len(), 1);
    assert_eq!(merged.sequences[0].count(), 6);
    assert!(merged.breaks.is_empty());

    acc.retract(four);
    let split = acc.finish();
    assert_eq!(split.downcast::<SequenceChain>().unwrap().sequences.len(), 2);
}

#[test]
fn test_consecutive_needs_int_index() {
    let collector = to_consecutive_sequences(Mapping::identity());
    let mut acc = collector.create_accumulator();
    assert!(acc.accumulate(&Tuple::single("x")).is_err());
}

#[test]
fn test_load_balance() {
    let collector = load_balance(Mapping::identity());
    let balanced = run(&collector, &[0, 1], &[]);
    assert_eq!(balanced.downcast::<LoadBalance>().unwrap().unfairness, Decimal::ZERO);

    let unbalanced = run(&collector, &[0, 0, 1], &[]);
    let result = unbalanced.downcast::<LoadBalance>().unwrap();
    assert_eq!(result.load_of(&Value::Int(0)), 2);
    // sqrt(5 - 9 / 2)
    assert_eq!(result.unfairness, Decimal::new(707107, 6));

    let back = run(&collector, &[0, 0, 1], &[1]);
    assert_eq!(back.downcast::<LoadBalance>().unwrap().unfairness, Decimal::ZERO);
}

#[test]
fn test_load_balance_beyond_decimal_range() {
    let collector = load_balance_with(Mapping::identity(), Mapping::identity());
    let result = run(&collector, &[1, 1 << 50], &[]);
    // (2^50 - 1) / sqrt(2)
    assert_eq!(
        result.downcast::<LoadBalance>().unwrap().unfairness,
        Decimal::from(796_131_000_000_000i64)
    );
}

#[test]
fn test_load_balance_initial_load() {
    let collector = load_balance_with_initial(
        Mapping::identity(),
        Some(Mapping::constant(1)),
        Some(Mapping::constant(10)),
    )
    .unwrap();
    let result = run(&collector, &[0, 0, 1], &[]);
    let result = result.downcast::<LoadBalance>().unwrap();
    assert_eq!(result.load_of(&Value::Int(0)), 12);
    assert_eq!(result.load_of(&Value::Int(1)), 11);

    let err = load_balance_with_initial(Mapping::identity(), None, Some(Mapping::constant(1)))
        .unwrap_err();
    assert!(err.to_string().contains("load mapping"));
}

#[test]
fn test_compose() {
    let err = compose(vec![count()], |r| r[0].clone()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "compose requires at least 2 collectors, got 1"
    );

    let spread = compose(vec![min(Mapping::identity()), max(Mapping::identity())], |r| {
        Value::Int(r[1].as_int().unwrap_or(0) - r[0].as_int().unwrap_or(0))
    })
    .unwrap();
    assert_eq!(run(&spread, &[4, 10, 7], &[]), Value::Int(6));
    assert_eq!(run(&spread, &[4, 10, 7], &[1]), Value::Int(3));
}

#[test]
fn test_compose_rolls_back_on_error() {
    let collector = compose(vec![count(), sum(Mapping::identity())], |r| {
        Value::list(r.to_vec())
    })
    .unwrap();
    let mut acc = collector.create_accumulator();
    acc.accumulate(&Tuple::single(1)).unwrap();
    assert!(acc.accumulate(&Tuple::single("bad")).is_err());
    assert_eq!(acc.finish(), Value::list([Value::Int(1), Value::Int(1)]));
}

#[test]
fn test_conditionally_remembers_routing() {
    let accept = Arc::new(AtomicBool::new(true));
    let gate = accept.clone();
    let collector = conditionally(
        Predicate::new(move |_| gate.load(Ordering::SeqCst)),
        count(),
    );
    let mut acc = collector.create_accumulator();
    let routed = acc.accumulate(&Tuple::single(1)).unwrap();
    accept.store(false, Ordering::SeqCst);
    let skipped = acc.accumulate(&Tuple::single(2)).unwrap();
    assert_eq!(acc.finish(), Value::Int(1));

    // Flipping the predicate must not change how retraction is routed.
    accept.store(true, Ordering::SeqCst);
    acc.retract(skipped);
    assert_eq!(acc.finish(), Value::Int(1));
    acc.retract(routed);
    assert_eq!(acc.finish(), Value::Int(0));
}

#[test]
fn test_collect_and_then() {
    let collector = collect_and_then(count(), |v| {
        Value::Int(v.as_int().unwrap_or(0) * 10)
    });
    assert_eq!(run(&collector, &[1, 2, 3], &[0]), Value::Int(20));
}

#[test]
fn test_incremental_matches_scratch() {
    let values = [5, 3, 5, 9, 1, 3, 7];
    let retract = [0, 3, 5];
    let collectors = [
        count(),
        count_distinct(Mapping::identity()),
        sum(Mapping::identity()),
        min(Mapping::identity()),
        max(Mapping::identity()),
        to_list(Mapping::identity()),
        to_set(Mapping::identity()),
        to_sorted_set(Mapping::identity()),
        to_consecutive_sequences(Mapping::identity()),
        load_balance(Mapping::identity()),
    ];
    for collector in &collectors {
        let scratch = collector.collect(&remaining(&values, &retract)).unwrap();
        assert_eq!(run(collector, &values, &retract), scratch, "{:?}", collector);
    }
}

fn mixed_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-20..20i64).prop_map(Value::Int),
        (-20..20i64).prop_map(|v| Value::Float(v as f64)),
        prop_oneof![Just(1e30), Just(-1e30), Just(0.5)].prop_map(Value::Float),
    ]
}

// `Some(v)` inserts, `None` retracts a live tuple picked by the index.
fn mutations(values: impl Strategy<Value = Value>) -> impl Strategy<Value = Vec<(Option<Value>, usize)>> {
    prop::collection::vec((proptest::option::weighted(0.7, values), any::<usize>()), 1..40)
}

fn replay(collector: &Collector, ops: Vec<(Option<Value>, usize)>) -> std::result::Result<(), TestCaseError> {
    let mut acc = collector.create_accumulator();
    let mut live: Vec<(Tuple, Undo)> = Vec::new();
    for (value, index) in ops {
        match value {
            Some(value) => {
                let tuple = Tuple::single(value);
                let undo = acc.accumulate(&tuple).unwrap();
                live.push((tuple, undo));
            }
            None if !live.is_empty() => {
                let (_, undo) = live.remove(index % live.len());
                acc.retract(undo);
            }
            None => {}
        }
        let scratch = collector.collect(live.iter().map(|(t, _)| t)).unwrap();
        prop_assert_eq!(acc.finish(), scratch, "{:?}", collector);
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_mixed_numbers_match_scratch(ops in mutations(mixed_value())) {
        let collectors = [
            count(),
            count_distinct(Mapping::identity()),
            min(Mapping::identity()),
            max(Mapping::identity()),
            to_list(Mapping::identity()),
            to_set(Mapping::identity()),
            to_sorted_set(Mapping::identity()),
        ];
        for collector in &collectors {
            replay(collector, ops.clone())?;
        }
    }

    // Integral floats keep the running float total exact.
    #[test]
    fn prop_mixed_sum_matches_scratch(
        ops in mutations(prop_oneof![
            (-1000..1000i64).prop_map(Value::Int),
            (-1000..1000i64).prop_map(|v| Value::Float(v as f64)),
        ])
    ) {
        replay(&sum(Mapping::identity()), ops)?;
    }
}
