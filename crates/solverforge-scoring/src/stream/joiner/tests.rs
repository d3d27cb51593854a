use solverforge_core::{FactId, FactRef, Tuple, Value};

use super::*;
use crate::stream::function::{Mapping, Predicate};

#[derive(Debug)]
struct Shift {
    employee: &'static str,
    start: i64,
    end: i64,
}

#[derive(Debug)]
struct Employee {
    name: &'static str,
}

fn shift(id: u64, employee: &'static str, start: i64, end: i64) -> Tuple {
    Tuple::single(FactRef::new(FactId(id), Shift { employee, start, end }, None))
}

fn start() -> Mapping {
    Mapping::of(|s: &Shift| s.start)
}

fn end() -> Mapping {
    Mapping::of(|s: &Shift| s.end)
}

#[test]
fn test_identity_equal() {
    let a = shift(1, "Ann", 0, 8);
    let a_again = Tuple::single(a.get(0).clone());
    assert!(equal().matches(&a, &a_again));
    assert!(!equal().matches(&a, &shift(2, "Ann", 0, 8)));
}

#[test]
fn test_equal_bi_across_types() {
    let joiner = equal_bi(
        Mapping::of(|s: &Shift| s.employee),
        Mapping::of(|e: &Employee| e.name),
    );
    let ann = Tuple::single(FactRef::new(FactId(9), Employee { name: "Ann" }, None));
    assert!(joiner.matches(&shift(1, "Ann", 0, 8), &ann));
    assert!(!joiner.matches(&shift(1, "Bob", 0, 8), &ann));
    assert!(!joiner.is_shared());
}

#[test]
fn test_equal_with_counts() {
    assert!(equal_with(vec![]).unwrap().is_shared());
    assert!(equal_with(vec![start()]).unwrap().is_shared());
    assert!(!equal_with(vec![start(), end()]).unwrap().is_shared());
    let err = equal_with(vec![start(), end(), start()]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "equal requires 0, 1 or 2 mapping functions, got 3"
    );
}

#[test]
fn test_comparisons() {
    let a = shift(1, "Ann", 0, 8);
    let b = shift(2, "Ann", 8, 16);
    assert!(less_than(start()).matches(&a, &b));
    assert!(!less_than(start()).matches(&b, &a));
    assert!(less_than_or_equal_bi(end(), start()).matches(&a, &b));
    assert!(!less_than_bi(end(), start()).matches(&a, &b));
    assert!(greater_than(start()).matches(&b, &a));
    assert!(greater_than_or_equal(start()).matches(&a, &a));
}

#[test]
fn test_comparison_with_counts() {
    let err = less_than_with(vec![]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "less_than requires 1 or 2 mapping functions, got 0"
    );
    let err = greater_than_or_equal_with(vec![start(), end(), start()]).unwrap_err();
    assert!(err.to_string().starts_with("greater_than_or_equal requires"));
    assert!(less_than_or_equal_with(vec![start(), end()]).is_ok());
}

#[test]
fn test_overlapping_is_half_open() {
    let joiner = overlapping(start(), end());
    assert!(joiner.matches(&shift(1, "Ann", 0, 10), &shift(2, "Ann", 5, 15)));
    assert!(!joiner.matches(&shift(1, "Ann", 0, 10), &shift(2, "Ann", 10, 20)));
    assert!(!joiner.matches(&shift(1, "Ann", 0, 5), &shift(2, "Ann", 10, 15)));
    assert!(joiner.matches(&shift(1, "Ann", 0, 20), &shift(2, "Ann", 5, 6)));
}

#[test]
fn test_overlapping_requires_whole_pairs() {
    assert!(overlapping_with(vec![start(), end()]).unwrap().is_shared());
    assert!(!overlapping_with(vec![start(), end(), start(), end()])
        .unwrap()
        .is_shared());
    let err = overlapping_with(vec![start(), end(), start()]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "overlapping requires 2 or 4 mapping functions, got 3"
    );
}

#[test]
fn test_filtering_sees_joined_tuple() {
    let joiner = filtering(Predicate::of_bi(|a: &Shift, b: &Shift| a.end == b.start));
    assert!(joiner.matches(&shift(1, "Ann", 0, 8), &shift(2, "Bob", 8, 16)));
    assert!(!joiner.matches(&shift(1, "Ann", 0, 8), &shift(2, "Bob", 9, 16)));
}

#[test]
fn test_shared_joiner_needs_uni_left() {
    let joiners = vec![equal_by(Mapping::of(|s: &Shift| s.employee))];
    assert!(validate_joiners("join", &joiners, 1).is_ok());
    let err = validate_joiners("join", &joiners, 2).unwrap_err();
    assert!(err.to_string().contains("arity 2"));

    let paired = vec![equal_bi(Mapping::element(1), Mapping::identity())];
    assert!(validate_joiners("join", &paired, 2).is_ok());
}

#[test]
fn test_comparisons_use_value_order() {
    assert!(ComparisonOp::LessThan.holds(&Value::None, &Value::Int(0)));
    assert!(ComparisonOp::GreaterThanOrEqual.holds(&Value::Int(3), &Value::Int(3)));
}
