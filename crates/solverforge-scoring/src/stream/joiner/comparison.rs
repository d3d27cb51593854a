//! Ordering joiners: `left OP right` for `<`, `<=`, `>` and `>=`.

use solverforge_core::{Result, SolverForgeError};

use super::{ComparisonOp, Joiner};
use crate::stream::function::Mapping;

fn shared(op: ComparisonOp, mapping: Mapping) -> Joiner {
    Joiner::Comparison {
        op,
        left: mapping.clone(),
        right: mapping,
        shared: true,
    }
}

fn pair(op: ComparisonOp, left: Mapping, right: Mapping) -> Joiner {
    Joiner::Comparison {
        op,
        left,
        right,
        shared: false,
    }
}

fn from_mappings(op: ComparisonOp, mappings: Vec<Mapping>) -> Result<Joiner> {
    let count = mappings.len();
    let mut mappings = mappings.into_iter();
    match (mappings.next(), mappings.next()) {
        (Some(mapping), None) => Ok(shared(op, mapping)),
        (Some(left), Some(right)) if count == 2 => Ok(pair(op, left, right)),
        _ => Err(SolverForgeError::argument_count(
            op.name(),
            "1 or 2",
            "mapping functions",
            count,
        )),
    }
}

/// Matches when `mapping(left) < mapping(right)`.
///
/// # Example
///
/// ```
/// use solverforge_core::Tuple;
/// use solverforge_scoring::stream::joiner::less_than;
/// use solverforge_scoring::stream::Mapping;
///
/// let joiner = less_than(Mapping::identity());
/// assert!(joiner.matches(&Tuple::single(1), &Tuple::single(2)));
/// assert!(!joiner.matches(&Tuple::single(2), &Tuple::single(2)));
/// ```
pub fn less_than(mapping: Mapping) -> Joiner {
    shared(ComparisonOp::LessThan, mapping)
}

/// Matches when `left(left tuple) < right(right tuple)`.
pub fn less_than_bi(left: Mapping, right: Mapping) -> Joiner {
    pair(ComparisonOp::LessThan, left, right)
}

pub fn less_than_with(mappings: Vec<Mapping>) -> Result<Joiner> {
    from_mappings(ComparisonOp::LessThan, mappings)
}

pub fn less_than_or_equal(mapping: Mapping) -> Joiner {
    shared(ComparisonOp::LessThanOrEqual, mapping)
}

pub fn less_than_or_equal_bi(left: Mapping, right: Mapping) -> Joiner {
    pair(ComparisonOp::LessThanOrEqual, left, right)
}

pub fn less_than_or_equal_with(mappings: Vec<Mapping>) -> Result<Joiner> {
    from_mappings(ComparisonOp::LessThanOrEqual, mappings)
}

pub fn greater_than(mapping: Mapping) -> Joiner {
    shared(ComparisonOp::GreaterThan, mapping)
}

pub fn greater_than_bi(left: Mapping, right: Mapping) -> Joiner {
    pair(ComparisonOp::GreaterThan, left, right)
}

pub fn greater_than_with(mappings: Vec<Mapping>) -> Result<Joiner> {
    from_mappings(ComparisonOp::GreaterThan, mappings)
}

pub fn greater_than_or_equal(mapping: Mapping) -> Joiner {
    shared(ComparisonOp::GreaterThanOrEqual, mapping)
}

pub fn greater_than_or_equal_bi(left: Mapping, right: Mapping) -> Joiner {
    pair(ComparisonOp::GreaterThanOrEqual, left, right)
}

pub fn greater_than_or_equal_with(mappings: Vec<Mapping>) -> Result<Joiner> {
    from_mappings(ComparisonOp::GreaterThanOrEqual, mappings)
}
