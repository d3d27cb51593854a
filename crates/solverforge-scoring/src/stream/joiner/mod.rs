// Joiners for join and existence-join operators.
//
// A joiner relates a left tuple (the stream being extended or filtered) to a
// right tuple (the joined or tested stream). A list of joiners is a
// conjunction: a pair matches only if every joiner matches.
//
// Structured joiners (equal, comparison, overlapping) read their properties
// once per tuple and let the join memory index candidates; filtering joiners
// run last, over the full joined tuple.
//
// # Example
//
// ```
// use solverforge_core::{FactId, FactRef, Tuple};
// use solverforge_scoring::stream::joiner::{equal_by, overlapping};
// use solverforge_scoring::stream::Mapping;
//
// #[derive(Debug)]
// struct Shift { employee: &'static str, start: i64, end: i64 }
//
// let same_employee = equal_by(Mapping::of(|s: &Shift| s.employee));
// let overlap = overlapping(Mapping::of(|s: &Shift| s.start), Mapping::of(|s: &Shift| s.end));
//
// let a = Tuple::single(FactRef::new(FactId(1), Shift { employee: "Ann", start: 0, end: 8 }, None));
// let b = Tuple::single(FactRef::new(FactId(2), Shift { employee: "Ann", start: 6, end: 14 }, None));
// assert!(same_employee.matches(&a, &b));
// assert!(overlap.matches(&a, &b));
// ```

mod comparison;
mod equal;
mod filtering;
mod overlapping;

#[cfg(test)]
mod tests;

use std::fmt;

use smallvec::SmallVec;
use solverforge_core::{Result, SolverForgeError, Tuple, Value};

use super::function::{Mapping, Predicate};

pub use comparison::{
    greater_than, greater_than_bi, greater_than_or_equal, greater_than_or_equal_bi,
    greater_than_or_equal_with, greater_than_with, less_than, less_than_bi, less_than_or_equal,
    less_than_or_equal_bi, less_than_or_equal_with, less_than_with,
};
pub use equal::{equal, equal_bi, equal_by, equal_with};
pub use filtering::filtering;
pub use overlapping::{overlapping, overlapping_bi, overlapping_with};

// Properties one joiner reads from one side of a candidate pair.
pub(crate) type JoinerValues = SmallVec<[Value; 2]>;

/// Ordering relation of a comparison joiner, read as `left OP right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl ComparisonOp {
    pub fn holds(self, left: &Value, right: &Value) -> bool {
        match self {
            ComparisonOp::LessThan => left < right,
            ComparisonOp::LessThanOrEqual => left <= right,
            ComparisonOp::GreaterThan => left > right,
            ComparisonOp::GreaterThanOrEqual => left >= right,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ComparisonOp::LessThan => "less_than",
            ComparisonOp::LessThanOrEqual => "less_than_or_equal",
            ComparisonOp::GreaterThan => "greater_than",
            ComparisonOp::GreaterThanOrEqual => "greater_than_or_equal",
        }
    }
}

/// A matching condition between a left and a right tuple.
///
/// `shared` marks joiners built from a single property mapping that is
/// applied to both sides; they need a uni left stream.
#[derive(Clone)]
pub enum Joiner {
    Equal {
        left: Mapping,
        right: Mapping,
        shared: bool,
    },
    Comparison {
        op: ComparisonOp,
        left: Mapping,
        right: Mapping,
        shared: bool,
    },
    /// Half-open intervals `[start, end)` that intersect.
    Overlapping {
        left_start: Mapping,
        left_end: Mapping,
        right_start: Mapping,
        right_end: Mapping,
        shared: bool,
    },
    /// Arbitrary predicate over the joined tuple (left elements, then right).
    Filtering(Predicate),
}

impl Joiner {
    pub fn name(&self) -> &'static str {
        match self {
            Joiner::Equal { .. } => "equal",
            Joiner::Comparison { op, .. } => op.name(),
            Joiner::Overlapping { .. } => "overlapping",
            Joiner::Filtering(_) => "filtering",
        }
    }

    pub fn is_shared(&self) -> bool {
        match self {
            Joiner::Equal { shared, .. }
            | Joiner::Comparison { shared, .. }
            | Joiner::Overlapping { shared, .. } => *shared,
            Joiner::Filtering(_) => false,
        }
    }

    /// Tests the pair directly, without an index.
    pub fn matches(&self, left: &Tuple, right: &Tuple) -> bool {
        match self {
            Joiner::Filtering(predicate) => predicate.test(&left.joined(right)),
            _ => self.matches_values(&self.left_values(left), &self.right_values(right)),
        }
    }

    pub(crate) fn left_values(&self, tuple: &Tuple) -> JoinerValues {
        let mut values = JoinerValues::new();
        match self {
            Joiner::Equal { left, .. } | Joiner::Comparison { left, .. } => {
                values.push(left.apply(tuple))
            }
            Joiner::Overlapping {
                left_start,
                left_end,
                ..
            } => {
                values.push(left_start.apply(tuple));
                values.push(left_end.apply(tuple));
            }
            Joiner::Filtering(_) => {}
        }
        values
    }

    pub(crate) fn right_values(&self, tuple: &Tuple) -> JoinerValues {
        let mut values = JoinerValues::new();
        match self {
            Joiner::Equal { right, .. } | Joiner::Comparison { right, .. } => {
                values.push(right.apply(tuple))
            }
            Joiner::Overlapping {
                right_start,
                right_end,
                ..
            } => {
                values.push(right_start.apply(tuple));
                values.push(right_end.apply(tuple));
            }
            Joiner::Filtering(_) => {}
        }
        values
    }

    // Filtering joiners always pass here; they are checked on the joined tuple.
    pub(crate) fn matches_values(&self, left: &[Value], right: &[Value]) -> bool {
        match self {
            Joiner::Equal { .. } => left[0] == right[0],
            Joiner::Comparison { op, .. } => op.holds(&left[0], &right[0]),
            Joiner::Overlapping { .. } => left[0] < right[1] && right[0] < left[1],
            Joiner::Filtering(_) => true,
        }
    }
}

impl fmt::Debug for Joiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Joiner({}", self.name())?;
        if self.is_shared() {
            f.write_str(", shared")?;
        }
        f.write_str(")")
    }
}

/// Checks a joiner list against the arity of the left stream.
pub(crate) fn validate_joiners(operator: &str, joiners: &[Joiner], left_arity: usize) -> Result<()> {
    for joiner in joiners {
        if joiner.is_shared() && left_arity != 1 {
            return Err(SolverForgeError::Config(format!(
                "{}() with a single property mapping needs a uni left stream, \
                 but {} is applied to a stream of arity {}; pass left and right mappings",
                joiner.name(),
                operator,
                left_arity
            )));
        }
    }
    Ok(())
}
