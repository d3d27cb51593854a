//! Equality joiners.

use solverforge_core::{Result, SolverForgeError};

use super::Joiner;
use crate::stream::function::Mapping;

/// Matches when the left and right facts are the same fact.
///
/// Only valid when the left stream is uni.
pub fn equal() -> Joiner {
    equal_by(Mapping::identity())
}

/// Matches when `mapping(left) == mapping(right)`.
///
/// The mapping is applied to both sides, so the left stream must be uni.
///
/// # Example
///
/// ```
/// use solverforge_core::{FactId, FactRef, Tuple};
/// use solverforge_scoring::stream::joiner::equal_by;
/// use solverforge_scoring::stream::Mapping;
///
/// #[derive(Debug)]
/// struct Shift { employee: &'static str }
///
/// let joiner = equal_by(Mapping::of(|s: &Shift| s.employee));
/// let ann = |id| Tuple::single(FactRef::new(FactId(id), Shift { employee: "Ann" }, None));
/// let bob = Tuple::single(FactRef::new(FactId(3), Shift { employee: "Bob" }, None));
/// assert!(joiner.matches(&ann(1), &ann(2)));
/// assert!(!joiner.matches(&ann(1), &bob));
/// ```
pub fn equal_by(mapping: Mapping) -> Joiner {
    Joiner::Equal {
        left: mapping.clone(),
        right: mapping,
        shared: true,
    }
}

/// Matches when `left(left tuple) == right(right tuple)`.
pub fn equal_bi(left: Mapping, right: Mapping) -> Joiner {
    Joiner::Equal {
        left,
        right,
        shared: false,
    }
}

/// Builds an equality joiner from zero, one or two mappings.
pub fn equal_with(mappings: Vec<Mapping>) -> Result<Joiner> {
    let mut mappings = mappings.into_iter();
    match (mappings.next(), mappings.next(), mappings.len()) {
        (None, _, _) => Ok(equal()),
        (Some(shared), None, _) => Ok(equal_by(shared)),
        (Some(left), Some(right), 0) => Ok(equal_bi(left, right)),
        (_, _, rest) => Err(SolverForgeError::argument_count(
            "equal",
            "0, 1 or 2",
            "mapping functions",
            rest + 2,
        )),
    }
}
