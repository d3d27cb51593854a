//! Interval overlap joiners.
//!
//! Intervals are half-open: `[start, end)`. Two intervals overlap when
//! `start_a < end_b && start_b < end_a`, so touching intervals do not.

use solverforge_core::{Result, SolverForgeError};

use super::Joiner;
use crate::stream::function::Mapping;

/// Matches overlapping intervals read with the same mappings on both sides.
pub fn overlapping(start: Mapping, end: Mapping) -> Joiner {
    Joiner::Overlapping {
        left_start: start.clone(),
        left_end: end.clone(),
        right_start: start,
        right_end: end,
        shared: true,
    }
}

/// Matches when `[left_start, left_end)` overlaps `[right_start, right_end)`.
pub fn overlapping_bi(
    left_start: Mapping,
    left_end: Mapping,
    right_start: Mapping,
    right_end: Mapping,
) -> Joiner {
    Joiner::Overlapping {
        left_start,
        left_end,
        right_start,
        right_end,
        shared: false,
    }
}

/// Builds an overlap joiner from one `(start, end)` pair or two full pairs.
pub fn overlapping_with(mappings: Vec<Mapping>) -> Result<Joiner> {
    let count = mappings.len();
    let mut mappings = mappings.into_iter();
    match (
        mappings.next(),
        mappings.next(),
        mappings.next(),
        mappings.next(),
    ) {
        (Some(start), Some(end), None, None) => Ok(overlapping(start, end)),
        (Some(left_start), Some(left_end), Some(right_start), Some(right_end)) if count == 4 => {
            Ok(overlapping_bi(left_start, left_end, right_start, right_end))
        }
        _ => Err(SolverForgeError::argument_count(
            "overlapping",
            "2 or 4",
            "mapping functions",
            count,
        )),
    }
}
