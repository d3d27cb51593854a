//! Filtering joiner.

use super::Joiner;
use crate::stream::function::Predicate;

/// Matches when `predicate` accepts the joined tuple.
///
/// The predicate sees the left elements followed by the right elements, so a
/// bi join of `Shift` with `Employee` is tested with
/// `Predicate::of_bi(|s: &Shift, e: &Employee| ..)`. Use it for conditions the
/// structured joiners cannot express; it cannot be indexed.
pub fn filtering(predicate: Predicate) -> Joiner {
    Joiner::Filtering(predicate)
}
