// Constraint factory: the entry point of the stream API.

use std::any::Any;
use std::sync::Arc;

use super::constraint_stream::ConstraintStream;
use super::function::Mapping;
use super::joiner::{ComparisonOp, Joiner};

// Creates source streams; constraints finished from them land in the
// factory's package.
//
// # Example
//
// ```
// use solverforge_core::HardSoftScore;
// use solverforge_scoring::stream::joiner::{equal_by, overlapping};
// use solverforge_scoring::stream::{ConstraintFactory, Mapping};
//
// #[derive(Debug)]
// struct Shift { employee: &'static str, start: i64, end: i64 }
//
// let factory = ConstraintFactory::new("scheduling");
// let overlap = factory
//     .for_each_unique_pair::<Shift>(vec![
//         equal_by(Mapping::of(|s: &Shift| s.employee)),
//         overlapping(Mapping::of(|s: &Shift| s.start), Mapping::of(|s: &Shift| s.end)),
//     ])
//     .penalize(HardSoftScore::ONE_HARD)
//     .as_constraint("Overlapping shifts")
//     .unwrap();
// assert_eq!(overlap.constraint_ref().constraint_id(), "scheduling/Overlapping shifts");
// ```
#[derive(Debug, Clone)]
pub struct ConstraintFactory {
    package: Arc<str>,
}

impl ConstraintFactory {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: Arc::from(package.into()),
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    // Every `T` in working memory; entities only once all their genuine
    // variables are assigned.
    pub fn for_each<T: Any>(&self) -> ConstraintStream {
        ConstraintStream::for_class::<T>(false, self.package.clone())
    }

    // Every `T` in working memory, assigned or not.
    pub fn for_each_including_unassigned<T: Any>(&self) -> ConstraintStream {
        ConstraintStream::for_class::<T>(true, self.package.clone())
    }

    // Every unordered pair of distinct assigned `T`s matching `joiners`,
    // once, with the lower-ranked fact first.
    //
    // Facts without a planning id rank first, in insertion order. The rest
    // rank by planning id.
    pub fn for_each_unique_pair<T: Any>(&self, mut joiners: Vec<Joiner>) -> ConstraintStream {
        let source = self.for_each::<T>();
        joiners.push(Joiner::Comparison {
            op: ComparisonOp::LessThan,
            left: Mapping::identity(),
            right: Mapping::identity(),
            shared: false,
        });
        source.join_stream(&source, joiners)
    }
}
