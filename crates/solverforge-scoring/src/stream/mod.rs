//! Fluent constraint stream API.
//!
//! A constraint is written as a chain of stream operators over tuples of
//! arity 1 to 4, finished by a scoring terminal:
//!
//! ```text
//! ConstraintFactory::new(package)
//!     .for_each::<A>()                 -> arity 1
//!     .join::<B>(joiners)              -> arity 2
//!     .filter(predicate)               -> arity 2
//!     .group_by([key, collector])      -> arity 2
//!     .penalize(weight)                -> ConstraintBuilder<Sc>
//!     .as_constraint(name)             -> Result<Constraint<Sc>>
//! ```
//!
//! Builders only describe the stream. A session compiles each constraint
//! into a node graph that is updated incrementally as facts change.
//!
//! # Example
//!
//! ```
//! use solverforge_core::SimpleScore;
//! use solverforge_scoring::stream::collector::count;
//! use solverforge_scoring::stream::{ConstraintFactory, GroupArg, Mapping, Predicate};
//!
//! #[derive(Debug)]
//! struct Lesson { teacher: &'static str, room: Option<&'static str> }
//!
//! let factory = ConstraintFactory::new("timetabling");
//! let unassigned = factory
//!     .for_each_including_unassigned::<Lesson>()
//!     .filter(Predicate::of(|l: &Lesson| l.room.is_none()))
//!     .penalize(SimpleScore::ONE)
//!     .as_constraint("Unassigned lesson")
//!     .unwrap();
//! assert_eq!(unassigned.constraint_ref().name, "Unassigned lesson");
//!
//! let busy = factory
//!     .for_each::<Lesson>()
//!     .group_by([
//!         GroupArg::key(Mapping::of(|l: &Lesson| l.teacher)),
//!         GroupArg::collect(count()),
//!     ])
//!     .filter(Predicate::new(|t| t.int(1) > 3))
//!     .penalize_with(SimpleScore::ONE, Mapping::new(|t| t.int(1) - 3));
//! assert!(busy.as_constraint("Busy teacher").is_ok());
//! ```

pub mod collector;
mod constraint_stream;
pub(crate) mod definition;
mod factory;
mod function;
pub mod joiner;
mod terminal;


pub use constraint_stream::{ConstraintStream, GroupArg};
pub use definition::ExistenceMode;
pub use factory::ConstraintFactory;
pub use function::{BinaryOperator, Combiner, Comparator, Finisher, Mapping, Predicate};
pub use joiner::Joiner;
pub use terminal::{ConstraintBuilder, Indicter, Justifier, MatchWeigher};
pub(crate) use terminal::check_weight;
