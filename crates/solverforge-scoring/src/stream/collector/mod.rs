//! Collectors for grouping and aggregating tuples.
//!
//! A [`Collector`] describes an aggregation; [`Collector::create_accumulator`]
//! starts one group's incremental state. Accumulating a tuple returns an
//! [`Undo`] token holding everything the accumulator computed from it, and
//! retracting hands that token back. Retraction therefore never re-runs user
//! functions, so results stay consistent even if a fact changed in between.
//!
//! # Example
//!
//! ```
//! use solverforge_core::{Tuple, Value};
//! use solverforge_scoring::stream::collector;
//! use solverforge_scoring::stream::Mapping;
//!
//! let sum = collector::sum(Mapping::identity());
//! let mut acc = sum.create_accumulator();
//!
//! let five = acc.accumulate(&Tuple::single(5)).unwrap();
//! acc.accumulate(&Tuple::single(3)).unwrap();
//! assert_eq!(acc.finish(), Value::Int(8));
//!
//! acc.retract(five);
//! assert_eq!(acc.finish(), Value::Int(3));
//! ```

mod composite;
mod consecutive;
mod container;
mod count;
mod extreme;
mod load_balance;
mod sum;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

use solverforge_core::{Result, SolverForgeError, Tuple, Value};

use super::function::{BinaryOperator, Combiner, Comparator, Finisher, Mapping, Predicate};

pub use consecutive::{Break, Sequence, SequenceChain};
pub use load_balance::LoadBalance;

/// Incremental state of one collector for one group.
pub trait Accumulator: Send {
    /// Adds a tuple and returns the token needed to take it out again.
    fn accumulate(&mut self, tuple: &Tuple) -> Result<Undo>;

    /// Removes a previously accumulated tuple.
    fn retract(&mut self, undo: Undo);

    /// Current result.
    fn finish(&self) -> Value;
}

/// What an accumulator remembers about one accumulated tuple.
#[derive(Debug, Clone, PartialEq)]
pub enum Undo {
    Nothing,
    Value(Value),
    Entry(Value, Value),
    /// Routing decision of a conditional collector.
    Routed(Option<Box<Undo>>),
    Many(Vec<Undo>),
}

impl Undo {
    fn into_value(self) -> Value {
        match self {
            Undo::Value(value) => value,
            _ => Value::None,
        }
    }

    fn into_entry(self) -> (Value, Value) {
        match self {
            Undo::Entry(key, value) => (key, value),
            Undo::Value(key) => (key, Value::None),
            _ => (Value::None, Value::None),
        }
    }
}

/// `(zero, adder, subtractor)` for sums over non-numeric values.
#[derive(Clone)]
pub struct SumMonoid {
    pub zero: Value,
    pub adder: BinaryOperator,
    pub subtractor: BinaryOperator,
}

/// An aggregation over the tuples of a group.
#[derive(Clone)]
pub enum Collector {
    Count,
    CountDistinct(Mapping),
    Sum {
        mapping: Mapping,
        monoid: Option<SumMonoid>,
    },
    Average(Mapping),
    Min {
        mapping: Mapping,
        comparator: Option<Comparator>,
    },
    Max {
        mapping: Mapping,
        comparator: Option<Comparator>,
    },
    ToList(Mapping),
    ToSet(Mapping),
    ToSortedSet {
        mapping: Mapping,
        comparator: Option<Comparator>,
    },
    ToMap {
        key: Mapping,
        value: Mapping,
        merge: Option<BinaryOperator>,
        sorted: bool,
    },
    ConsecutiveSequences {
        item: Mapping,
        index: Mapping,
    },
    LoadBalance {
        item: Mapping,
        load: Option<Mapping>,
        initial_load: Option<Mapping>,
    },
    Compose {
        collectors: Vec<Collector>,
        combiner: Combiner,
    },
    Conditionally {
        predicate: Predicate,
        collector: Box<Collector>,
    },
    CollectAndThen {
        collector: Box<Collector>,
        finisher: Finisher,
    },
}

impl Collector {
    pub fn name(&self) -> &'static str {
        match self {
            Collector::Count => "count",
            Collector::CountDistinct(_) => "count_distinct",
            Collector::Sum { .. } => "sum",
            Collector::Average(_) => "average",
            Collector::Min { .. } => "min",
            Collector::Max { .. } => "max",
            Collector::ToList(_) => "to_list",
            Collector::ToSet(_) => "to_set",
            Collector::ToSortedSet { .. } => "to_sorted_set",
            Collector::ToMap { sorted: false, .. } => "to_map",
            Collector::ToMap { sorted: true, .. } => "to_sorted_map",
            Collector::ConsecutiveSequences { .. } => "to_consecutive_sequences",
            Collector::LoadBalance { .. } => "load_balance",
            Collector::Compose { .. } => "compose",
            Collector::Conditionally { .. } => "conditionally",
            Collector::CollectAndThen { .. } => "collect_and_then",
        }
    }

    pub fn create_accumulator(&self) -> Box<dyn Accumulator> {
        match self {
            Collector::Count => Box::new(count::CountAccumulator::default()),
            Collector::CountDistinct(mapping) => {
                Box::new(count::CountDistinctAccumulator::new(mapping.clone()))
            }
            Collector::Sum { mapping, monoid } => {
                Box::new(sum::SumAccumulator::new(mapping.clone(), monoid.clone()))
            }
            Collector::Average(mapping) => Box::new(sum::AverageAccumulator::new(mapping.clone())),
            Collector::Min {
                mapping,
                comparator,
            } => Box::new(extreme::ExtremeAccumulator::min(
                mapping.clone(),
                comparator.clone(),
            )),
            Collector::Max {
                mapping,
                comparator,
            } => Box::new(extreme::ExtremeAccumulator::max(
                mapping.clone(),
                comparator.clone(),
            )),
            Collector::ToList(mapping) => Box::new(container::ListAccumulator::new(mapping.clone())),
            Collector::ToSet(mapping) => {
                Box::new(container::SetAccumulator::new(mapping.clone(), None))
            }
            Collector::ToSortedSet {
                mapping,
                comparator,
            } => Box::new(container::SetAccumulator::new(
                mapping.clone(),
                comparator.clone(),
            )),
            Collector::ToMap {
                key, value, merge, ..
            } => Box::new(container::MapAccumulator::new(
                key.clone(),
                value.clone(),
                merge.clone(),
            )),
            Collector::ConsecutiveSequences { item, index } => Box::new(
                consecutive::ConsecutiveAccumulator::new(item.clone(), index.clone()),
            ),
            Collector::LoadBalance {
                item,
                load,
                initial_load,
            } => Box::new(load_balance::LoadBalanceAccumulator::new(
                item.clone(),
                load.clone(),
                initial_load.clone(),
            )),
            Collector::Compose {
                collectors,
                combiner,
            } => Box::new(composite::ComposeAccumulator::new(
                collectors.iter().map(Collector::create_accumulator).collect(),
                combiner.clone(),
            )),
            Collector::Conditionally {
                predicate,
                collector,
            } => Box::new(composite::ConditionalAccumulator::new(
                predicate.clone(),
                collector.create_accumulator(),
            )),
            Collector::CollectAndThen {
                collector,
                finisher,
            } => Box::new(composite::FinishingAccumulator::new(
                collector.create_accumulator(),
                finisher.clone(),
            )),
        }
    }

    /// Result over an explicit set of tuples, ignoring any history.
    pub fn collect<'a>(&self, tuples: impl IntoIterator<Item = &'a Tuple>) -> Result<Value> {
        let mut acc = self.create_accumulator();
        for tuple in tuples {
            acc.accumulate(tuple)?;
        }
        Ok(acc.finish())
    }
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Collector({})", self.name())
    }
}

/// Number of tuples.
pub fn count() -> Collector {
    Collector::Count
}

/// Number of distinct mapped values.
pub fn count_distinct(mapping: Mapping) -> Collector {
    Collector::CountDistinct(mapping)
}

/// Sum of mapped numbers.
///
/// Integers sum to an integer; any decimal makes the sum a decimal, any
/// float a float. Other values need [`sum_with`].
pub fn sum(mapping: Mapping) -> Collector {
    Collector::Sum {
        mapping,
        monoid: None,
    }
}

/// Sum over an arbitrary monoid.
pub fn sum_with<A, S>(mapping: Mapping, zero: impl Into<Value>, adder: A, subtractor: S) -> Collector
where
    A: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    S: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
{
    Collector::Sum {
        mapping,
        monoid: Some(SumMonoid {
            zero: zero.into(),
            adder: Arc::new(adder),
            subtractor: Arc::new(subtractor),
        }),
    }
}

/// Decimal mean of mapped numbers, or `None` for an empty group.
pub fn average(mapping: Mapping) -> Collector {
    Collector::Average(mapping)
}

/// Smallest mapped value, or `None` for an empty group.
pub fn min(mapping: Mapping) -> Collector {
    Collector::Min {
        mapping,
        comparator: None,
    }
}

pub fn min_by<C>(mapping: Mapping, comparator: C) -> Collector
where
    C: Fn(&Value, &Value) -> std::cmp::Ordering + Send + Sync + 'static,
{
    Collector::Min {
        mapping,
        comparator: Some(Arc::new(comparator)),
    }
}

/// Largest mapped value, or `None` for an empty group.
pub fn max(mapping: Mapping) -> Collector {
    Collector::Max {
        mapping,
        comparator: None,
    }
}

pub fn max_by<C>(mapping: Mapping, comparator: C) -> Collector
where
    C: Fn(&Value, &Value) -> std::cmp::Ordering + Send + Sync + 'static,
{
    Collector::Max {
        mapping,
        comparator: Some(Arc::new(comparator)),
    }
}

/// Mapped values as a list, duplicates kept, in value order.
pub fn to_list(mapping: Mapping) -> Collector {
    Collector::ToList(mapping)
}

/// Distinct mapped values.
pub fn to_set(mapping: Mapping) -> Collector {
    Collector::ToSet(mapping)
}

/// Distinct mapped values, sorted by their natural order.
pub fn to_sorted_set(mapping: Mapping) -> Collector {
    Collector::ToSortedSet {
        mapping,
        comparator: None,
    }
}

/// Mapped values ordered by `comparator`; values it deems equal collapse.
pub fn to_sorted_set_by<C>(mapping: Mapping, comparator: C) -> Collector
where
    C: Fn(&Value, &Value) -> std::cmp::Ordering + Send + Sync + 'static,
{
    Collector::ToSortedSet {
        mapping,
        comparator: Some(Arc::new(comparator)),
    }
}

/// Map from each key to the set of values seen with it.
pub fn to_map(key: Mapping, value: Mapping) -> Collector {
    Collector::ToMap {
        key,
        value,
        merge: None,
        sorted: false,
    }
}

/// Map from each key to its values folded with `merge`.
pub fn to_map_merged<M>(key: Mapping, value: Mapping, merge: M) -> Collector
where
    M: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
{
    Collector::ToMap {
        key,
        value,
        merge: Some(Arc::new(merge)),
        sorted: false,
    }
}

/// Like [`to_map`]; keys iterate in sorted order.
pub fn to_sorted_map(key: Mapping, value: Mapping) -> Collector {
    Collector::ToMap {
        key,
        value,
        merge: None,
        sorted: true,
    }
}

pub fn to_sorted_map_merged<M>(key: Mapping, value: Mapping, merge: M) -> Collector
where
    M: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
{
    Collector::ToMap {
        key,
        value,
        merge: Some(Arc::new(merge)),
        sorted: true,
    }
}

/// Runs of consecutive integer indices, as a [`SequenceChain`].
///
/// The items of each run are the first tuple elements.
pub fn to_consecutive_sequences(index: Mapping) -> Collector {
    to_consecutive_sequences_of(Mapping::identity(), index)
}

pub fn to_consecutive_sequences_of(item: Mapping, index: Mapping) -> Collector {
    Collector::ConsecutiveSequences { item, index }
}

/// Per-item load and unfairness, as a [`LoadBalance`]; every tuple loads 1.
pub fn load_balance(item: Mapping) -> Collector {
    Collector::LoadBalance {
        item,
        load: None,
        initial_load: None,
    }
}

pub fn load_balance_with(item: Mapping, load: Mapping) -> Collector {
    Collector::LoadBalance {
        item,
        load: Some(load),
        initial_load: None,
    }
}

/// Load balance where each item starts from `initial_load` of its first tuple.
///
/// Fails when an initial load is given without a load mapping.
pub fn load_balance_with_initial(
    item: Mapping,
    load: Option<Mapping>,
    initial_load: Option<Mapping>,
) -> Result<Collector> {
    if load.is_none() && initial_load.is_some() {
        return Err(SolverForgeError::Config(
            "load_balance needs a load mapping when an initial load mapping is given".into(),
        ));
    }
    Ok(Collector::LoadBalance {
        item,
        load,
        initial_load,
    })
}

/// Runs every collector on each tuple and combines their results.
///
/// At least two collectors are required.
pub fn compose<F>(collectors: Vec<Collector>, combiner: F) -> Result<Collector>
where
    F: Fn(&[Value]) -> Value + Send + Sync + 'static,
{
    if collectors.len() < 2 {
        return Err(SolverForgeError::argument_count(
            "compose",
            "at least 2",
            "collectors",
            collectors.len(),
        ));
    }
    Ok(Collector::Compose {
        collectors,
        combiner: Arc::new(combiner),
    })
}

/// Feeds `collector` only the tuples accepted by `predicate`.
pub fn conditionally(predicate: Predicate, collector: Collector) -> Collector {
    Collector::Conditionally {
        predicate,
        collector: Box::new(collector),
    }
}

/// Maps the result of `collector` with `finisher`.
pub fn collect_and_then<F>(collector: Collector, finisher: F) -> Collector
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    Collector::CollectAndThen {
        collector: Box::new(collector),
        finisher: Arc::new(finisher),
    }
}
