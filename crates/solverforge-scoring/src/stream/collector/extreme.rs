//! Min and max collectors.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use solverforge_core::{Result, Tuple, Value};

use super::{Accumulator, Undo};
use crate::stream::function::{Comparator, Mapping};

/// A value ordered by an optional comparator, natural order otherwise.
#[derive(Clone)]
pub(super) struct Ranked {
    pub(super) value: Value,
    comparator: Option<Comparator>,
}

impl Ranked {
    pub(super) fn new(value: Value, comparator: &Option<Comparator>) -> Self {
        Self {
            value,
            comparator: comparator.clone(),
        }
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        match &self.comparator {
            Some(comparator) => comparator(&self.value, &other.value),
            None => self.value.cmp(&other.value),
        }
    }
}

/// Ordered multiset; values the comparator ties share one bucket.
pub(super) struct ExtremeAccumulator {
    mapping: Mapping,
    comparator: Option<Comparator>,
    buckets: BTreeMap<Ranked, Vec<Value>>,
    max: bool,
}

impl ExtremeAccumulator {
    pub(super) fn min(mapping: Mapping, comparator: Option<Comparator>) -> Self {
        Self {
            mapping,
            comparator,
            buckets: BTreeMap::new(),
            max: false,
        }
    }

    pub(super) fn max(mapping: Mapping, comparator: Option<Comparator>) -> Self {
        Self {
            max: true,
            ..Self::min(mapping, comparator)
        }
    }
}

impl Accumulator for ExtremeAccumulator {
    fn accumulate(&mut self, tuple: &Tuple) -> Result<Undo> {
        let value = self.mapping.apply(tuple);
        self.buckets
            .entry(Ranked::new(value.clone(), &self.comparator))
            .or_default()
            .push(value.clone());
        Ok(Undo::Value(value))
    }

    fn retract(&mut self, undo: Undo) {
        let key = Ranked::new(undo.into_value(), &self.comparator);
        if let Some(bucket) = self.buckets.get_mut(&key) {
            if let Some(pos) = bucket.iter().position(|v| *v == key.value) {
                bucket.remove(pos);
            }
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
        }
    }

    fn finish(&self) -> Value {
        let extreme = if self.max {
            self.buckets.values().next_back()
        } else {
            self.buckets.values().next()
        };
        // Ties go to the smallest value, whatever the insertion history.
        extreme
            .and_then(|bucket| bucket.iter().min())
            .cloned()
            .unwrap_or_default()
    }
}
