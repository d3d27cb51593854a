//! List, set and map collectors.
//!
//! Containers keep a count per distinct value, so duplicates survive until
//! their last copy is retracted and results never depend on insertion order.

use std::collections::BTreeMap;
use std::sync::Arc;

use solverforge_core::{Result, Tuple, Value};

use super::extreme::Ranked;
use super::{Accumulator, Undo};
use crate::stream::function::{BinaryOperator, Comparator, Mapping};

fn add(counts: &mut BTreeMap<Value, usize>, value: Value) {
    *counts.entry(value).or_insert(0) += 1;
}

fn remove(counts: &mut BTreeMap<Value, usize>, value: &Value) {
    if let Some(count) = counts.get_mut(value) {
        *count -= 1;
        if *count == 0 {
            counts.remove(value);
        }
    }
}

pub(super) struct ListAccumulator {
    mapping: Mapping,
    counts: BTreeMap<Value, usize>,
}

impl ListAccumulator {
    pub(super) fn new(mapping: Mapping) -> Self {
        Self {
            mapping,
            counts: BTreeMap::new(),
        }
    }
}

impl Accumulator for ListAccumulator {
    fn accumulate(&mut self, tuple: &Tuple) -> Result<Undo> {
        let value = self.mapping.apply(tuple);
        add(&mut self.counts, value.clone());
        Ok(Undo::Value(value))
    }

    fn retract(&mut self, undo: Undo) {
        remove(&mut self.counts, &undo.into_value());
    }

    fn finish(&self) -> Value {
        Value::list(
            self.counts
                .iter()
                .flat_map(|(value, count)| std::iter::repeat(value.clone()).take(*count)),
        )
    }
}

enum SetState {
    Natural(BTreeMap<Value, usize>),
    Compared(BTreeMap<Ranked, Vec<Value>>),
}

/// Distinct values: a set in natural order, or a list in comparator order.
pub(super) struct SetAccumulator {
    mapping: Mapping,
    comparator: Option<Comparator>,
    state: SetState,
}

impl SetAccumulator {
    pub(super) fn new(mapping: Mapping, comparator: Option<Comparator>) -> Self {
        let state = if comparator.is_some() {
            SetState::Compared(BTreeMap::new())
        } else {
            SetState::Natural(BTreeMap::new())
        };
        Self {
            mapping,
            comparator,
            state,
        }
    }
}

impl Accumulator for SetAccumulator {
    fn accumulate(&mut self, tuple: &Tuple) -> Result<Undo> {
        let value = self.mapping.apply(tuple);
        match &mut self.state {
            SetState::Natural(counts) => add(counts, value.clone()),
            SetState::Compared(buckets) => buckets
                .entry(Ranked::new(value.clone(), &self.comparator))
                .or_default()
                .push(value.clone()),
        }
        Ok(Undo::Value(value))
    }

    fn retract(&mut self, undo: Undo) {
        let value = undo.into_value();
        match &mut self.state {
            SetState::Natural(counts) => remove(counts, &value),
            SetState::Compared(buckets) => {
                let key = Ranked::new(value, &self.comparator);
                if let Some(bucket) = buckets.get_mut(&key) {
                    if let Some(pos) = bucket.iter().position(|v| *v == key.value) {
                        bucket.remove(pos);
                    }
                    if bucket.is_empty() {
                        buckets.remove(&key);
                    }
                }
            }
        }
    }

    fn finish(&self) -> Value {
        match &self.state {
            SetState::Natural(counts) => Value::set(counts.keys().cloned()),
            SetState::Compared(buckets) => {
                Value::list(buckets.values().filter_map(|bucket| bucket.iter().min().cloned()))
            }
        }
    }
}

pub(super) struct MapAccumulator {
    key: Mapping,
    value: Mapping,
    merge: Option<BinaryOperator>,
    entries: BTreeMap<Value, BTreeMap<Value, usize>>,
}

impl MapAccumulator {
    pub(super) fn new(key: Mapping, value: Mapping, merge: Option<BinaryOperator>) -> Self {
        Self {
            key,
            value,
            merge,
            entries: BTreeMap::new(),
        }
    }

    fn merged(&self, values: &BTreeMap<Value, usize>) -> Value {
        let mut all = values
            .iter()
            .flat_map(|(value, count)| std::iter::repeat(value).take(*count));
        match (&self.merge, all.next()) {
            (Some(merge), Some(first)) => all.fold(first.clone(), |acc, v| merge(&acc, v)),
            (None, _) => Value::set(values.keys().cloned()),
            (Some(_), None) => Value::None,
        }
    }
}

impl Accumulator for MapAccumulator {
    fn accumulate(&mut self, tuple: &Tuple) -> Result<Undo> {
        let key = self.key.apply(tuple);
        let value = self.value.apply(tuple);
        add(self.entries.entry(key.clone()).or_default(), value.clone());
        Ok(Undo::Entry(key, value))
    }

    fn retract(&mut self, undo: Undo) {
        let (key, value) = undo.into_entry();
        if let Some(values) = self.entries.get_mut(&key) {
            remove(values, &value);
            if values.is_empty() {
                self.entries.remove(&key);
            }
        }
    }

    fn finish(&self) -> Value {
        Value::Map(Arc::new(
            self.entries
                .iter()
                .map(|(key, values)| (key.clone(), self.merged(values)))
                .collect(),
        ))
    }
}
