//! Count collectors.

use std::collections::HashMap;

use solverforge_core::{Result, Tuple, Value};

use super::{Accumulator, Undo};
use crate::stream::function::Mapping;

#[derive(Default)]
pub(super) struct CountAccumulator {
    count: i64,
}

impl Accumulator for CountAccumulator {
    #[inline]
    fn accumulate(&mut self, _: &Tuple) -> Result<Undo> {
        self.count += 1;
        Ok(Undo::Nothing)
    }

    #[inline]
    fn retract(&mut self, _: Undo) {
        self.count -= 1;
    }

    fn finish(&self) -> Value {
        Value::Int(self.count)
    }
}

/// Reference count per distinct mapped value.
pub(super) struct CountDistinctAccumulator {
    mapping: Mapping,
    counts: HashMap<Value, usize>,
}

impl CountDistinctAccumulator {
    pub(super) fn new(mapping: Mapping) -> Self {
        Self {
            mapping,
            counts: HashMap::new(),
        }
    }
}

impl Accumulator for CountDistinctAccumulator {
    fn accumulate(&mut self, tuple: &Tuple) -> Result<Undo> {
        let value = self.mapping.apply(tuple);
        *self.counts.entry(value.clone()).or_insert(0) += 1;
        Ok(Undo::Value(value))
    }

    fn retract(&mut self, undo: Undo) {
        let value = undo.into_value();
        if let Some(count) = self.counts.get_mut(&value) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&value);
            }
        }
    }

    fn finish(&self) -> Value {
        Value::Int(self.counts.len() as i64)
    }
}
