//! Consecutive sequence detection over integer indices.

use std::collections::BTreeMap;

use solverforge_core::{Result, SolverForgeError, Tuple, Value};

use super::{Accumulator, Undo};
use crate::stream::function::Mapping;

/// A run of items whose indices follow each other without a gap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    pub first: Value,
    pub last: Value,
    pub first_index: i64,
    pub last_index: i64,
    /// Items in index order; items sharing an index are all kept.
    pub items: Vec<Value>,
    /// Number of indices covered, `last_index - first_index + 1`.
    pub length: i64,
}

impl Sequence {
    /// Number of items, counting items that share an index.
    pub fn count(&self) -> usize {
        self.items.len()
    }
}

/// The gap between two neighbouring sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Break {
    pub previous_end: i64,
    pub next_start: i64,
    /// `next_start - previous_end`; always at least 2.
    pub length: i64,
}

/// All sequences of a group, in index order, with the breaks between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SequenceChain {
    pub sequences: Vec<Sequence>,
    pub breaks: Vec<Break>,
}

impl SequenceChain {
    fn from_indices(items: &BTreeMap<i64, Vec<Value>>) -> Self {
        let mut chain = SequenceChain::default();
        let mut current: Option<Sequence> = None;
        for (&index, values) in items {
            match current.as_mut() {
                Some(run) if run.last_index + 1 == index => {
                    run.last_index = index;
                    run.items.extend(values.iter().cloned());
                }
                _ => {
                    if let Some(done) = current.take() {
                        chain.breaks.push(Break {
                            previous_end: done.last_index,
                            next_start: index,
                            length: index - done.last_index,
                        });
                        chain.push(done);
                    }
                    current = Some(Sequence {
                        first: Value::None,
                        last: Value::None,
                        first_index: index,
                        last_index: index,
                        items: values.clone(),
                        length: 1,
                    });
                }
            }
        }
        if let Some(done) = current {
            chain.push(done);
        }
        chain
    }

    fn push(&mut self, mut run: Sequence) {
        run.first = run.items.first().cloned().unwrap_or_default();
        run.last = run.items.last().cloned().unwrap_or_default();
        run.length = run.last_index - run.first_index + 1;
        self.sequences.push(run);
    }

    pub fn first_sequence(&self) -> Option<&Sequence> {
        self.sequences.first()
    }

    pub fn last_sequence(&self) -> Option<&Sequence> {
        self.sequences.last()
    }

    pub fn first_break(&self) -> Option<&Break> {
        self.breaks.first()
    }

    pub fn last_break(&self) -> Option<&Break> {
        self.breaks.last()
    }

    /// The sequences as a list value, ready for `flatten_last`.
    pub fn sequences_value(&self) -> Value {
        Value::list(self.sequences.iter().cloned().map(Value::object))
    }

    /// The breaks as a list value, ready for `flatten_last`.
    pub fn breaks_value(&self) -> Value {
        Value::list(self.breaks.iter().copied().map(Value::object))
    }
}

pub(super) struct ConsecutiveAccumulator {
    item: Mapping,
    index: Mapping,
    items: BTreeMap<i64, Vec<Value>>,
}

impl ConsecutiveAccumulator {
    pub(super) fn new(item: Mapping, index: Mapping) -> Self {
        Self {
            item,
            index,
            items: BTreeMap::new(),
        }
    }
}

impl Accumulator for ConsecutiveAccumulator {
    fn accumulate(&mut self, tuple: &Tuple) -> Result<Undo> {
        let index = self.index.apply(tuple);
        let Some(position) = index.as_int() else {
            return Err(SolverForgeError::Type(format!(
                "to_consecutive_sequences() needs an int index, got {}",
                index.type_label()
            )));
        };
        let item = self.item.apply(tuple);
        self.items.entry(position).or_default().push(item.clone());
        Ok(Undo::Entry(index, item))
    }

    fn retract(&mut self, undo: Undo) {
        let (index, item) = undo.into_entry();
        let Some(position) = index.as_int() else {
            return;
        };
        if let Some(values) = self.items.get_mut(&position) {
            if let Some(pos) = values.iter().position(|v| *v == item) {
                values.remove(pos);
            }
            if values.is_empty() {
                self.items.remove(&position);
            }
        }
    }

    fn finish(&self) -> Value {
        Value::object(SequenceChain::from_indices(&self.items))
    }
}
