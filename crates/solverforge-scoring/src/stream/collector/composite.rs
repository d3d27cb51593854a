//! Collectors built from other collectors.

use solverforge_core::{Result, Tuple, Value};

use super::{Accumulator, Undo};
use crate::stream::function::{Combiner, Finisher, Predicate};

pub(super) struct ComposeAccumulator {
    parts: Vec<Box<dyn Accumulator>>,
    combiner: Combiner,
}

impl ComposeAccumulator {
    pub(super) fn new(parts: Vec<Box<dyn Accumulator>>, combiner: Combiner) -> Self {
        Self { parts, combiner }
    }
}

impl Accumulator for ComposeAccumulator {
    fn accumulate(&mut self, tuple: &Tuple) -> Result<Undo> {
        let mut undos = Vec::with_capacity(self.parts.len());
        for i in 0..self.parts.len() {
            match self.parts[i].accumulate(tuple) {
                Ok(undo) => undos.push(undo),
                Err(err) => {
                    // Leave the parts that already took the tuple as they were.
                    for (part, undo) in self.parts.iter_mut().zip(undos) {
                        part.retract(undo);
                    }
                    return Err(err);
                }
            }
        }
        Ok(Undo::Many(undos))
    }

    fn retract(&mut self, undo: Undo) {
        if let Undo::Many(undos) = undo {
            for (part, undo) in self.parts.iter_mut().zip(undos) {
                part.retract(undo);
            }
        }
    }

    fn finish(&self) -> Value {
        let results: Vec<Value> = self.parts.iter().map(|part| part.finish()).collect();
        (self.combiner)(&results)
    }
}

/// Remembers per tuple whether it was routed to the inner collector.
pub(super) struct ConditionalAccumulator {
    predicate: Predicate,
    inner: Box<dyn Accumulator>,
}

impl ConditionalAccumulator {
    pub(super) fn new(predicate: Predicate, inner: Box<dyn Accumulator>) -> Self {
        Self { predicate, inner }
    }
}

impl Accumulator for ConditionalAccumulator {
    fn accumulate(&mut self, tuple: &Tuple) -> Result<Undo> {
        if self.predicate.test(tuple) {
            let undo = self.inner.accumulate(tuple)?;
            Ok(Undo::Routed(Some(Box::new(undo))))
        } else {
            Ok(Undo::Routed(None))
        }
    }

    fn retract(&mut self, undo: Undo) {
        if let Undo::Routed(Some(undo)) = undo {
            self.inner.retract(*undo);
        }
    }

    fn finish(&self) -> Value {
        self.inner.finish()
    }
}

pub(super) struct FinishingAccumulator {
    inner: Box<dyn Accumulator>,
    finisher: Finisher,
}

impl FinishingAccumulator {
    pub(super) fn new(inner: Box<dyn Accumulator>, finisher: Finisher) -> Self {
        Self { inner, finisher }
    }
}

impl Accumulator for FinishingAccumulator {
    fn accumulate(&mut self, tuple: &Tuple) -> Result<Undo> {
        self.inner.accumulate(tuple)
    }

    fn retract(&mut self, undo: Undo) {
        self.inner.retract(undo);
    }

    fn finish(&self) -> Value {
        (self.finisher)(&self.inner.finish())
    }
}
