// Single-input operators and concat.
//
// Nodes remember what they emitted for each input tuple and retract exactly
// that, so a retraction never re-runs user functions.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use solverforge_core::{Result, SolverForgeError, Tuple, Value};

use super::graph::{Delta, StreamNode};
use crate::stream::definition::Side;
use crate::stream::{Mapping, Predicate};

pub(super) fn push_entry<K: Hash + Eq, V>(map: &mut HashMap<K, Vec<V>>, key: K, value: V) {
    map.entry(key).or_default().push(value);
}

pub(super) fn pop_entry<K: Hash + Eq + Debug, V>(
    map: &mut HashMap<K, Vec<V>>,
    key: &K,
    node: &str,
) -> Result<V> {
    let stack = map.get_mut(key);
    let value = stack.and_then(Vec::pop);
    if map.get(key).is_some_and(Vec::is_empty) {
        map.remove(key);
    }
    value.ok_or_else(|| {
        SolverForgeError::InvalidState(format!(
            "{} node received a retraction of {:?} which it never saw inserted",
            node, key
        ))
    })
}

/// Source node: forwards fact tuples unchanged.
pub(crate) struct PassNode;

impl StreamNode for PassNode {
    fn process(&mut self, _side: Side, delta: Delta, out: &mut Vec<Delta>) -> Result<()> {
        out.push(delta);
        Ok(())
    }
}

pub(crate) struct FilterNode {
    predicate: Predicate,
    passed: HashMap<Tuple, Vec<bool>>,
}

impl FilterNode {
    pub(crate) fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            passed: HashMap::new(),
        }
    }
}

impl StreamNode for FilterNode {
    fn process(&mut self, _side: Side, delta: Delta, out: &mut Vec<Delta>) -> Result<()> {
        match delta {
            Delta::Insert(tuple) => {
                let pass = self.predicate.test(&tuple);
                push_entry(&mut self.passed, tuple.clone(), pass);
                if pass {
                    out.push(Delta::Insert(tuple));
                }
            }
            Delta::Retract(tuple) => {
                if pop_entry(&mut self.passed, &tuple, "filter")? {
                    out.push(Delta::Retract(tuple));
                }
            }
        }
        Ok(())
    }
}

/// `map` replaces the tuple with the mapped values; `expand` appends them.
pub(crate) struct MapNode {
    mappings: Vec<Mapping>,
    expand: bool,
    outputs: HashMap<Tuple, Vec<Tuple>>,
}

impl MapNode {
    pub(crate) fn new(mappings: Vec<Mapping>, expand: bool) -> Self {
        Self {
            mappings,
            expand,
            outputs: HashMap::new(),
        }
    }

    fn label(&self) -> &'static str {
        if self.expand {
            "expand"
        } else {
            "map"
        }
    }
}

impl StreamNode for MapNode {
    fn process(&mut self, _side: Side, delta: Delta, out: &mut Vec<Delta>) -> Result<()> {
        match delta {
            Delta::Insert(tuple) => {
                let mapped = self.mappings.iter().map(|m| m.apply(&tuple));
                let output = if self.expand {
                    tuple.extended(mapped)
                } else {
                    Tuple::new(mapped)
                };
                push_entry(&mut self.outputs, tuple, output.clone());
                out.push(Delta::Insert(output));
            }
            Delta::Retract(tuple) => {
                let label = self.label();
                let output = pop_entry(&mut self.outputs, &tuple, label)?;
                out.push(Delta::Retract(output));
            }
        }
        Ok(())
    }
}

/// Replaces the last element by each element of the collection it maps to.
pub(crate) struct FlattenNode {
    mapping: Mapping,
    outputs: HashMap<Tuple, Vec<Vec<Tuple>>>,
}

impl FlattenNode {
    pub(crate) fn new(mapping: Mapping) -> Self {
        Self {
            mapping,
            outputs: HashMap::new(),
        }
    }

    fn flatten(&self, tuple: &Tuple) -> Result<Vec<Tuple>> {
        let last = tuple.last().cloned().unwrap_or(Value::None);
        let collection = self.mapping.apply(&Tuple::single(last));
        let elements = collection.elements().ok_or_else(|| {
            SolverForgeError::Type(format!(
                "flatten_last mapping must return a list, set or map, got {}",
                collection.type_label()
            ))
        })?;
        Ok(elements.map(|item| tuple.with_last(item.clone())).collect())
    }
}

impl StreamNode for FlattenNode {
    fn process(&mut self, _side: Side, delta: Delta, out: &mut Vec<Delta>) -> Result<()> {
        match delta {
            Delta::Insert(tuple) => {
                let produced = self.flatten(&tuple)?;
                out.extend(produced.iter().cloned().map(Delta::Insert));
                push_entry(&mut self.outputs, tuple, produced);
            }
            Delta::Retract(tuple) => {
                let produced = pop_entry(&mut self.outputs, &tuple, "flatten_last")?;
                out.extend(produced.into_iter().map(Delta::Retract));
            }
        }
        Ok(())
    }
}

/// Emits a tuple on its first copy and retracts it with its last.
#[derive(Default)]
pub(crate) struct DistinctNode {
    counts: HashMap<Tuple, usize>,
}

impl StreamNode for DistinctNode {
    fn process(&mut self, _side: Side, delta: Delta, out: &mut Vec<Delta>) -> Result<()> {
        match delta {
            Delta::Insert(tuple) => {
                let count = self.counts.entry(tuple.clone()).or_insert(0);
                *count += 1;
                if *count == 1 {
                    out.push(Delta::Insert(tuple));
                }
            }
            Delta::Retract(tuple) => {
                let Some(count) = self.counts.get_mut(&tuple) else {
                    return Err(SolverForgeError::InvalidState(format!(
                        "distinct node received a retraction of {:?} which it never saw inserted",
                        tuple
                    )));
                };
                *count -= 1;
                if *count == 0 {
                    self.counts.remove(&tuple);
                    out.push(Delta::Retract(tuple));
                }
            }
        }
        Ok(())
    }
}

/// Union of two streams; the narrower side is padded to the output arity.
pub(crate) struct ConcatNode {
    left_padding: Vec<Mapping>,
    right_padding: Vec<Mapping>,
    outputs: HashMap<(Side, Tuple), Vec<Tuple>>,
}

impl ConcatNode {
    pub(crate) fn new(left_padding: Vec<Mapping>, right_padding: Vec<Mapping>) -> Self {
        Self {
            left_padding,
            right_padding,
            outputs: HashMap::new(),
        }
    }
}

impl StreamNode for ConcatNode {
    fn process(&mut self, side: Side, delta: Delta, out: &mut Vec<Delta>) -> Result<()> {
        match delta {
            Delta::Insert(tuple) => {
                let padding = match side {
                    Side::Left => &self.left_padding,
                    Side::Right => &self.right_padding,
                };
                let output = if padding.is_empty() {
                    tuple.clone()
                } else {
                    tuple.extended(padding.iter().map(|m| m.apply(&tuple)))
                };
                push_entry(&mut self.outputs, (side, tuple), output.clone());
                out.push(Delta::Insert(output));
            }
            Delta::Retract(tuple) => {
                let output = pop_entry(&mut self.outputs, &(side, tuple), "concat")?;
                out.push(Delta::Retract(output));
            }
        }
        Ok(())
    }
}
