// Group-by node: one group per distinct key vector, one accumulator per
// collector. A group's output tuple is re-emitted (retract old, insert new)
// only when it changes, and retracted with the group's last member.

use std::collections::HashMap;

use solverforge_core::{Result, SolverForgeError, Tuple, Value};

use super::graph::{Delta, StreamNode};
use super::nodes::{pop_entry, push_entry};
use crate::stream::collector::{Accumulator, Collector, Undo};
use crate::stream::definition::Side;
use crate::stream::Mapping;

struct Group {
    accumulators: Vec<Box<dyn Accumulator>>,
    size: usize,
    emitted: Option<Tuple>,
}

pub(crate) struct GroupNode {
    keys: Vec<Mapping>,
    collectors: Vec<Collector>,
    groups: HashMap<Vec<Value>, Group>,
    memory: HashMap<Tuple, Vec<(Vec<Value>, Vec<Undo>)>>,
}

impl GroupNode {
    pub(crate) fn new(keys: Vec<Mapping>, collectors: Vec<Collector>) -> Self {
        Self {
            keys,
            collectors,
            groups: HashMap::new(),
            memory: HashMap::new(),
        }
    }

    fn insert(&mut self, tuple: Tuple, out: &mut Vec<Delta>) -> Result<()> {
        let key: Vec<Value> = self.keys.iter().map(|k| k.apply(&tuple)).collect();
        let collectors = &self.collectors;
        let group = self.groups.entry(key.clone()).or_insert_with(|| Group {
            accumulators: collectors.iter().map(Collector::create_accumulator).collect(),
            size: 0,
            emitted: None,
        });

        let mut undos = Vec::with_capacity(group.accumulators.len());
        for index in 0..group.accumulators.len() {
            match group.accumulators[index].accumulate(&tuple) {
                Ok(undo) => undos.push(undo),
                Err(e) => {
                    for (acc, undo) in group.accumulators.iter_mut().zip(undos) {
                        acc.retract(undo);
                    }
                    if group.size == 0 {
                        self.groups.remove(&key);
                    }
                    return Err(e);
                }
            }
        }
        group.size += 1;
        refresh(&key, group, out);
        push_entry(&mut self.memory, tuple, (key, undos));
        Ok(())
    }

    fn retract(&mut self, tuple: Tuple, out: &mut Vec<Delta>) -> Result<()> {
        let (key, undos) = pop_entry(&mut self.memory, &tuple, "group_by")?;
        let Some(group) = self.groups.get_mut(&key) else {
            return Err(SolverForgeError::InvalidState(format!(
                "group_by node has no group {:?} for retracted {:?}",
                key, tuple
            )));
        };
        for (acc, undo) in group.accumulators.iter_mut().zip(undos) {
            acc.retract(undo);
        }
        group.size -= 1;
        if group.size == 0 {
            if let Some(old) = group.emitted.take() {
                out.push(Delta::Retract(old));
            }
            self.groups.remove(&key);
        } else {
            refresh(&key, group, out);
        }
        Ok(())
    }
}

fn refresh(key: &[Value], group: &mut Group, out: &mut Vec<Delta>) {
    let result = Tuple::new(
        key.iter()
            .cloned()
            .chain(group.accumulators.iter().map(|acc| acc.finish())),
    );
    if group.emitted.as_ref() == Some(&result) {
        return;
    }
    if let Some(old) = group.emitted.take() {
        out.push(Delta::Retract(old));
    }
    out.push(Delta::Insert(result.clone()));
    group.emitted = Some(result);
}

impl StreamNode for GroupNode {
    fn process(&mut self, _side: Side, delta: Delta, out: &mut Vec<Delta>) -> Result<()> {
        match delta {
            Delta::Insert(tuple) => self.insert(tuple, out),
            Delta::Retract(tuple) => self.retract(tuple, out),
        }
    }
}
