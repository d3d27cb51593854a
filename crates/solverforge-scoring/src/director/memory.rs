// Working memory of a session: every live fact with its assignment flag.

use std::any::TypeId;
use std::collections::BTreeMap;

use solverforge_core::{FactId, FactRef};
use solverforge_core::domain::FactSource;

struct Entry {
    fact: FactRef,
    assigned: bool,
}

#[derive(Default)]
pub(crate) struct WorkingMemory {
    // Ids grow with insertion, so the map iterates in insertion order.
    facts: BTreeMap<FactId, Entry>,
    next_id: u64,
}

impl WorkingMemory {
    pub(crate) fn next_id(&mut self) -> FactId {
        let id = FactId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Adds or replaces the fact carrying this id.
    pub(crate) fn put(&mut self, fact: FactRef, assigned: bool) {
        self.facts.insert(fact.id(), Entry { fact, assigned });
    }

    pub(crate) fn get(&self, id: FactId) -> Option<(&FactRef, bool)> {
        self.facts.get(&id).map(|e| (&e.fact, e.assigned))
    }

    pub(crate) fn is_assigned(&self, id: FactId) -> bool {
        self.facts.get(&id).is_some_and(|e| e.assigned)
    }

    pub(crate) fn set_assigned(&mut self, id: FactId, assigned: bool) {
        if let Some(entry) = self.facts.get_mut(&id) {
            entry.assigned = assigned;
        }
    }

    pub(crate) fn remove(&mut self, id: FactId) -> Option<(FactRef, bool)> {
        self.facts.remove(&id).map(|e| (e.fact, e.assigned))
    }

    /// Snapshot of every fact with its assignment, in insertion order.
    pub(crate) fn entries(&self) -> Vec<(FactRef, bool)> {
        self.facts
            .values()
            .map(|e| (e.fact.clone(), e.assigned))
            .collect()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&FactRef, bool)> {
        self.facts.values().map(|e| (&e.fact, e.assigned))
    }

    pub(crate) fn len(&self) -> usize {
        self.facts.len()
    }
}

impl FactSource for WorkingMemory {
    fn facts_of(&self, type_id: TypeId) -> Vec<FactRef> {
        self.facts
            .values()
            .filter(|e| e.fact.type_id() == type_id)
            .map(|e| e.fact.clone())
            .collect()
    }
}
