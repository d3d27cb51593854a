// Existence filter: passes left tuples by the number of matching right
// tuples. Right-side changes flip left tuples whose count crosses zero.

use solverforge_core::{Result, Tuple};

use super::graph::{Delta, StreamNode};
use super::join::{EntryId, JoinIndex, JoinPlan};
use crate::stream::definition::Side;
use crate::stream::joiner::Joiner;
use crate::stream::ExistenceMode;

pub(crate) struct ExistsNode {
    plan: JoinPlan,
    mode: ExistenceMode,
    left: JoinIndex,
    right: JoinIndex,
    next_id: EntryId,
}

impl ExistsNode {
    pub(crate) fn new(joiners: &[Joiner], mode: ExistenceMode) -> Self {
        Self {
            plan: JoinPlan::new(joiners),
            mode,
            left: JoinIndex::default(),
            right: JoinIndex::default(),
            next_id: 0,
        }
    }

    fn passes(&self, count: usize) -> bool {
        match self.mode {
            ExistenceMode::Exists => count > 0,
            ExistenceMode::NotExists => count == 0,
        }
    }

    fn next_id(&mut self) -> EntryId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // Emits the change of a left tuple whose match count moved.
    fn flip(&self, before: usize, after: usize, tuple: Tuple, out: &mut Vec<Delta>) {
        match (self.passes(before), self.passes(after)) {
            (false, true) => out.push(Delta::Insert(tuple)),
            (true, false) => out.push(Delta::Retract(tuple)),
            _ => {}
        }
    }

    fn label(&self) -> &'static str {
        match self.mode {
            ExistenceMode::Exists => "if_exists",
            ExistenceMode::NotExists => "if_not_exists",
        }
    }
}

impl StreamNode for ExistsNode {
    fn process(&mut self, side: Side, delta: Delta, out: &mut Vec<Delta>) -> Result<()> {
        match (side, delta) {
            (Side::Left, Delta::Insert(tuple)) => {
                let id = self.next_id();
                let values = self.plan.values(Side::Left, &tuple);
                let matched = self.plan.matches(Side::Left, &tuple, &values, &self.right);
                for partner in &matched {
                    if let Some(partners) = self.right.partners_mut(*partner) {
                        partners.insert(id);
                    }
                }
                if self.passes(matched.len()) {
                    out.push(Delta::Insert(tuple.clone()));
                }
                self.left
                    .insert(&self.plan, id, tuple, values, matched.into_iter().collect());
            }
            (Side::Left, Delta::Retract(tuple)) => {
                let label = self.label();
                let (id, entry) = self.left.remove(&tuple, label)?;
                for partner in &entry.partners {
                    if let Some(partners) = self.right.partners_mut(*partner) {
                        partners.remove(&id);
                    }
                }
                if self.passes(entry.partners.len()) {
                    out.push(Delta::Retract(entry.tuple));
                }
            }
            (Side::Right, Delta::Insert(tuple)) => {
                let id = self.next_id();
                let values = self.plan.values(Side::Right, &tuple);
                let matched = self.plan.matches(Side::Right, &tuple, &values, &self.left);
                for partner in &matched {
                    let Some(entry) = self.left.entries.get_mut(partner) else {
                        continue;
                    };
                    let before = entry.partners.len();
                    entry.partners.insert(id);
                    let after = entry.partners.len();
                    let tuple = entry.tuple.clone();
                    self.flip(before, after, tuple, out);
                }
                self.right
                    .insert(&self.plan, id, tuple, values, matched.into_iter().collect());
            }
            (Side::Right, Delta::Retract(tuple)) => {
                let label = self.label();
                let (id, entry) = self.right.remove(&tuple, label)?;
                for partner in &entry.partners {
                    let Some(left) = self.left.entries.get_mut(partner) else {
                        continue;
                    };
                    let before = left.partners.len();
                    left.partners.remove(&id);
                    let after = left.partners.len();
                    let tuple = left.tuple.clone();
                    self.flip(before, after, tuple, out);
                }
            }
        }
        Ok(())
    }
}
