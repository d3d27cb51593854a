// One constraint inside a session: its compiled graph, its match tracker and
// its health.
//
// User closures run inside the graph and the tracker. A panic or an error
// there is reported against the constraint and quarantines it: its matches
// are dropped, it stops receiving traffic, and the other constraints of the
// session are unaffected.

use std::any::{Any, TypeId};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use solverforge_core::{ConstraintRef, FactRef, Result, Score, SolverForgeError};
use tracing::{debug, warn};

use super::graph::{Delta, NodeGraph};
use super::tracker::MatchTracker;
use super::Constraint;
use crate::api::ConstraintMatch;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Health {
    Active,
    // Zero weight: nothing is tracked until the weight changes.
    Disabled,
    Quarantined(String),
}

pub(crate) struct ConstraintRuntime<Sc: Score> {
    constraint: Arc<Constraint<Sc>>,
    graph: NodeGraph,
    tracker: MatchTracker<Sc>,
    health: Health,
}

impl<Sc: Score> ConstraintRuntime<Sc> {
    pub(crate) fn new(constraint: Arc<Constraint<Sc>>, weight: Sc) -> Self {
        let graph = NodeGraph::compile(&constraint.stream);
        debug!(
            constraint = %constraint.constraint_ref,
            nodes = graph.node_count(),
            graph = %graph.describe(),
            "compiled constraint"
        );
        let tracker = MatchTracker::new(&constraint, weight);
        let health = if weight.is_zero() {
            Health::Disabled
        } else {
            Health::Active
        };
        Self {
            constraint,
            graph,
            tracker,
            health,
        }
    }

    pub(crate) fn constraint(&self) -> &Arc<Constraint<Sc>> {
        &self.constraint
    }

    pub(crate) fn constraint_ref(&self) -> &ConstraintRef {
        &self.constraint.constraint_ref
    }

    pub(crate) fn listens_to(&self, class: TypeId) -> bool {
        self.graph.listens_to(class)
    }

    pub(crate) fn is_quarantined(&self) -> bool {
        matches!(self.health, Health::Quarantined(_))
    }

    pub(crate) fn weight(&self) -> Sc {
        self.tracker.weight()
    }

    pub(crate) fn insert(&mut self, fact: &FactRef, assigned: bool) -> Result<()> {
        if self.health != Health::Active {
            return Ok(());
        }
        self.guarded(|graph, tracker| {
            let mut sink = Vec::new();
            graph.insert(fact, assigned, &mut sink)?;
            sink.into_iter().try_for_each(|delta| tracker.apply(delta))
        })
    }

    pub(crate) fn retract(&mut self, fact: &FactRef, assigned: bool) -> Result<()> {
        if self.health != Health::Active {
            return Ok(());
        }
        self.guarded(|graph, tracker| {
            let mut sink: Vec<Delta> = Vec::new();
            graph.retract(fact, assigned, &mut sink)?;
            sink.into_iter().try_for_each(|delta| tracker.apply(delta))
        })
    }

    /// Swaps the constraint weight.
    ///
    /// Live matches are re-scored in place. A zero weight disables the
    /// constraint; leaving zero rebuilds its graph from `facts`, the current
    /// working memory with each fact's assignment.
    pub(crate) fn set_weight(&mut self, weight: Sc, facts: &[(FactRef, bool)]) -> Result<()> {
        match self.health {
            Health::Quarantined(_) => Ok(()),
            Health::Active if weight.is_zero() => {
                self.reset(weight);
                self.health = Health::Disabled;
                Ok(())
            }
            Health::Active => self.guarded(|_, tracker| tracker.set_weight(weight)),
            Health::Disabled if weight.is_zero() => Ok(()),
            Health::Disabled => {
                self.reset(weight);
                self.health = Health::Active;
                for (fact, assigned) in facts {
                    self.insert(fact, *assigned)?;
                }
                Ok(())
            }
        }
    }

    // Fresh graph and tracker: node memories are dropped with the matches.
    fn reset(&mut self, weight: Sc) {
        self.graph = NodeGraph::compile(&self.constraint.stream);
        self.tracker = MatchTracker::new(&self.constraint, weight);
    }

    pub(crate) fn score(&self) -> Sc {
        match self.health {
            Health::Active => self.tracker.total(),
            _ => Sc::zero(),
        }
    }

    pub(crate) fn match_count(&self) -> usize {
        match self.health {
            Health::Active => self.tracker.match_count(),
            _ => 0,
        }
    }

    pub(crate) fn matches(&self) -> Vec<ConstraintMatch<Sc>> {
        match self.health {
            Health::Active => self.tracker.snapshots(),
            _ => Vec::new(),
        }
    }

    /// Error a quarantined constraint failed with.
    pub(crate) fn failure(&self) -> Option<&str> {
        match &self.health {
            Health::Quarantined(message) => Some(message),
            _ => None,
        }
    }

    fn guarded<F>(&mut self, work: F) -> Result<()>
    where
        F: FnOnce(&mut NodeGraph, &mut MatchTracker<Sc>) -> Result<()>,
    {
        let id = self.constraint.constraint_ref.constraint_id();
        let graph = &mut self.graph;
        let tracker = &mut self.tracker;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(graph, tracker)));
        let error = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(error)) => error.in_constraint(&id),
            Err(payload) => SolverForgeError::Evaluation {
                constraint: id,
                message: panic_message(payload.as_ref()),
            },
        };
        warn!(
            constraint = %self.constraint.constraint_ref,
            error = %error,
            "constraint quarantined"
        );
        self.tracker.clear();
        self.health = Health::Quarantined(error.to_string());
        Err(error)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "user function panicked".to_string()
    }
}
