//! Incremental constraint session.

use std::any::{Any, TypeId};
use std::sync::Arc;

use solverforge_config::{EnvironmentMode, FetchPolicy};
use solverforge_core::domain::{short_type_name, ClassKind, FactData, FactSource};
use solverforge_core::{
    ConstraintRef, DomainSchema, FactId, FactRef, Result, Score, SolverForgeError,
};
use tracing::{debug, trace};

use super::memory::WorkingMemory;
use crate::api::{
    ConstraintAnalysis, ConstraintMatchTotal, MatchAnalysis, ScoreAnalysis, ScoreExplanation,
};
use crate::constraint::ConstraintRuntime;
use crate::stream::check_weight;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Insert,
    Retract,
}

/// Working memory plus one compiled graph per constraint.
///
/// Every mutation is propagated to completion before the call returns, so
/// [`score`](Self::score), [`explain`](Self::explain) and
/// [`analyze`](Self::analyze) always reflect the facts inserted so far.
///
/// A failing user function quarantines its constraint; the mutation is still
/// applied to every other constraint, and the error is returned.
pub struct ConstraintSession<Sc: Score> {
    schema: Arc<DomainSchema>,
    memory: WorkingMemory,
    runtimes: Vec<ConstraintRuntime<Sc>>,
    environment_mode: EnvironmentMode,
    fetch_policy: FetchPolicy,
}

impl<Sc: Score> ConstraintSession<Sc> {
    pub(crate) fn new(
        schema: Arc<DomainSchema>,
        runtimes: Vec<ConstraintRuntime<Sc>>,
        environment_mode: EnvironmentMode,
        fetch_policy: FetchPolicy,
    ) -> Self {
        Self {
            schema,
            memory: WorkingMemory::default(),
            runtimes,
            environment_mode,
            fetch_policy,
        }
    }

    /// Adds a fact or entity and returns its handle.
    pub fn insert<T: FactData>(&mut self, data: T) -> Result<FactRef> {
        let planning_id = self.schema.planning_id(TypeId::of::<T>(), &data as &dyn Any);
        let fact = FactRef::new(self.memory.next_id(), data, planning_id);
        self.memory.put(fact.clone(), false);
        let assigned = self.schema.is_assigned(&fact, &self.memory);
        self.memory.set_assigned(fact.id(), assigned);
        trace!(fact = %fact, assigned, "insert");

        let mut failure = None;
        self.deliver(&fact, assigned, Change::Insert, &mut failure);
        self.rescan_elements(fact.type_id(), &mut failure);
        self.finish("insert", failure)?;
        Ok(fact)
    }

    /// Removes a fact. Any handle carrying the fact's id may be passed.
    pub fn retract(&mut self, fact: &FactRef) -> Result<()> {
        let (stored, assigned) = self
            .memory
            .remove(fact.id())
            .ok_or_else(|| SolverForgeError::UnknownFact(fact.to_string()))?;
        trace!(fact = %stored, "retract");

        let mut failure = None;
        self.deliver(&stored, assigned, Change::Retract, &mut failure);
        self.rescan_elements(stored.type_id(), &mut failure);
        self.finish("retract", failure)
    }

    /// Replaces the payload of a fact, keeping its identity.
    ///
    /// Tuples built from the old payload are retracted before tuples of the
    /// new payload are inserted. Returns the handle to the new payload.
    pub fn update<T: FactData>(&mut self, fact: &FactRef, data: T) -> Result<FactRef> {
        let (old, was_assigned) = self
            .memory
            .get(fact.id())
            .map(|(f, assigned)| (f.clone(), assigned))
            .ok_or_else(|| SolverForgeError::UnknownFact(fact.to_string()))?;
        if old.type_id() != TypeId::of::<T>() {
            return Err(SolverForgeError::Type(format!(
                "fact {} cannot be updated with a {}",
                old,
                short_type_name::<T>()
            )));
        }
        let planning_id = self.schema.planning_id(TypeId::of::<T>(), &data as &dyn Any);
        let new = old.replaced(data, planning_id);

        let mut failure = None;
        self.deliver(&old, was_assigned, Change::Retract, &mut failure);
        self.memory.put(new.clone(), false);
        let assigned = self.schema.is_assigned(&new, &self.memory);
        self.memory.set_assigned(new.id(), assigned);
        trace!(fact = %new, assigned, "update");
        self.deliver(&new, assigned, Change::Insert, &mut failure);
        self.rescan_elements(new.type_id(), &mut failure);
        self.finish("update", failure)?;
        Ok(new)
    }

    /// Like [`update`](Self::update), naming the planning variable that changed.
    pub fn update_variable<T: FactData>(
        &mut self,
        fact: &FactRef,
        variable: &str,
        data: T,
    ) -> Result<FactRef> {
        if self.schema.find_variable(fact.type_id(), variable).is_none() {
            return Err(SolverForgeError::Config(format!(
                "class {} has no planning variable ({})",
                fact.type_name(),
                variable
            )));
        }
        self.update(fact, data)
    }

    fn deliver(
        &mut self,
        fact: &FactRef,
        assigned: bool,
        change: Change,
        failure: &mut Option<SolverForgeError>,
    ) {
        for runtime in self
            .runtimes
            .iter_mut()
            .filter(|r| r.listens_to(fact.type_id()))
        {
            let outcome = match change {
                Change::Insert => runtime.insert(fact, assigned),
                Change::Retract => runtime.retract(fact, assigned),
            };
            if let Err(error) = outcome {
                failure.get_or_insert(error);
            }
        }
    }

    // List elements without an inverse relation are assigned while some
    // owner's list holds them; a change to an owner can flip them.
    fn rescan_elements(&mut self, owner: TypeId, failure: &mut Option<SolverForgeError>) {
        for element_type in self.schema.scanned_element_types(owner) {
            for element in self.memory.facts_of(element_type) {
                let was = self.memory.is_assigned(element.id());
                let now = self.schema.is_assigned(&element, &self.memory);
                if was == now {
                    continue;
                }
                trace!(fact = %element, assigned = now, "list membership changed");
                self.deliver(&element, was, Change::Retract, failure);
                self.memory.set_assigned(element.id(), now);
                self.deliver(&element, now, Change::Insert, failure);
            }
        }
    }

    fn finish(&self, operation: &str, failure: Option<SolverForgeError>) -> Result<()> {
        if let Some(error) = failure {
            return Err(error);
        }
        if self.environment_mode.is_asserted() {
            let expected = self.calculate_from_scratch()?;
            let actual = self.score();
            if expected != actual {
                return Err(SolverForgeError::InvalidState(format!(
                    "score corruption after {}: incremental score ({}) differs from \
                     the score calculated from scratch ({})",
                    operation, actual, expected
                )));
            }
        }
        Ok(())
    }

    /// Current total score.
    pub fn score(&self) -> Sc {
        self.runtimes
            .iter()
            .fold(Sc::zero(), |total, runtime| total + runtime.score())
    }

    /// Re-derives the score by replaying working memory through fresh graphs.
    ///
    /// Quarantined constraints contribute nothing, as in [`score`](Self::score).
    pub fn calculate_from_scratch(&self) -> Result<Sc> {
        let facts = self.memory.entries();
        let mut total = Sc::zero();
        for runtime in self.runtimes.iter().filter(|r| !r.is_quarantined()) {
            let mut fresh = ConstraintRuntime::new(runtime.constraint().clone(), runtime.weight());
            for (fact, assigned) in &facts {
                if fresh.listens_to(fact.type_id()) {
                    fresh.insert(fact, *assigned)?;
                }
            }
            total = total + fresh.score();
        }
        Ok(total)
    }

    fn runtime(&self, constraint_id: &str) -> Result<&ConstraintRuntime<Sc>> {
        self.runtimes
            .iter()
            .find(|r| r.constraint_ref().constraint_id() == constraint_id)
            .ok_or_else(|| SolverForgeError::NoSuchConstraint(constraint_id.to_string()))
    }

    fn total_of(runtime: &ConstraintRuntime<Sc>) -> ConstraintMatchTotal<Sc> {
        ConstraintMatchTotal {
            constraint_ref: runtime.constraint_ref().clone(),
            weight: runtime.weight(),
            score: runtime.score(),
            matches: runtime.matches(),
        }
    }

    /// Matches and score of one constraint, by id (`package/name`).
    pub fn constraint_match_total(&self, constraint_id: &str) -> Result<ConstraintMatchTotal<Sc>> {
        self.runtime(constraint_id).map(Self::total_of)
    }

    pub fn constraint_match_totals(&self) -> Vec<ConstraintMatchTotal<Sc>> {
        self.runtimes.iter().map(Self::total_of).collect()
    }

    /// Swaps the weight of one constraint without rebuilding the session.
    pub fn set_constraint_weight(&mut self, constraint_id: &str, weight: Sc) -> Result<()> {
        let facts = self.memory.entries();
        let runtime = self
            .runtimes
            .iter_mut()
            .find(|r| r.constraint_ref().constraint_id() == constraint_id)
            .ok_or_else(|| SolverForgeError::NoSuchConstraint(constraint_id.to_string()))?;
        check_weight(runtime.constraint_ref(), runtime.constraint().impact_type(), &weight)?;
        debug!(constraint = constraint_id, weight = %weight, "constraint weight changed");
        let failure = runtime.set_weight(weight, &facts).err();
        self.finish("set_constraint_weight", failure)
    }

    /// Snapshot of every match, per constraint and per indicted object.
    pub fn explain(&self) -> ScoreExplanation<Sc> {
        ScoreExplanation::new(self.score(), self.constraint_match_totals())
    }

    /// Serializable rollup of the current score.
    pub fn analyze(&self, policy: FetchPolicy) -> ScoreAnalysis<Sc> {
        let constraints = self
            .runtimes
            .iter()
            .map(|runtime| {
                let constraint_ref = runtime.constraint_ref().clone();
                let weight = runtime.weight();
                let score = runtime.score();
                match policy {
                    FetchPolicy::FetchAll => {
                        let matches = runtime
                            .matches()
                            .into_iter()
                            .map(|m| MatchAnalysis::new(m.constraint_ref, m.score, m.justification))
                            .collect();
                        ConstraintAnalysis::with_matches(constraint_ref, weight, score, matches)
                    }
                    FetchPolicy::FetchMatchCount => ConstraintAnalysis::without_matches(
                        constraint_ref,
                        weight,
                        score,
                        Some(runtime.match_count() as i64),
                    ),
                    FetchPolicy::FetchShallow => {
                        ConstraintAnalysis::without_matches(constraint_ref, weight, score, None)
                    }
                }
            })
            .collect();
        ScoreAnalysis::new(self.score(), constraints, self.is_solution_initialized())
    }

    /// Fetch policy configured for this session.
    pub fn fetch_policy(&self) -> FetchPolicy {
        self.fetch_policy
    }

    /// Whether every planning entity in working memory is assigned.
    pub fn is_solution_initialized(&self) -> bool {
        self.memory.iter().all(|(fact, assigned)| {
            assigned
                || self
                    .schema
                    .class(fact.type_id())
                    .map_or(true, |class| class.kind != ClassKind::PlanningEntity)
        })
    }

    /// Current handle of a fact.
    pub fn fact(&self, id: FactId) -> Option<&FactRef> {
        self.memory.get(id).map(|(fact, _)| fact)
    }

    /// Current handles of every `T`, in insertion order.
    pub fn facts_of<T: Any>(&self) -> Vec<FactRef> {
        self.memory.facts_of(TypeId::of::<T>())
    }

    pub fn fact_count(&self) -> usize {
        self.memory.len()
    }

    /// Whether a fact is visible to `for_each`.
    pub fn is_assigned(&self, fact: &FactRef) -> bool {
        self.memory.is_assigned(fact.id())
    }

    /// Constraints quarantined after a failure, with the failure.
    pub fn failed_constraints(&self) -> Vec<(&ConstraintRef, &str)> {
        self.runtimes
            .iter()
            .filter_map(|r| r.failure().map(|failure| (r.constraint_ref(), failure)))
            .collect()
    }

    pub fn constraint_refs(&self) -> Vec<&ConstraintRef> {
        self.runtimes.iter().map(ConstraintRuntime::constraint_ref).collect()
    }
}

impl<Sc: Score> std::fmt::Debug for ConstraintSession<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintSession")
            .field("facts", &self.memory.len())
            .field("constraints", &self.runtimes.len())
            .field("score", &self.score())
            .finish()
    }
}
