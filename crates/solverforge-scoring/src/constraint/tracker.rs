// Scoring terminal of one constraint.
//
// Every tuple reaching the end of a constraint's graph becomes a match with
// its own score, justification and indicted objects. The running total is
// the sum of the live match scores; a retraction removes exactly the match
// the corresponding insertion created.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use solverforge_core::{ConstraintRef, ImpactType, Result, Score, SolverForgeError, Tuple, Value};

use super::graph::Delta;
use super::Constraint;
use crate::api::{ConstraintJustification, ConstraintMatch, DefaultConstraintJustification};
use crate::stream::{Indicter, Justifier, MatchWeigher};

#[derive(Debug, Clone, Copy, PartialEq)]
enum MatchWeight {
    Int(i64),
    Decimal(Decimal),
}

struct TrackedMatch<Sc: Score> {
    tuple: Tuple,
    weight: MatchWeight,
    score: Sc,
    justification: ConstraintJustification<Sc>,
    indicted: Vec<Value>,
}

pub(crate) struct MatchTracker<Sc: Score> {
    constraint_ref: ConstraintRef,
    impact_type: ImpactType,
    weight: Sc,
    weigher: MatchWeigher,
    justifier: Option<Justifier<Sc>>,
    indicter: Option<Indicter>,
    matches: BTreeMap<u64, TrackedMatch<Sc>>,
    by_tuple: HashMap<Tuple, Vec<u64>>,
    next_id: u64,
    total: Sc,
}

impl<Sc: Score> MatchTracker<Sc> {
    pub(crate) fn new(constraint: &Constraint<Sc>, weight: Sc) -> Self {
        Self {
            constraint_ref: constraint.constraint_ref.clone(),
            impact_type: constraint.impact_type,
            weight,
            weigher: constraint.weigher.clone(),
            justifier: constraint.justifier.clone(),
            indicter: constraint.indicter.clone(),
            matches: BTreeMap::new(),
            by_tuple: HashMap::new(),
            next_id: 0,
            total: Sc::zero(),
        }
    }

    pub(crate) fn apply(&mut self, delta: Delta) -> Result<()> {
        match delta {
            Delta::Insert(tuple) => self.insert(tuple),
            Delta::Retract(tuple) => self.retract(&tuple),
        }
    }

    fn insert(&mut self, tuple: Tuple) -> Result<()> {
        let weight = self.weigh(&tuple)?;
        let score = self.score_of(weight);
        let justification = self.justify(&tuple, &score)?;
        let indicted = self.indict(&tuple);
        let id = self.next_id;
        self.next_id += 1;
        self.total = self.total + score;
        self.by_tuple.entry(tuple.clone()).or_default().push(id);
        self.matches.insert(
            id,
            TrackedMatch {
                tuple,
                weight,
                score,
                justification,
                indicted,
            },
        );
        Ok(())
    }

    fn retract(&mut self, tuple: &Tuple) -> Result<()> {
        let id = self
            .by_tuple
            .get_mut(tuple)
            .and_then(Vec::pop)
            .ok_or_else(|| {
                SolverForgeError::InvalidState(format!(
                    "constraint ({}) has no match for {:?}",
                    self.constraint_ref, tuple
                ))
            })?;
        if self.by_tuple.get(tuple).is_some_and(Vec::is_empty) {
            self.by_tuple.remove(tuple);
        }
        if let Some(removed) = self.matches.remove(&id) {
            self.total = self.total - removed.score;
        }
        Ok(())
    }

    fn weigh(&self, tuple: &Tuple) -> Result<MatchWeight> {
        let weight = match &self.weigher {
            MatchWeigher::One => MatchWeight::Int(1),
            MatchWeigher::Int(mapping) => {
                let value = mapping.apply(tuple);
                match value.as_int() {
                    Some(w) => MatchWeight::Int(w),
                    None => {
                        return Err(SolverForgeError::Type(format!(
                            "match weight must be an int, got {} ({})",
                            value.type_label(),
                            value
                        )))
                    }
                }
            }
            MatchWeigher::Decimal(mapping) => {
                let value = mapping.apply(tuple);
                match value.as_decimal() {
                    Some(w) => MatchWeight::Decimal(w),
                    None => {
                        return Err(SolverForgeError::Type(format!(
                            "match weight must be a decimal, got {} ({})",
                            value.type_label(),
                            value
                        )))
                    }
                }
            }
        };
        let negative = match weight {
            MatchWeight::Int(w) => w < 0,
            MatchWeight::Decimal(w) => w.is_sign_negative() && !w.is_zero(),
        };
        if negative && self.impact_type != ImpactType::Mixed {
            let shown = match weight {
                MatchWeight::Int(w) => w.to_string(),
                MatchWeight::Decimal(w) => w.to_string(),
            };
            return Err(SolverForgeError::Evaluation {
                constraint: self.constraint_ref.constraint_id(),
                message: format!(
                    "negative match weight ({}) for tuple {}; use impact to allow both signs",
                    shown, tuple
                ),
            });
        }
        Ok(weight)
    }

    fn score_of(&self, weight: MatchWeight) -> Sc {
        let score = match weight {
            MatchWeight::Int(w) => self.weight.multiply(w),
            MatchWeight::Decimal(w) => self.weight.multiply_decimal(w),
        };
        match self.impact_type {
            ImpactType::Penalty => -score,
            ImpactType::Reward | ImpactType::Mixed => score,
        }
    }

    fn justify(&self, tuple: &Tuple, score: &Sc) -> Result<ConstraintJustification<Sc>> {
        match &self.justifier {
            Some(justifier) => {
                let value = justifier(tuple, score);
                if value.is_collection() {
                    return Err(SolverForgeError::Config(format!(
                        "justification must not be a list, set or map, got {}; \
                         wrap the elements in a justification type",
                        value.type_label()
                    )));
                }
                Ok(ConstraintJustification::Custom(value))
            }
            None => Ok(ConstraintJustification::Default(
                DefaultConstraintJustification::new(tuple.values().to_vec(), *score),
            )),
        }
    }

    // Distinct elements of the tuple by default, in tuple order.
    fn indict(&self, tuple: &Tuple) -> Vec<Value> {
        let objects = match &self.indicter {
            Some(indicter) => indicter(tuple),
            None => tuple.values().to_vec(),
        };
        let mut distinct: Vec<Value> = Vec::with_capacity(objects.len());
        for object in objects {
            if !object.is_none() && !distinct.contains(&object) {
                distinct.push(object);
            }
        }
        distinct
    }

    pub(crate) fn weight(&self) -> Sc {
        self.weight
    }

    /// Re-scores every live match under a new weight.
    pub(crate) fn set_weight(&mut self, weight: Sc) -> Result<()> {
        self.weight = weight;
        let mut total = Sc::zero();
        let mut rescored = Vec::with_capacity(self.matches.len());
        for (id, m) in &self.matches {
            let score = self.score_of(m.weight);
            let justification = self.justify(&m.tuple, &score)?;
            total = total + score;
            rescored.push((*id, score, justification));
        }
        for (id, score, justification) in rescored {
            if let Some(m) = self.matches.get_mut(&id) {
                m.score = score;
                m.justification = justification;
            }
        }
        self.total = total;
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.matches.clear();
        self.by_tuple.clear();
        self.total = Sc::zero();
    }

    pub(crate) fn total(&self) -> Sc {
        self.total
    }

    pub(crate) fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Live matches in creation order.
    pub(crate) fn snapshots(&self) -> Vec<ConstraintMatch<Sc>> {
        self.matches
            .values()
            .map(|m| {
                ConstraintMatch::new(
                    self.constraint_ref.clone(),
                    m.justification.clone(),
                    m.indicted.clone(),
                    m.score,
                )
            })
            .collect()
    }
}
