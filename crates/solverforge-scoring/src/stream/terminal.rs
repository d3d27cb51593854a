// Scoring terminal of a stream: weight, match weigher, justification and
// indictment mappings, and the constraint name.

use std::fmt;
use std::sync::Arc;

use solverforge_core::domain::short_type_name;
use solverforge_core::{ConstraintRef, ImpactType, Result, Score, SolverForgeError, Tuple, Value};

use super::constraint_stream::ConstraintStream;
use super::function::Mapping;
use crate::constraint::Constraint;

/// Maps a tuple to the weight of its match.
#[derive(Clone, Debug)]
pub enum MatchWeigher {
    /// Every match weighs 1.
    One,
    /// The mapping returns an int.
    Int(Mapping),
    /// The mapping returns a decimal (or an int); decimal scores only.
    Decimal(Mapping),
}

/// Builds a custom justification from a matched tuple and its score.
pub type Justifier<Sc> = Arc<dyn Fn(&Tuple, &Sc) -> Value + Send + Sync>;

/// Lists the objects a matched tuple indicts.
pub type Indicter = Arc<dyn Fn(&Tuple) -> Vec<Value> + Send + Sync>;

/// A stream with its impact, waiting for a name.
pub struct ConstraintBuilder<Sc: Score> {
    stream: ConstraintStream,
    impact_type: ImpactType,
    weight: Sc,
    weigher: MatchWeigher,
    justifier: Option<Justifier<Sc>>,
    indicter: Option<Indicter>,
}

impl<Sc: Score> ConstraintBuilder<Sc> {
    pub(crate) fn new(
        stream: ConstraintStream,
        impact_type: ImpactType,
        weight: Sc,
        weigher: MatchWeigher,
    ) -> Self {
        Self {
            stream,
            impact_type,
            weight,
            weigher,
            justifier: None,
            indicter: None,
        }
    }

    /// Replaces the default justification (the tuple's facts and the match
    /// score). The result must not be a list, set or map.
    pub fn justify_with<F, V>(mut self, justifier: F) -> Self
    where
        F: Fn(&Tuple, &Sc) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.justifier = Some(Arc::new(move |t: &Tuple, s: &Sc| justifier(t, s).into()));
        self
    }

    /// Replaces the default indicted objects (the tuple's elements).
    pub fn indict_with<F>(mut self, indicter: F) -> Self
    where
        F: Fn(&Tuple) -> Vec<Value> + Send + Sync + 'static,
    {
        self.indicter = Some(Arc::new(indicter));
        self
    }

    /// Finishes the constraint in the factory's package.
    pub fn as_constraint(self, name: &str) -> Result<Constraint<Sc>> {
        self.as_constraint_described(name, "")
    }

    pub fn as_constraint_described(self, name: &str, description: &str) -> Result<Constraint<Sc>> {
        let stream = self.stream.definition()?;
        if name.trim().is_empty() {
            return Err(SolverForgeError::Config(
                "constraint name must not be empty".into(),
            ));
        }
        if name.contains('/') {
            return Err(SolverForgeError::Config(format!(
                "constraint name ({}) must not contain '/'",
                name
            )));
        }
        let constraint_ref = ConstraintRef::new(self.stream.package().as_ref(), name);
        if matches!(self.weigher, MatchWeigher::Decimal(_)) && !Sc::DECIMAL {
            return Err(SolverForgeError::Type(format!(
                "constraint ({}) uses decimal match weights, but {} has integer levels; \
                 use an integer match weigher or a decimal score type",
                constraint_ref,
                short_type_name::<Sc>()
            )));
        }
        check_weight(&constraint_ref, self.impact_type, &self.weight)?;
        Ok(Constraint {
            constraint_ref,
            description: description.to_string(),
            impact_type: self.impact_type,
            weight: self.weight,
            weigher: self.weigher,
            justifier: self.justifier,
            indicter: self.indicter,
            stream,
        })
    }
}

/// Penalty and reward weights must not have a negative level.
pub(crate) fn check_weight<Sc: Score>(
    constraint_ref: &ConstraintRef,
    impact_type: ImpactType,
    weight: &Sc,
) -> Result<()> {
    let negative = weight
        .to_level_numbers()
        .iter()
        .any(|level| level.is_sign_negative() && !level.is_zero());
    if negative && impact_type != ImpactType::Mixed {
        return Err(SolverForgeError::Config(format!(
            "constraint weight ({}) for constraint ({}) must not be negative",
            weight, constraint_ref
        )));
    }
    Ok(())
}

impl<Sc: Score> fmt::Debug for ConstraintBuilder<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintBuilder")
            .field("impact_type", &self.impact_type)
            .field("weight", &self.weight)
            .finish()
    }
}
