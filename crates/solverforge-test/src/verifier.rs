//! Assertions over a single constraint.
//!
//! # Example
//!
//! ```
//! use solverforge_config::ConstraintConfig;
//! use solverforge_test::shift::{schema, Employee, Shift, ShiftConstraints};
//! use solverforge_test::ConstraintVerifier;
//!
//! let verifier =
//!     ConstraintVerifier::new(schema(), ConstraintConfig::default(), &ShiftConstraints).unwrap();
//! verifier
//!     .verify_that(ShiftConstraints::REQUIRED_SKILL)
//!     .unwrap()
//!     .given([Shift::new(1, 0, 8, "nurse").assigned_to("Ann")])
//!     .unwrap()
//!     .given([Employee::new("Ann").with_skills(["cook"])])
//!     .unwrap()
//!     .penalizes_by(1)
//!     .unwrap();
//! ```

use solverforge_config::{ConstraintConfig, FetchPolicy};
use solverforge_core::domain::FactData;
use solverforge_core::{DomainSchema, Score, SolverForgeError};
use solverforge_scoring::{ConstraintProvider, ConstraintRegistry, ConstraintSession};
use thiserror::Error;

/// A failed expectation, or a session error while preparing it.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Broken expectation.\n    Constraint: {constraint}\n      Expected: {expected}\n        Actual: {actual}\n\n{explanation}")]
    Mismatch {
        constraint: String,
        expected: String,
        actual: String,
        explanation: String,
    },

    #[error(transparent)]
    Session(#[from] SolverForgeError),
}

pub type VerifyResult<T> = std::result::Result<T, VerifyError>;

/// Builds sessions that evaluate one constraint at a time.
pub struct ConstraintVerifier<Sc: Score> {
    registry: ConstraintRegistry<Sc>,
}

impl<Sc: Score> ConstraintVerifier<Sc> {
    pub fn new<P>(schema: DomainSchema, config: ConstraintConfig, provider: &P) -> VerifyResult<Self>
    where
        P: ConstraintProvider<Sc> + ?Sized,
    {
        Ok(Self::from_registry(ConstraintRegistry::new(
            schema, config, provider,
        )?))
    }

    pub fn from_registry(registry: ConstraintRegistry<Sc>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ConstraintRegistry<Sc> {
        &self.registry
    }

    /// Starts a verification of one constraint, named by id or bare name.
    ///
    /// Every other constraint is switched off in the verification session.
    pub fn verify_that(&self, constraint: &str) -> VerifyResult<SingleConstraintVerification<Sc>> {
        let candidates: Vec<String> = self
            .registry
            .constraints()
            .map(|c| c.constraint_ref())
            .filter(|r| r.constraint_id() == constraint || r.name == constraint)
            .map(|r| r.constraint_id())
            .collect();
        let constraint_id = match candidates.as_slice() {
            [id] => id.clone(),
            [] => return Err(SolverForgeError::NoSuchConstraint(constraint.to_string()).into()),
            _ => {
                return Err(SolverForgeError::AmbiguousConstraint(format!(
                    "{} matches {:?}",
                    constraint, candidates
                ))
                .into())
            }
        };

        let mut session = self.registry.create_session();
        let others: Vec<String> = session
            .constraint_refs()
            .into_iter()
            .map(|r| r.constraint_id())
            .filter(|id| *id != constraint_id)
            .collect();
        for id in &others {
            session.set_constraint_weight(id, Sc::zero())?;
        }
        Ok(SingleConstraintVerification {
            constraint_id,
            session,
        })
    }
}

/// Facts given to one constraint, and the assertions over its matches.
pub struct SingleConstraintVerification<Sc: Score> {
    constraint_id: String,
    session: ConstraintSession<Sc>,
}

impl<Sc: Score> SingleConstraintVerification<Sc> {
    /// Inserts facts of one type; chain calls for several types.
    pub fn given<T, I>(mut self, facts: I) -> VerifyResult<Self>
    where
        T: FactData,
        I: IntoIterator<Item = T>,
    {
        for fact in facts {
            self.session.insert(fact)?;
        }
        Ok(self)
    }

    pub fn session(&self) -> &ConstraintSession<Sc> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ConstraintSession<Sc> {
        &mut self.session
    }

    fn weight(&self) -> VerifyResult<Sc> {
        Ok(self.session.constraint_match_total(&self.constraint_id)?.weight)
    }

    fn score(&self) -> VerifyResult<Sc> {
        Ok(self.session.constraint_match_total(&self.constraint_id)?.score)
    }

    fn match_count(&self) -> VerifyResult<usize> {
        Ok(self
            .session
            .constraint_match_total(&self.constraint_id)?
            .match_count())
    }

    /// The summed match weights of the penalties equal `amount`.
    pub fn penalizes_by(&self, amount: i64) -> VerifyResult<()> {
        let expected = -self.weight()?.multiply(amount);
        self.expect_score(expected, format!("penalty of {}", amount))
    }

    /// The summed match weights of the rewards equal `amount`.
    pub fn rewards_with(&self, amount: i64) -> VerifyResult<()> {
        let expected = self.weight()?.multiply(amount);
        self.expect_score(expected, format!("reward of {}", amount))
    }

    /// Exactly `count` tuples are penalized.
    pub fn penalizes(&self, count: usize) -> VerifyResult<()> {
        self.expect_count(count, "penalized")
    }

    /// Exactly `count` tuples are rewarded.
    pub fn rewards(&self, count: usize) -> VerifyResult<()> {
        self.expect_count(count, "rewarded")
    }

    pub fn has_no_violations(&self) -> VerifyResult<()> {
        self.expect_count(0, "matched")
    }

    fn expect_score(&self, expected: Sc, description: String) -> VerifyResult<()> {
        let actual = self.score()?;
        if actual == expected {
            return Ok(());
        }
        self.mismatch(
            format!("{} (score {})", description, expected),
            format!("score {}", actual),
        )
    }

    fn expect_count(&self, expected: usize, verb: &str) -> VerifyResult<()> {
        let actual = self.match_count()?;
        if actual == expected {
            return Ok(());
        }
        self.mismatch(
            format!("{} {} tuple(s)", expected, verb),
            format!("{} matched tuple(s)", actual),
        )
    }

    fn mismatch(&self, expected: String, actual: String) -> VerifyResult<()> {
        let explanation = self
            .session
            .analyze(FetchPolicy::FetchAll)
            .summarize()?;
        Err(VerifyError::Mismatch {
            constraint: self.constraint_id.clone(),
            expected,
            actual,
            explanation,
        })
    }
}
