//! Explicit constraint registry.
//!
//! Holds the schema, the configuration and the constraints of one problem,
//! with their effective weights, and creates sessions over them. Nothing is
//! registered globally: each solver builds its own registry.

use std::collections::HashSet;
use std::sync::Arc;

use solverforge_config::ConstraintConfig;
use solverforge_core::{DomainSchema, Result, Score, SolverForgeError};
use tracing::{debug, info, warn};

use super::provider::ConstraintProvider;
use super::session::ConstraintSession;
use crate::api::ConstraintWeightOverrides;
use crate::constraint::{Constraint, ConstraintRuntime};
use crate::stream::{check_weight, ConstraintFactory};

pub struct ConstraintRegistry<Sc: Score> {
    schema: Arc<DomainSchema>,
    config: ConstraintConfig,
    constraints: Vec<Arc<Constraint<Sc>>>,
    weights: Vec<Sc>,
}

impl<Sc: Score> ConstraintRegistry<Sc> {
    /// Builds the provider's constraints in the configured package.
    ///
    /// The package is the configuration's, or else the provider's default.
    pub fn new<P>(schema: DomainSchema, config: ConstraintConfig, provider: &P) -> Result<Self>
    where
        P: ConstraintProvider<Sc> + ?Sized,
    {
        let package = config.package.clone().unwrap_or_else(|| provider.package());
        let factory = ConstraintFactory::new(package);
        let constraints = provider.define_constraints(&factory)?;
        Self::from_constraints(schema, config, constraints)
    }

    /// Registers constraints built elsewhere.
    pub fn from_constraints(
        schema: DomainSchema,
        config: ConstraintConfig,
        constraints: Vec<Constraint<Sc>>,
    ) -> Result<Self> {
        schema.validate()?;

        let mut seen = HashSet::new();
        for constraint in &constraints {
            let id = constraint.constraint_ref().constraint_id();
            if !seen.insert(id.clone()) {
                return Err(SolverForgeError::Config(format!(
                    "constraint id ({}) is defined more than once",
                    id
                )));
            }
        }

        let overrides = ConstraintWeightOverrides::<Sc>::from_config(&config)?;
        let refs: Vec<_> = constraints.iter().map(Constraint::constraint_ref).collect();
        for key in overrides.unknown_keys(&refs) {
            warn!(key, "weight override matches no constraint");
        }

        let mut weights = Vec::with_capacity(constraints.len());
        for constraint in &constraints {
            let constraint_ref = constraint.constraint_ref();
            let weight = match overrides.get(constraint_ref) {
                Some(weight) => {
                    check_weight(constraint_ref, constraint.impact_type(), &weight)?;
                    debug!(constraint = %constraint_ref, weight = %weight, "weight override");
                    weight
                }
                None => constraint.weight(),
            };
            weights.push(weight);
        }

        info!(
            constraints = constraints.len(),
            package = constraints
                .first()
                .map_or("", |c| c.constraint_ref().package.as_str()),
            "constraint registry built"
        );
        Ok(Self {
            schema: Arc::new(schema),
            config,
            constraints: constraints.into_iter().map(Arc::new).collect(),
            weights,
        })
    }

    /// Creates an empty session over these constraints.
    pub fn create_session(&self) -> ConstraintSession<Sc> {
        let runtimes = self
            .constraints
            .iter()
            .zip(&self.weights)
            .map(|(constraint, weight)| ConstraintRuntime::new(constraint.clone(), *weight))
            .collect();
        ConstraintSession::new(
            self.schema.clone(),
            runtimes,
            self.config.environment_mode,
            self.config.analysis.fetch_policy,
        )
    }

    pub fn constraints(&self) -> impl Iterator<Item = &Constraint<Sc>> {
        self.constraints.iter().map(AsRef::as_ref)
    }

    pub fn constraint(&self, constraint_id: &str) -> Option<&Constraint<Sc>> {
        self.constraints()
            .find(|c| c.constraint_ref().constraint_id() == constraint_id)
    }

    /// Effective weight of a constraint, after overrides.
    pub fn weight_of(&self, constraint_id: &str) -> Option<Sc> {
        self.constraints
            .iter()
            .position(|c| c.constraint_ref().constraint_id() == constraint_id)
            .map(|i| self.weights[i])
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn schema(&self) -> &DomainSchema {
        &self.schema
    }

    pub fn config(&self) -> &ConstraintConfig {
        &self.config
    }
}

impl<Sc: Score> std::fmt::Debug for ConstraintRegistry<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintRegistry")
            .field("constraints", &self.constraints.len())
            .field("package", &self.config.package)
            .finish()
    }
}
