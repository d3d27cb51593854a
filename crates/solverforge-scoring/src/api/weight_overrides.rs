// Runtime constraint weight configuration.
//
// Allows adjusting constraint weights without touching the constraint
// definitions. Keys are constraint ids (`package/name`) or bare names; an id
// wins over a bare name.

use std::collections::HashMap;
use std::fmt::Debug;

use solverforge_config::ConstraintConfig;
use solverforge_core::{ConstraintRef, Result, Score, SolverForgeError};

// Holds runtime overrides for constraint weights.
#[derive(Clone)]
pub struct ConstraintWeightOverrides<Sc: Score> {
    weights: HashMap<String, Sc>,
}

impl<Sc: Score> Debug for ConstraintWeightOverrides<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintWeightOverrides")
            .field("count", &self.weights.len())
            .finish()
    }
}

impl<Sc: Score> Default for ConstraintWeightOverrides<Sc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Sc: Score> ConstraintWeightOverrides<Sc> {
    // Creates an empty overrides container.
    pub fn new() -> Self {
        Self {
            weights: HashMap::new(),
        }
    }

    // Creates overrides from an iterator of (id or name, weight) pairs.
    pub fn from_pairs<I, N>(iter: I) -> Self
    where
        I: IntoIterator<Item = (N, Sc)>,
        N: Into<String>,
    {
        let weights = iter.into_iter().map(|(n, w)| (n.into(), w)).collect();
        Self { weights }
    }

    // Parses the `[weights]` table of a configuration with `Sc::parse`.
    pub fn from_config(config: &ConstraintConfig) -> Result<Self> {
        let mut overrides = Self::new();
        for (key, text) in &config.weights {
            let weight = Sc::parse(text).map_err(|e| {
                SolverForgeError::Config(format!(
                    "weight override ({}) for constraint ({}) is not a valid score: {}",
                    text, key, e
                ))
            })?;
            overrides.put(key.clone(), weight);
        }
        Ok(overrides)
    }

    // Sets the weight for a constraint.
    pub fn put<N: Into<String>>(&mut self, key: N, weight: Sc) {
        self.weights.insert(key.into(), weight);
    }

    // Removes the override for a constraint.
    pub fn remove(&mut self, key: &str) -> Option<Sc> {
        self.weights.remove(key)
    }

    // The override for a constraint: by id first, then by bare name.
    pub fn get(&self, constraint_ref: &ConstraintRef) -> Option<Sc> {
        self.weights
            .get(&constraint_ref.constraint_id())
            .or_else(|| self.weights.get(&constraint_ref.name))
            .copied()
    }

    // Gets the overridden weight, or returns the default if not overridden.
    pub fn get_or_default(&self, constraint_ref: &ConstraintRef, default: Sc) -> Sc {
        self.get(constraint_ref).unwrap_or(default)
    }

    // Keys that match none of the given constraints.
    pub fn unknown_keys<'a>(&'a self, constraints: &[&ConstraintRef]) -> Vec<&'a str> {
        let mut unknown: Vec<&str> = self
            .weights
            .keys()
            .filter(|key| {
                !constraints
                    .iter()
                    .any(|c| c.constraint_id() == **key || c.name == **key)
            })
            .map(String::as_str)
            .collect();
        unknown.sort_unstable();
        unknown
    }

    // Returns true if the key has an override.
    pub fn contains(&self, key: &str) -> bool {
        self.weights.contains_key(key)
    }

    // Returns the number of overrides.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    // Returns true if there are no overrides.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    // Clears all overrides.
    pub fn clear(&mut self) {
        self.weights.clear();
    }
}
