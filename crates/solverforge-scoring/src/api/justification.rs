//! Why a constraint matched.
//!
//! Every match carries a [`ConstraintJustification`]: by default the facts of
//! the matched tuple and the match score, or whatever value the constraint's
//! `justify_with` function returns. Justifications are the keys that pair
//! matches when two score analyses are diffed, so custom justifications must
//! implement value equality (`Eq + Hash`).

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use solverforge_core::{Score, Value};

/// Facts of a matched tuple plus the score of the match.
///
/// Equality and hashing only look at the facts, so the same tuple matched
/// under two different weights pairs up in a diff.
#[derive(Debug, Clone, Serialize)]
pub struct DefaultConstraintJustification<Sc: Score> {
    pub facts: Vec<Value>,
    pub impact: Sc,
}

impl<Sc: Score> DefaultConstraintJustification<Sc> {
    pub fn new(facts: Vec<Value>, impact: Sc) -> Self {
        Self { facts, impact }
    }
}

impl<Sc: Score> PartialEq for DefaultConstraintJustification<Sc> {
    fn eq(&self, other: &Self) -> bool {
        self.facts == other.facts
    }
}

impl<Sc: Score> Eq for DefaultConstraintJustification<Sc> {}

impl<Sc: Score> Hash for DefaultConstraintJustification<Sc> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.facts.hash(state);
    }
}

impl<Sc: Score> fmt::Display for DefaultConstraintJustification<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, fact) in self.facts.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_value(f, fact)?;
        }
        f.write_str("]")
    }
}

/// Justification of one constraint match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ConstraintJustification<Sc: Score> {
    Default(DefaultConstraintJustification<Sc>),
    /// Value returned by a `justify_with` function.
    Custom(Value),
}

impl<Sc: Score> ConstraintJustification<Sc> {
    /// Facts of a default justification.
    pub fn facts(&self) -> Option<&[Value]> {
        match self {
            ConstraintJustification::Default(default) => Some(&default.facts),
            ConstraintJustification::Custom(_) => None,
        }
    }

    /// A custom justification read back as its original type.
    pub fn downcast<T: std::any::Any>(&self) -> Option<&T> {
        match self {
            ConstraintJustification::Custom(value) => value.downcast::<T>(),
            ConstraintJustification::Default(_) => None,
        }
    }
}

impl<Sc: Score> fmt::Display for ConstraintJustification<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintJustification::Default(default) => default.fmt(f),
            ConstraintJustification::Custom(value) => write_value(f, value),
        }
    }
}

// Facts print as their identity (`Shift(3)`), anything else as the value.
pub(crate) fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Fact(fact) => write!(f, "{}", fact),
        other => write!(f, "{}", other),
    }
}

/// A value printed the way justifications print it.
pub(crate) struct DisplayValue<'a>(pub(crate) &'a Value);

impl fmt::Display for DisplayValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self.0)
    }
}
