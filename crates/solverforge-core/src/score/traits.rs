//! The `Score` trait shared by every score type.

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::ops::{Add, Neg, Sub};

use rust_decimal::Decimal;
use thiserror::Error;

/// Core trait for all score types.
///
/// A score is an immutable, totally ordered value made of one or more levels,
/// compared from the highest priority level down. Constraint weights are
/// scores too: a match contributes `weight * match_weight` with the sign of
/// the constraint's impact.
///
/// Scores are plain values. They are `Copy`, `Send` and `Sync`, so a score
/// taken out of a session can be handed to any thread.
pub trait Score:
    Copy
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + Eq
    + Ord
    + Hash
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Whether the levels are arbitrary-precision decimals.
    ///
    /// Only decimal scores accept decimal match weights.
    const DECIMAL: bool;

    /// Returns the zero score (identity element for addition).
    fn zero() -> Self;

    /// Returns true if every level is zero.
    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// Returns true if no hard level is negative.
    fn is_feasible(&self) -> bool;

    /// Returns the number of score levels.
    fn levels_count() -> usize;

    /// Returns the level values, highest priority first.
    fn to_level_numbers(&self) -> Vec<Decimal>;

    /// Multiplies every level by an integer match weight.
    fn multiply(&self, multiplicand: i64) -> Self;

    /// Multiplies every level by a decimal match weight.
    ///
    /// Integer scores round half away from zero.
    fn multiply_decimal(&self, multiplicand: Decimal) -> Self;

    /// Renders only the non-zero levels, or `"0"` when all are zero.
    fn to_short_string(&self) -> String;

    /// Parses the `Display` form of this score.
    fn parse(text: &str) -> Result<Self, ScoreParseError>;
}

/// Error when a score string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ScoreParseError {
    pub message: String,
}

impl ScoreParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
