//! Numeric representation of a single score level.

use std::fmt::Display;
use std::ops::{Add, Neg, Sub};

use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::ScoreParseError;

/// A number that can hold one level of a score.
///
/// Implemented for `i64` (integer scores) and `Decimal` (decimal scores).
pub trait LevelNumber:
    Copy
    + Ord
    + Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
{
    const ZERO: Self;
    const DECIMAL: bool;

    fn times(self, multiplicand: i64) -> Self;

    fn times_decimal(self, multiplicand: Decimal) -> Self;

    fn to_decimal(self) -> Decimal;

    fn parse_level(text: &str) -> Result<Self, ScoreParseError>;
}

impl LevelNumber for i64 {
    const ZERO: Self = 0;
    const DECIMAL: bool = false;

    #[inline]
    fn times(self, multiplicand: i64) -> Self {
        self * multiplicand
    }

    fn times_decimal(self, multiplicand: Decimal) -> Self {
        let product = (Decimal::from(self) * multiplicand)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        product.to_i64().unwrap_or(if product.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        })
    }

    #[inline]
    fn to_decimal(self) -> Decimal {
        Decimal::from(self)
    }

    fn parse_level(text: &str) -> Result<Self, ScoreParseError> {
        text.parse::<i64>()
            .map_err(|e| ScoreParseError::new(format!("invalid integer level '{}': {}", text, e)))
    }
}

impl LevelNumber for Decimal {
    const ZERO: Self = Decimal::ZERO;
    const DECIMAL: bool = true;

    #[inline]
    fn times(self, multiplicand: i64) -> Self {
        self * Decimal::from(multiplicand)
    }

    #[inline]
    fn times_decimal(self, multiplicand: Decimal) -> Self {
        self * multiplicand
    }

    #[inline]
    fn to_decimal(self) -> Decimal {
        self
    }

    fn parse_level(text: &str) -> Result<Self, ScoreParseError> {
        text.parse::<Decimal>()
            .map_err(|e| ScoreParseError::new(format!("invalid decimal level '{}': {}", text, e)))
    }
}
