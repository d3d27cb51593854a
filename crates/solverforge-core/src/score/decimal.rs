//! Scores with arbitrary-precision decimal levels.
//!
//! Decimal scores accept fractional match weights, which keeps statistics
//! such as load-balance unfairness exact without scaling them into integers.

use rust_decimal::Decimal;

level_score! {
    /// A single-level decimal score.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_decimal::Decimal;
    /// use solverforge_core::{Score, SimpleDecimalScore};
    ///
    /// let score = SimpleDecimalScore::of(Decimal::new(-15, 1));
    /// assert_eq!(score.to_string(), "-1.5");
    /// ```
    SimpleDecimalScore(Decimal) { score => "" } feasible []
}

level_score! {
    /// A hard/soft score with decimal levels.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_decimal::Decimal;
    /// use solverforge_core::{HardSoftDecimalScore, Score};
    ///
    /// let weight = HardSoftDecimalScore::ONE_SOFT;
    /// let impact = weight.multiply_decimal(Decimal::new(25, 1));
    /// assert_eq!(impact.soft(), Decimal::new(25, 1));
    /// assert_eq!(impact.to_short_string(), "2.5soft");
    /// ```
    HardSoftDecimalScore(Decimal) { hard => "hard", soft => "soft" } feasible [hard]
}

level_score! {
    /// A hard/medium/soft score with decimal levels.
    HardMediumSoftDecimalScore(Decimal) { hard => "hard", medium => "medium", soft => "soft" } feasible [hard]
}

impl SimpleDecimalScore {
    pub const ZERO: SimpleDecimalScore = SimpleDecimalScore::of(Decimal::ZERO);
    pub const ONE: SimpleDecimalScore = SimpleDecimalScore::of(Decimal::ONE);
}

impl HardSoftDecimalScore {
    pub const ZERO: HardSoftDecimalScore = HardSoftDecimalScore::of(Decimal::ZERO, Decimal::ZERO);
    pub const ONE_HARD: HardSoftDecimalScore = HardSoftDecimalScore::of(Decimal::ONE, Decimal::ZERO);
    pub const ONE_SOFT: HardSoftDecimalScore = HardSoftDecimalScore::of(Decimal::ZERO, Decimal::ONE);

    pub fn of_hard(hard: Decimal) -> Self {
        HardSoftDecimalScore::of(hard, Decimal::ZERO)
    }

    pub fn of_soft(soft: Decimal) -> Self {
        HardSoftDecimalScore::of(Decimal::ZERO, soft)
    }
}

impl HardMediumSoftDecimalScore {
    pub const ZERO: HardMediumSoftDecimalScore =
        HardMediumSoftDecimalScore::of(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
    pub const ONE_HARD: HardMediumSoftDecimalScore =
        HardMediumSoftDecimalScore::of(Decimal::ONE, Decimal::ZERO, Decimal::ZERO);
    pub const ONE_MEDIUM: HardMediumSoftDecimalScore =
        HardMediumSoftDecimalScore::of(Decimal::ZERO, Decimal::ONE, Decimal::ZERO);
    pub const ONE_SOFT: HardMediumSoftDecimalScore =
        HardMediumSoftDecimalScore::of(Decimal::ZERO, Decimal::ZERO, Decimal::ONE);
}
