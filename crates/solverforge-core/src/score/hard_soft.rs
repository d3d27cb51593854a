//! Two-level integer score.

level_score! {
    /// A score with a hard and a soft integer level.
    ///
    /// Hard levels are compared first; a solution is feasible when the hard
    /// level is not negative.
    ///
    /// # Examples
    ///
    /// ```
    /// use solverforge_core::{HardSoftScore, Score};
    ///
    /// let infeasible = HardSoftScore::of(-1, -100);
    /// let feasible = HardSoftScore::of(0, -200);
    /// assert!(feasible > infeasible);
    /// assert_eq!(infeasible.to_string(), "-1hard/-100soft");
    /// assert_eq!(HardSoftScore::of_hard(-2).to_short_string(), "-2hard");
    /// ```
    HardSoftScore(i64) { hard => "hard", soft => "soft" } feasible [hard]
}

impl HardSoftScore {
    pub const ZERO: HardSoftScore = HardSoftScore::of(0, 0);
    pub const ONE_HARD: HardSoftScore = HardSoftScore::of(1, 0);
    pub const ONE_SOFT: HardSoftScore = HardSoftScore::of(0, 1);

    #[inline]
    pub const fn of_hard(hard: i64) -> Self {
        HardSoftScore::of(hard, 0)
    }

    #[inline]
    pub const fn of_soft(soft: i64) -> Self {
        HardSoftScore::of(0, soft)
    }
}
