//! Three-level integer score.

level_score! {
    /// A score with hard, medium and soft integer levels.
    ///
    /// # Examples
    ///
    /// ```
    /// use solverforge_core::{HardMediumSoftScore, Score};
    ///
    /// let score = HardMediumSoftScore::of(0, -2, -7);
    /// assert!(score.is_feasible());
    /// assert_eq!(score.to_string(), "0hard/-2medium/-7soft");
    /// ```
    HardMediumSoftScore(i64) { hard => "hard", medium => "medium", soft => "soft" } feasible [hard]
}

impl HardMediumSoftScore {
    pub const ZERO: HardMediumSoftScore = HardMediumSoftScore::of(0, 0, 0);
    pub const ONE_HARD: HardMediumSoftScore = HardMediumSoftScore::of(1, 0, 0);
    pub const ONE_MEDIUM: HardMediumSoftScore = HardMediumSoftScore::of(0, 1, 0);
    pub const ONE_SOFT: HardMediumSoftScore = HardMediumSoftScore::of(0, 0, 1);
}
