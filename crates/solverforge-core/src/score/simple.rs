//! Single-level integer score.

level_score! {
    /// A score with a single integer level.
    ///
    /// Useful when there is only one kind of constraint to optimize.
    ///
    /// # Examples
    ///
    /// ```
    /// use solverforge_core::{Score, SimpleScore};
    ///
    /// let score = SimpleScore::of(-5);
    /// assert!(SimpleScore::of(-3) > score);
    /// assert_eq!(score.to_string(), "-5");
    /// assert_eq!(SimpleScore::parse("-5").unwrap(), score);
    /// ```
    SimpleScore(i64) { score => "" } feasible []
}

impl SimpleScore {
    pub const ZERO: SimpleScore = SimpleScore::of(0);
    pub const ONE: SimpleScore = SimpleScore::of(1);
}
