//! Diagnostics API.
//!
//! This module provides:
//! - Constraint matches, justifications and indictments
//! - `ScoreExplanation` with a human-readable summary
//! - `ScoreAnalysis`, a serializable per-constraint rollup that can be diffed
//! - Runtime weight override configuration

pub mod analysis;
pub mod justification;
pub mod score_analysis;
pub mod weight_overrides;

#[cfg(test)]
mod tests;

pub use analysis::{ConstraintMatch, ConstraintMatchTotal, Indictment, ScoreExplanation};
pub use justification::{ConstraintJustification, DefaultConstraintJustification};
pub use score_analysis::{ConstraintAnalysis, MatchAnalysis, ScoreAnalysis};
pub use weight_overrides::ConstraintWeightOverrides;
