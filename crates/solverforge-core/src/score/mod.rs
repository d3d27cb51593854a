//! Score types for representing solution quality
//!
//! Scores are used to weigh constraints and to sum their matches.
//! All score types are immutable and implement arithmetic operations.

#[macro_use]
mod macros;

mod decimal;
mod hard_medium_soft;
mod hard_soft;
pub(crate) mod level;
mod simple;
mod traits;

#[cfg(test)]
mod tests;

pub use decimal::{HardMediumSoftDecimalScore, HardSoftDecimalScore, SimpleDecimalScore};
pub use hard_medium_soft::HardMediumSoftScore;
pub use hard_soft::HardSoftScore;
pub use level::LevelNumber;
pub use simple::SimpleScore;
pub use traits::{Score, ScoreParseError};
