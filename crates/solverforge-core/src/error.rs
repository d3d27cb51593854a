//! Error types for SolverForge

use thiserror::Error;

use crate::score::ScoreParseError;

/// Main error type for SolverForge operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverForgeError {
    /// An operator received the wrong number of functions or arguments.
    #[error("{operator} requires {expected} {what}, got {actual}")]
    ArgumentCount {
        operator: &'static str,
        expected: String,
        what: &'static str,
        actual: usize,
    },

    /// Malformed stream, joiner or collector configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value or function was used where its kind is not allowed
    #[error("Type error: {0}")]
    Type(String),

    /// Lookup of a constraint that does not exist
    #[error("No such constraint: {0}")]
    NoSuchConstraint(String),

    /// Lookup by bare name matched constraints in several packages
    #[error("Ambiguous constraint name: {0}")]
    AmbiguousConstraint(String),

    /// Two score analyses cannot be compared
    #[error("Incompatible score analyses: {0}")]
    IncompatibleAnalyses(String),

    /// A user function failed while a constraint was being evaluated
    #[error("Constraint ({constraint}) failed: {message}")]
    Evaluation { constraint: String, message: String },

    /// Score text could not be parsed
    #[error("Score parse error: {0}")]
    ScoreParse(#[from] ScoreParseError),

    /// A fact handle that is not part of working memory
    #[error("Unknown fact: {0}")]
    UnknownFact(String),

    /// Invalid operation for the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl SolverForgeError {
    /// Builds an argument-count error for an operator.
    pub fn argument_count(
        operator: &'static str,
        expected: impl ToString,
        what: &'static str,
        actual: usize,
    ) -> Self {
        SolverForgeError::ArgumentCount {
            operator,
            expected: expected.to_string(),
            what,
            actual,
        }
    }

    /// Attaches a constraint id to an evaluation failure.
    ///
    /// Failures that already name a constraint are returned unchanged.
    pub fn in_constraint(self, constraint: &str) -> Self {
        match self {
            SolverForgeError::Evaluation { .. } => self,
            other => SolverForgeError::Evaluation {
                constraint: constraint.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for SolverForge operations
pub type Result<T> = std::result::Result<T, SolverForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_count_message() {
        let err = SolverForgeError::argument_count("concat", 2, "padding functions", 1);
        assert_eq!(err.to_string(), "concat requires 2 padding functions, got 1");
    }

    #[test]
    fn test_in_constraint_wraps_once() {
        let err = SolverForgeError::Type("boom".into()).in_constraint("pkg/c1");
        assert_eq!(err.to_string(), "Constraint (pkg/c1) failed: Type error: boom");
        let again = err.in_constraint("pkg/c2");
        assert!(again.to_string().contains("pkg/c1"));
    }
}
