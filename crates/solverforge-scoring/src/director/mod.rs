//! Constraint sessions.
//!
//! - [`ConstraintProvider`] - Defines the constraints of a problem
//! - [`ConstraintRegistry`] - Schema, configuration and constraints with their effective weights
//! - [`ConstraintSession`] - Working memory with incremental scoring, explanation and analysis

mod memory;
mod provider;
mod registry;
mod session;

#[cfg(test)]
mod tests;

pub use provider::ConstraintProvider;
pub use registry::ConstraintRegistry;
pub use session::ConstraintSession;
