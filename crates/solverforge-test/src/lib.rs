//! Shared test fixtures for SolverForge crates.
//!
//! - [`shift`] - Shift scheduling domain: schema, facts and constraints
//! - [`verifier`] - `ConstraintVerifier`, assertions over one constraint
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! solverforge-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```
//! use solverforge_test::shift::{schema, Employee, Shift, ShiftConstraints};
//! use solverforge_test::ConstraintVerifier;
//! ```

pub mod shift;
pub mod verifier;

pub use shift::{Employee, Shift, ShiftConstraints};
pub use verifier::{ConstraintVerifier, SingleConstraintVerification, VerifyError, VerifyResult};
