//! SolverForge Core - Core types and traits for constraint streams
//!
//! This crate provides the fundamental abstractions shared by the scoring
//! engine:
//! - Score types for representing solution quality
//! - Constraint identity and impact classification
//! - The value model carried by stream tuples
//! - Schema descriptors for the domain model
//! - The error taxonomy

pub mod constraint;
pub mod domain;
pub mod error;
pub mod score;

pub use constraint::{ConstraintRef, ImpactType};
pub use domain::{DomainSchema, FactId, FactRef, Tuple, Value};
pub use error::{Result, SolverForgeError};
pub use score::{
    HardMediumSoftDecimalScore, HardMediumSoftScore, HardSoftDecimalScore, HardSoftScore, Score,
    ScoreParseError, SimpleDecimalScore, SimpleScore,
};
pub use rust_decimal::Decimal;
