//! Incremental constraint stream scoring for SolverForge.
//!
//! This crate provides:
//! - Joiners and collectors (`stream::joiner`, `stream::collector`)
//! - The constraint stream builder over tuples of arity 1 to 4 (`ConstraintFactory`)
//! - Compiled node graphs updated by fact insertion, retraction and update
//! - Score attribution: constraint matches, justifications and indictments
//! - `ScoreExplanation` and diffable `ScoreAnalysis` snapshots
//!
//! # Architecture
//!
//! A [`ConstraintRegistry`] holds the constraints of one problem with their
//! effective weights. Each [`ConstraintSession`] it creates owns a working
//! memory and one node graph per constraint; sessions are single-threaded
//! and independent of each other.

// Stream functions are shared closures with long signatures
#![allow(clippy::type_complexity)]

pub mod api;
pub mod constraint;
pub mod director;
pub mod stream;

pub use api::{
    ConstraintAnalysis, ConstraintJustification, ConstraintMatch, ConstraintMatchTotal,
    ConstraintWeightOverrides, DefaultConstraintJustification, Indictment, MatchAnalysis,
    ScoreAnalysis, ScoreExplanation,
};
pub use constraint::Constraint;
pub use director::{ConstraintProvider, ConstraintRegistry, ConstraintSession};
pub use stream::{
    ConstraintBuilder, ConstraintFactory, ConstraintStream, ExistenceMode, GroupArg, Joiner,
    Mapping, Predicate,
};
