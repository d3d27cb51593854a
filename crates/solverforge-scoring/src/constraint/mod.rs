//! Compiled constraints and their incremental evaluation.
//!
//! A [`Constraint`] is the immutable result of a stream definition. A
//! session compiles every constraint into a node graph ([`graph`]) fed with
//! fact insertions and retractions; the tuples reaching the end of the graph
//! become matches in the constraint's [`MatchTracker`].

mod exists;
mod graph;
mod group;
mod join;
mod nodes;
mod runtime;
mod tracker;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

use solverforge_core::{ConstraintRef, ImpactType, Score};

use crate::stream::definition::StreamDef;
use crate::stream::{Indicter, Justifier, MatchWeigher};

pub(crate) use runtime::ConstraintRuntime;

/// A named, weighted rule over a stream.
pub struct Constraint<Sc: Score> {
    pub(crate) constraint_ref: ConstraintRef,
    pub(crate) description: String,
    pub(crate) impact_type: ImpactType,
    pub(crate) weight: Sc,
    pub(crate) weigher: MatchWeigher,
    pub(crate) justifier: Option<Justifier<Sc>>,
    pub(crate) indicter: Option<Indicter>,
    pub(crate) stream: Arc<StreamDef>,
}

impl<Sc: Score> Constraint<Sc> {
    pub fn constraint_ref(&self) -> &ConstraintRef {
        &self.constraint_ref
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn impact_type(&self) -> ImpactType {
        self.impact_type
    }

    /// Weight declared by the stream; sessions may override it.
    pub fn weight(&self) -> Sc {
        self.weight
    }
}

impl<Sc: Score> fmt::Debug for Constraint<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("id", &self.constraint_ref.constraint_id())
            .field("impact_type", &self.impact_type)
            .field("weight", &self.weight)
            .field("stream", &self.stream)
            .finish()
    }
}
