// Immutable description of a stream, shared between the builder and the
// graph compiler.
//
// Every builder call wraps its parent(s) in a new `StreamDef`. Parents are
// shared through `Arc`, so a stream used twice (a self-join, `concat(a, a)`,
// the right side of a complement) compiles to a single node.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use super::collector::Collector;
use super::function::{Mapping, Predicate};
use super::joiner::Joiner;

/// Whether a tuple passes when a matching tuple exists, or when none does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistenceMode {
    /// Pass if at least one match exists.
    Exists,
    /// Pass if no match exists.
    NotExists,
}

// Input port of a node with two parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Side {
    Left,
    Right,
}

pub(crate) enum StreamOp {
    ForEach {
        class: TypeId,
        class_name: &'static str,
        include_unassigned: bool,
    },
    Filter {
        parent: Arc<StreamDef>,
        predicate: Predicate,
    },
    Join {
        left: Arc<StreamDef>,
        right: Arc<StreamDef>,
        joiners: Vec<Joiner>,
    },
    // Keeps parent tuples with (or without) a matching tuple of `other`.
    Exists {
        parent: Arc<StreamDef>,
        other: Arc<StreamDef>,
        joiners: Vec<Joiner>,
        mode: ExistenceMode,
    },
    GroupBy {
        parent: Arc<StreamDef>,
        keys: Vec<Mapping>,
        collectors: Vec<Collector>,
    },
    Map {
        parent: Arc<StreamDef>,
        mappings: Vec<Mapping>,
    },
    Expand {
        parent: Arc<StreamDef>,
        mappings: Vec<Mapping>,
    },
    // The mapping receives a 1-tuple holding the last element.
    FlattenLast {
        parent: Arc<StreamDef>,
        mapping: Mapping,
    },
    Distinct {
        parent: Arc<StreamDef>,
    },
    // Paddings fill the trailing positions of the narrower side.
    Concat {
        left: Arc<StreamDef>,
        right: Arc<StreamDef>,
        left_padding: Vec<Mapping>,
        right_padding: Vec<Mapping>,
    },
}

pub(crate) struct StreamDef {
    pub(crate) op: StreamOp,
    pub(crate) arity: usize,
}

impl StreamDef {
    pub(crate) fn new(op: StreamOp, arity: usize) -> Self {
        Self { op, arity }
    }

    pub(crate) fn label(&self) -> &'static str {
        match &self.op {
            StreamOp::ForEach { .. } => "for_each",
            StreamOp::Filter { .. } => "filter",
            StreamOp::Join { .. } => "join",
            StreamOp::Exists {
                mode: ExistenceMode::Exists,
                ..
            } => "if_exists",
            StreamOp::Exists {
                mode: ExistenceMode::NotExists,
                ..
            } => "if_not_exists",
            StreamOp::GroupBy { .. } => "group_by",
            StreamOp::Map { .. } => "map",
            StreamOp::Expand { .. } => "expand",
            StreamOp::FlattenLast { .. } => "flatten_last",
            StreamOp::Distinct { .. } => "distinct",
            StreamOp::Concat { .. } => "concat",
        }
    }

    // Parents with the port they feed.
    pub(crate) fn parents(&self) -> Vec<(&Arc<StreamDef>, Side)> {
        match &self.op {
            StreamOp::ForEach { .. } => Vec::new(),
            StreamOp::Filter { parent, .. }
            | StreamOp::GroupBy { parent, .. }
            | StreamOp::Map { parent, .. }
            | StreamOp::Expand { parent, .. }
            | StreamOp::FlattenLast { parent, .. }
            | StreamOp::Distinct { parent } => vec![(parent, Side::Left)],
            StreamOp::Join { left, right, .. } | StreamOp::Concat { left, right, .. } => {
                vec![(left, Side::Left), (right, Side::Right)]
            }
            StreamOp::Exists { parent, other, .. } => {
                vec![(parent, Side::Left), (other, Side::Right)]
            }
        }
    }
}

impl fmt::Debug for StreamDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            StreamOp::ForEach {
                class_name,
                include_unassigned,
                ..
            } => write!(
                f,
                "{}({}{})",
                self.label(),
                class_name,
                if *include_unassigned { ", including unassigned" } else { "" }
            ),
            _ => {
                let mut tuple = f.debug_tuple(self.label());
                for (parent, _) in self.parents() {
                    tuple.field(parent);
                }
                tuple.finish()
            }
        }
    }
}
