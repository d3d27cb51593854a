// Node graph compiled from one constraint's stream definition.
//
// Facts enter at `ForEach` source nodes and flow to the terminal as
// insertions and retractions. A node may feed several children (a stream
// used twice), and a join may be fed by the same parent on both sides (a
// self-join). Children of a node are visited in the order they were
// compiled, which puts the left side of a self-join first.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use solverforge_core::{FactRef, Result, Tuple, Value};

use super::exists::ExistsNode;
use super::group::GroupNode;
use super::join::JoinNode;
use super::nodes::{ConcatNode, DistinctNode, FilterNode, FlattenNode, MapNode, PassNode};
use crate::stream::definition::{Side, StreamDef, StreamOp};

pub(crate) type NodeId = usize;

/// A change flowing between nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Delta {
    Insert(Tuple),
    Retract(Tuple),
}

/// One operator of the compiled graph.
///
/// `process` receives a change on one input port and appends the changes of
/// its own output to `out`. A node must only retract tuples it inserted.
pub(crate) trait StreamNode: Send {
    fn process(&mut self, side: Side, delta: Delta, out: &mut Vec<Delta>) -> Result<()>;
}

struct Source {
    node: NodeId,
    class: TypeId,
    include_unassigned: bool,
}

pub(crate) struct NodeGraph {
    nodes: Vec<Box<dyn StreamNode>>,
    labels: Vec<&'static str>,
    children: Vec<Vec<(NodeId, Side)>>,
    sources: Vec<Source>,
    terminal: NodeId,
}

impl NodeGraph {
    pub(crate) fn compile(stream: &Arc<StreamDef>) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            labels: Vec::new(),
            children: Vec::new(),
            sources: Vec::new(),
            terminal: 0,
        };
        let mut compiled = HashMap::new();
        graph.terminal = graph.add(stream, &mut compiled);
        graph
    }

    // Shared definitions compile once, keyed by their address.
    fn add(
        &mut self,
        def: &Arc<StreamDef>,
        compiled: &mut HashMap<*const StreamDef, NodeId>,
    ) -> NodeId {
        if let Some(&id) = compiled.get(&Arc::as_ptr(def)) {
            return id;
        }
        let parents: Vec<(NodeId, Side)> = def
            .parents()
            .into_iter()
            .map(|(parent, side)| (self.add(parent, compiled), side))
            .collect();

        let node: Box<dyn StreamNode> = match &def.op {
            StreamOp::ForEach { .. } => Box::new(PassNode),
            StreamOp::Filter { predicate, .. } => Box::new(FilterNode::new(predicate.clone())),
            StreamOp::Join { joiners, .. } => Box::new(JoinNode::new(joiners)),
            StreamOp::Exists { joiners, mode, .. } => Box::new(ExistsNode::new(joiners, *mode)),
            StreamOp::GroupBy {
                keys, collectors, ..
            } => Box::new(GroupNode::new(keys.clone(), collectors.clone())),
            StreamOp::Map { mappings, .. } => Box::new(MapNode::new(mappings.clone(), false)),
            StreamOp::Expand { mappings, .. } => Box::new(MapNode::new(mappings.clone(), true)),
            StreamOp::FlattenLast { mapping, .. } => Box::new(FlattenNode::new(mapping.clone())),
            StreamOp::Distinct { .. } => Box::new(DistinctNode::default()),
            StreamOp::Concat {
                left_padding,
                right_padding,
                ..
            } => Box::new(ConcatNode::new(left_padding.clone(), right_padding.clone())),
        };

        let id = self.nodes.len();
        self.nodes.push(node);
        self.labels.push(def.label());
        self.children.push(Vec::new());
        for (parent, side) in parents {
            self.children[parent].push((id, side));
        }
        if let StreamOp::ForEach {
            class,
            include_unassigned,
            ..
        } = &def.op
        {
            self.sources.push(Source {
                node: id,
                class: *class,
                include_unassigned: *include_unassigned,
            });
        }
        compiled.insert(Arc::as_ptr(def), id);
        id
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether any source of this graph reads facts of the given class.
    pub(crate) fn listens_to(&self, class: TypeId) -> bool {
        self.sources.iter().any(|source| source.class == class)
    }

    /// Feeds a fact into the sources reading its class.
    ///
    /// Sources excluding unassigned entities ignore the fact unless
    /// `assigned` holds. Tuples reaching the terminal are appended to `sink`.
    pub(crate) fn insert(&mut self, fact: &FactRef, assigned: bool, sink: &mut Vec<Delta>) -> Result<()> {
        self.feed(fact, assigned, sink, Delta::Insert)
    }

    /// Withdraws a fact previously fed with the same `assigned` flag.
    pub(crate) fn retract(&mut self, fact: &FactRef, assigned: bool, sink: &mut Vec<Delta>) -> Result<()> {
        self.feed(fact, assigned, sink, Delta::Retract)
    }

    fn feed(
        &mut self,
        fact: &FactRef,
        assigned: bool,
        sink: &mut Vec<Delta>,
        delta: fn(Tuple) -> Delta,
    ) -> Result<()> {
        let targets: Vec<NodeId> = self
            .sources
            .iter()
            .filter(|s| s.class == fact.type_id() && (s.include_unassigned || assigned))
            .map(|s| s.node)
            .collect();
        for node in targets {
            let tuple = Tuple::single(Value::Fact(fact.clone()));
            self.propagate(node, delta(tuple), sink)?;
        }
        Ok(())
    }

    fn propagate(&mut self, node: NodeId, delta: Delta, sink: &mut Vec<Delta>) -> Result<()> {
        if node == self.terminal {
            sink.push(delta.clone());
        }
        for index in 0..self.children[node].len() {
            let (child, side) = self.children[node][index];
            let mut out = Vec::new();
            self.nodes[child].process(side, delta.clone(), &mut out)?;
            for produced in out {
                self.propagate(child, produced, sink)?;
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn labels(&self) -> &[&'static str] {
        &self.labels
    }

    pub(crate) fn describe(&self) -> String {
        self.labels.join(" -> ")
    }
}
