//! Graph resolution: cycle detection, pruning, id assignment and block order.
//!
//! Resolution runs in two passes over a [`Topology`]:
//!
//! 1. A depth-first pass from every declared input marks which nodes lie on
//!    a path to a declared output and rejects cycles. Each node keeps a
//!    visit state (`Unvisited`, `InProgress`, `Done`) and is expanded once;
//!    its retention is decided post-order and memoized.
//! 2. A breadth-first pass from the inputs numbers the retained nodes and
//!    admits blocks once all of their inputs are numbered, which yields a
//!    topological block order.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::block::BlockId;
use super::core::Topology;
use super::node::NodeId;
use crate::errors::GraphError;

/// The validated, pruned and ordered form of a declared topology.
///
/// Computed once and shared read-only by every build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedGraph {
    /// Dense id per arena node; `None` for pruned nodes.
    node_ids: Vec<Option<usize>>,
    /// Retained nodes in id order.
    nodes: Vec<NodeId>,
    block_order: Vec<BlockId>,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
}

impl ResolvedGraph {
    /// Resolves `topology` for the given declared inputs and outputs.
    pub fn resolve(
        topology: &Topology,
        inputs: &[NodeId],
        outputs: &[NodeId],
    ) -> Result<Self, GraphError> {
        GraphResolver::new(topology).resolve(inputs, outputs)
    }

    /// Returns the id assigned to `node`, if it was retained.
    pub fn node_id(&self, node: NodeId) -> Option<usize> {
        self.node_ids.get(node.0).copied().flatten()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.node_id(node).is_some()
    }

    /// Iterates `(node, id)` pairs in id order.
    pub fn node_to_id(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        self.nodes.iter().enumerate().map(|(id, &node)| (node, id))
    }

    /// Retained nodes in id order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Blocks in topological order.
    pub fn block_order(&self) -> &[BlockId] {
        &self.block_order
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    /// Number of arena nodes of the topology this graph was resolved from.
    pub fn topology_len(&self) -> usize {
        self.node_ids.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

/// One node on the explicit DFS stack, with a cursor over its successors.
struct Frame {
    node: NodeId,
    block_pos: usize,
    output_pos: usize,
    reaches_output: bool,
}

impl Frame {
    fn new(node: NodeId, is_output: bool) -> Self {
        Self {
            node,
            block_pos: 0,
            output_pos: 0,
            reaches_output: is_output,
        }
    }
}

/// Output of the breadth-first pass.
struct Ordering {
    node_ids: Vec<Option<usize>>,
    nodes: Vec<NodeId>,
    block_order: Vec<BlockId>,
}

/// Resolves a topology into a [`ResolvedGraph`].
pub struct GraphResolver<'a> {
    topology: &'a Topology,
}

impl<'a> GraphResolver<'a> {
    pub fn new(topology: &'a Topology) -> Self {
        Self { topology }
    }

    /// Validates and orders the graph between `inputs` and `outputs`.
    ///
    /// Cycles are only detected among nodes reachable from a declared
    /// input; a cycle no input reaches is pruned with the rest of the
    /// unreachable nodes and does not fail resolution.
    pub fn resolve(
        &self,
        inputs: &[NodeId],
        outputs: &[NodeId],
    ) -> Result<ResolvedGraph, GraphError> {
        if inputs.is_empty() {
            return Err(GraphError::NoInputs);
        }
        if outputs.is_empty() {
            return Err(GraphError::NoOutputs);
        }
        for &node in inputs.iter().chain(outputs) {
            self.topology.node(node)?;
        }

        let retained = self.mark_retained(inputs, outputs)?;
        if let Some(&node) = inputs.iter().chain(outputs).find(|n| !retained[n.0]) {
            return Err(GraphError::Disconnected { node });
        }

        let Ordering {
            node_ids,
            nodes,
            block_order,
        } = self.order_blocks(inputs, &retained)?;
        if let Some(&node) = inputs.iter().chain(outputs).find(|n| node_ids[n.0].is_none()) {
            return Err(GraphError::Disconnected { node });
        }

        for &output in outputs {
            let count = self.topology.node(output)?.in_blocks().len();
            if count != 1 {
                return Err(GraphError::OutputProducer { node: output, count });
            }
        }

        log::debug!(
            "Resolved graph: {} of {} nodes retained, {} of {} blocks ordered",
            nodes.len(),
            self.topology.num_nodes(),
            block_order.len(),
            self.topology.num_blocks()
        );

        Ok(ResolvedGraph {
            node_ids,
            nodes,
            block_order,
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
        })
    }

    /// Depth-first pass: returns, per arena node, whether it lies on a path
    /// from an input to an output.
    fn mark_retained(
        &self,
        inputs: &[NodeId],
        outputs: &[NodeId],
    ) -> Result<Vec<bool>, GraphError> {
        let num_nodes = self.topology.num_nodes();
        let mut is_output = vec![false; num_nodes];
        for output in outputs {
            is_output[output.0] = true;
        }

        let mut state = vec![VisitState::Unvisited; num_nodes];
        let mut retained = vec![false; num_nodes];

        for &start in inputs {
            if state[start.0] != VisitState::Unvisited {
                continue;
            }
            state[start.0] = VisitState::InProgress;
            let mut stack = vec![Frame::new(start, is_output[start.0])];

            while let Some(frame) = stack.last_mut() {
                match self.next_successor(frame) {
                    Some(next) => match state[next.0] {
                        VisitState::InProgress => return Err(GraphError::Cycle { node: next }),
                        VisitState::Done => {
                            if retained[next.0] {
                                frame.reaches_output = true;
                            }
                        }
                        VisitState::Unvisited => {
                            state[next.0] = VisitState::InProgress;
                            stack.push(Frame::new(next, is_output[next.0]));
                        }
                    },
                    None => {
                        let Some(done) = stack.pop() else { break };
                        state[done.node.0] = VisitState::Done;
                        retained[done.node.0] = done.reaches_output;
                        if done.reaches_output {
                            if let Some(parent) = stack.last_mut() {
                                parent.reaches_output = true;
                            }
                        }
                    }
                }
            }
        }

        Ok(retained)
    }

    /// Advances the frame's cursor to the next node reachable through one
    /// of its out-blocks.
    fn next_successor(&self, frame: &mut Frame) -> Option<NodeId> {
        let out_blocks = self.topology.node(frame.node).ok()?.out_blocks();
        while let Some(&block) = out_blocks.get(frame.block_pos) {
            let outputs = self.topology.block(block).ok()?.outputs();
            if let Some(&next) = outputs.get(frame.output_pos) {
                frame.output_pos += 1;
                return Some(next);
            }
            frame.block_pos += 1;
            frame.output_pos = 0;
        }
        None
    }

    /// Breadth-first pass: numbers retained nodes and orders blocks.
    fn order_blocks(&self, inputs: &[NodeId], retained: &[bool]) -> Result<Ordering, GraphError> {
        let mut node_ids: Vec<Option<usize>> = vec![None; self.topology.num_nodes()];
        let mut nodes = Vec::new();
        let mut queue = VecDeque::new();

        let mut assign = |node: NodeId, node_ids: &mut Vec<Option<usize>>| -> bool {
            if node_ids[node.0].is_some() {
                return false;
            }
            node_ids[node.0] = Some(nodes.len());
            nodes.push(node);
            true
        };

        for &input in inputs {
            if assign(input, &mut node_ids) {
                queue.push_back(input);
            }
        }

        let num_blocks = self.topology.num_blocks();
        let mut admitted = vec![false; num_blocks];
        let mut deferred = vec![false; num_blocks];
        let mut deferred_order = Vec::new();
        let mut block_order = Vec::new();

        while let Some(node) = queue.pop_front() {
            for &block_id in self.topology.node(node)?.out_blocks() {
                if admitted[block_id.0] {
                    continue;
                }
                let block = self.topology.block(block_id)?;
                if !block.outputs().iter().any(|o| retained[o.0]) {
                    continue;
                }
                if block.inputs().iter().any(|i| node_ids[i.0].is_none()) {
                    if !deferred[block_id.0] {
                        deferred[block_id.0] = true;
                        deferred_order.push(block_id);
                    }
                    continue;
                }

                admitted[block_id.0] = true;
                block_order.push(block_id);
                for &output in block.outputs() {
                    if retained[output.0] && assign(output, &mut node_ids) {
                        queue.push_back(output);
                    }
                }
            }
        }

        if let Some(&block) = deferred_order.iter().find(|b| !admitted[b.0]) {
            return Err(GraphError::MissingInput {
                block: self.topology.block(block)?.name().to_string(),
            });
        }

        Ok(Ordering {
            node_ids,
            nodes,
            block_order,
        })
    }
}
