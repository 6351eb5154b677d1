//! Topology - the arena owning every node and block of a declared graph.
//!
//! Nodes and blocks are given dense indices at creation time and all edges
//! are stored as indices, so graphs can be resolved, cloned and shared
//! without relying on reference identity.

use super::block::{Block, BlockId, BlockKind};
use super::node::{Node, NodeId, Shape};
use crate::errors::GraphError;
use crate::layers::Activation;

/// The declared node/block graph.
///
/// # Example
///
/// ```
/// use automodel::graph::Topology;
///
/// let mut topology = Topology::new();
/// let input = topology.add_node_with_shape(vec![4]);
/// let hidden = topology.dense(input);
/// let output = topology.regression_head(hidden);
///
/// assert_eq!(topology.num_nodes(), 3);
/// assert_eq!(topology.num_blocks(), 2);
/// assert_eq!(topology.node(output).unwrap().in_blocks().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Topology {
    nodes: Vec<Node>,
    blocks: Vec<Block>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node whose shape is not known yet.
    pub fn add_node(&mut self) -> NodeId {
        self.push_node(None)
    }

    /// Adds a node with a known per-sample shape.
    pub fn add_node_with_shape(&mut self, shape: Shape) -> NodeId {
        self.push_node(Some(shape))
    }

    fn push_node(&mut self, shape: Option<Shape>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(shape));
        id
    }

    /// Adds a block wired between existing nodes.
    ///
    /// This is the only way to close a cycle; the resolver rejects those.
    ///
    /// # Panics
    ///
    /// Panics if a node id is unknown or the arity is invalid for `kind`.
    pub fn add_block(&mut self, kind: BlockKind, inputs: &[NodeId], outputs: &[NodeId]) -> BlockId {
        let name = format!("{}_{}", kind.prefix(), self.blocks.len());
        self.add_named_block(name, kind, inputs, outputs)
    }

    /// Adds a block with an explicit name.
    pub fn add_named_block(
        &mut self,
        name: impl Into<String>,
        kind: BlockKind,
        inputs: &[NodeId],
        outputs: &[NodeId],
    ) -> BlockId {
        kind.check_arity(inputs.len(), outputs.len());
        for node in inputs.iter().chain(outputs) {
            assert!(node.0 < self.nodes.len(), "Unknown node {node}");
        }

        let id = BlockId(self.blocks.len());
        for input in inputs {
            self.nodes[input.0].add_out_block(id);
        }
        for output in outputs {
            self.nodes[output.0].add_in_block(id);
        }

        let mut block = Block::new(name.into(), kind, inputs.to_vec(), outputs.to_vec());
        if let [output] = outputs {
            if let Some(shape) = self.nodes[output.0].shape() {
                block.set_output_shape(shape.to_vec());
            }
        }
        self.blocks.push(block);
        id
    }

    /// Applies a single-output block to `inputs`, returning its new output node.
    pub fn apply(&mut self, kind: BlockKind, inputs: &[NodeId]) -> NodeId {
        let output = self.add_node();
        self.add_block(kind, inputs, &[output]);
        output
    }

    /// Applies a block to `inputs`, creating one new node per output.
    pub fn apply_multi(&mut self, kind: BlockKind, inputs: &[NodeId]) -> Vec<NodeId> {
        let outputs: Vec<NodeId> = (0..kind.num_outputs()).map(|_| self.add_node()).collect();
        self.add_block(kind, inputs, &outputs);
        outputs
    }

    /// Dense block with searched units and activation.
    pub fn dense(&mut self, input: NodeId) -> NodeId {
        self.apply(BlockKind::dense(), &[input])
    }

    /// Dense block with fixed units and activation.
    pub fn dense_fixed(&mut self, units: usize, activation: Activation, input: NodeId) -> NodeId {
        self.apply(BlockKind::dense_fixed(units, activation), &[input])
    }

    pub fn identity(&mut self, input: NodeId) -> NodeId {
        self.apply(BlockKind::Identity, &[input])
    }

    pub fn add(&mut self, inputs: &[NodeId]) -> NodeId {
        self.apply(BlockKind::Add, inputs)
    }

    pub fn concat(&mut self, inputs: &[NodeId]) -> NodeId {
        self.apply(BlockKind::Concat, inputs)
    }

    pub fn fork(&mut self, input: NodeId, ways: usize) -> Vec<NodeId> {
        self.apply_multi(BlockKind::Fork { ways }, &[input])
    }

    pub fn classification_head(&mut self, input: NodeId) -> NodeId {
        self.apply(BlockKind::ClassificationHead, &[input])
    }

    pub fn regression_head(&mut self, input: NodeId) -> NodeId {
        self.apply(BlockKind::RegressionHead, &[input])
    }

    /// Sets the shape of a node, updating the output-shape cache of every
    /// single-output block producing it.
    pub fn set_shape(&mut self, node: NodeId, shape: Shape) -> Result<(), GraphError> {
        let entry = self
            .nodes
            .get_mut(node.0)
            .ok_or(GraphError::UnknownNode(node))?;
        entry.set_shape(shape.clone());

        let producers = entry.in_blocks().to_vec();
        for producer in producers {
            let block = &mut self.blocks[producer.0];
            if block.outputs() == [node] {
                block.set_output_shape(shape.clone());
            }
        }
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(id.0).ok_or(GraphError::UnknownNode(id))
    }

    pub fn block(&self, id: BlockId) -> Result<&Block, GraphError> {
        self.blocks.get(id.0).ok_or(GraphError::UnknownBlock(id))
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.blocks.iter().enumerate().map(|(i, b)| (BlockId(i), b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids_are_dense() {
        let mut topology = Topology::new();
        let a = topology.add_node();
        let b = topology.add_node();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
    }

    #[test]
    fn test_apply_links_edges() {
        let mut topology = Topology::new();
        let input = topology.add_node();
        let output = topology.dense(input);

        let block = topology.node(input).unwrap().out_blocks()[0];
        assert_eq!(topology.node(output).unwrap().in_blocks(), &[block]);
        assert_eq!(topology.block(block).unwrap().inputs(), &[input]);
        assert_eq!(topology.block(block).unwrap().outputs(), &[output]);
    }

    #[test]
    fn test_generated_names() {
        let mut topology = Topology::new();
        let input = topology.add_node();
        let hidden = topology.dense(input);
        topology.classification_head(hidden);

        let names: Vec<&str> = topology.blocks().map(|(_, b)| b.name()).collect();
        assert_eq!(names, vec!["dense_0", "classification_head_1"]);
    }

    #[test]
    fn test_fork_creates_outputs() {
        let mut topology = Topology::new();
        let input = topology.add_node();
        let outputs = topology.fork(input, 3);
        assert_eq!(outputs.len(), 3);
        assert_eq!(topology.num_nodes(), 4);
    }

    #[test]
    fn test_set_shape_updates_producer_cache() {
        let mut topology = Topology::new();
        let input = topology.add_node();
        let output = topology.classification_head(input);
        let head = topology.node(output).unwrap().in_blocks()[0];
        assert!(topology.block(head).unwrap().output_shape().is_none());

        topology.set_shape(output, vec![10]).unwrap();

        assert_eq!(topology.block(head).unwrap().output_shape(), Some(&[10][..]));
        assert_eq!(topology.node(output).unwrap().width(), Some(10));
    }

    #[test]
    fn test_block_on_shaped_output_caches_shape() {
        let mut topology = Topology::new();
        let input = topology.add_node();
        let output = topology.add_node_with_shape(vec![2, 3]);
        let head = topology.add_block(BlockKind::RegressionHead, &[input], &[output]);
        assert_eq!(topology.block(head).unwrap().output_shape(), Some(&[2, 3][..]));
    }

    #[test]
    fn test_unknown_block() {
        let topology = Topology::new();
        assert_eq!(
            topology.block(BlockId(0)).err(),
            Some(GraphError::UnknownBlock(BlockId(0)))
        );
    }

    #[test]
    fn test_set_shape_unknown_node() {
        let mut topology = Topology::new();
        let result = topology.set_shape(NodeId(4), vec![1]);
        assert_eq!(result, Err(GraphError::UnknownNode(NodeId(4))));
    }

    #[test]
    #[should_panic(expected = "Add requires at least 2 inputs")]
    fn test_add_requires_two_inputs() {
        let mut topology = Topology::new();
        let input = topology.add_node();
        topology.add(&[input]);
    }

    #[test]
    #[should_panic(expected = "Unknown node")]
    fn test_unknown_node_panics() {
        let mut topology = Topology::new();
        let input = topology.add_node();
        topology.add_block(BlockKind::Identity, &[input], &[NodeId(9)]);
    }
}
