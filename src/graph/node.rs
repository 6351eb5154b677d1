//! Node - placeholder for a value flowing between blocks.
//!
//! Nodes live in a [`Topology`](super::Topology) arena and are referred to
//! by [`NodeId`]. Two nodes are distinct even when their shapes match.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::block::BlockId;

/// Per-sample tensor dimensions (the batch dimension is not included).
pub type Shape = Vec<usize>;

/// Stable arena index of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the arena index of this node.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A node of the block graph.
///
/// It tracks:
/// - The per-sample shape, once it is known
/// - The blocks producing this node
/// - The blocks consuming this node
#[derive(Clone, Debug, Default)]
pub struct Node {
    shape: Option<Shape>,
    in_blocks: Vec<BlockId>,
    out_blocks: Vec<BlockId>,
}

impl Node {
    pub(crate) fn new(shape: Option<Shape>) -> Self {
        Self {
            shape,
            in_blocks: Vec::new(),
            out_blocks: Vec::new(),
        }
    }

    /// Returns the shape, if it has been set.
    pub fn shape(&self) -> Option<&[usize]> {
        self.shape.as_deref()
    }

    /// Returns the flattened feature width, if the shape is known.
    pub fn width(&self) -> Option<usize> {
        self.shape.as_ref().map(|s| s.iter().product())
    }

    /// Returns the blocks that produce this node.
    pub fn in_blocks(&self) -> &[BlockId] {
        &self.in_blocks
    }

    /// Returns the blocks that consume this node.
    pub fn out_blocks(&self) -> &[BlockId] {
        &self.out_blocks
    }

    pub(crate) fn set_shape(&mut self, shape: Shape) {
        self.shape = Some(shape);
    }

    pub(crate) fn add_in_block(&mut self, block: BlockId) {
        if !self.in_blocks.contains(&block) {
            self.in_blocks.push(block);
        }
    }

    pub(crate) fn add_out_block(&mut self, block: BlockId) {
        if !self.out_blocks.contains(&block) {
            self.out_blocks.push(block);
        }
    }
}
