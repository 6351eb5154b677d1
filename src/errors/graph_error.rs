//! Topology errors raised while resolving or wiring a block graph.

use thiserror::Error;

use crate::graph::{BlockId, NodeId};

/// Errors caused by a structurally invalid block graph.
///
/// All of these are fatal: they describe a malformed model definition and
/// are reported before any trial is trained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("The network has a cycle through {node}")]
    Cycle { node: NodeId },

    #[error("Inputs and outputs not connected: {node} is not on any input-to-output path")]
    Disconnected { node: NodeId },

    #[error("A required input is missing for block {block}")]
    MissingInput { block: String },

    #[error("No built value recorded for {node} while building block {block}")]
    BuildInvariant { block: String, node: NodeId },

    #[error("Output {node} must have exactly one producing block, found {count}")]
    OutputProducer { node: NodeId, count: usize },

    #[error("Graph declares no input nodes")]
    NoInputs,

    #[error("Graph declares no output nodes")]
    NoOutputs,

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Unknown block: {0}")]
    UnknownBlock(BlockId),

    #[error("Resolved graph covers {resolved} nodes but the topology has {topology}")]
    TopologyMismatch { resolved: usize, topology: usize },
}
