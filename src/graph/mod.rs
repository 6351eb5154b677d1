//! Block graph declaration and resolution.
//!
//! A [`Topology`] owns the declared nodes and blocks. A [`ResolvedGraph`]
//! is its validated form: cycles rejected, nodes off every input-to-output
//! path pruned, retained nodes numbered and blocks put in topological order.
//!
//! # Example
//!
//! ```
//! use automodel::graph::{ResolvedGraph, Topology};
//!
//! let mut topology = Topology::new();
//! let input = topology.add_node();
//! let hidden = topology.dense(input);
//! let unused = topology.dense(hidden);
//! let output = topology.classification_head(hidden);
//!
//! let resolved = ResolvedGraph::resolve(&topology, &[input], &[output]).unwrap();
//! assert_eq!(resolved.block_order().len(), 2);
//! assert!(!resolved.contains(unused));
//! ```

mod block;
mod core;
mod node;
mod resolve;

pub use block::{Block, BlockId, BlockKind, BlockRole, DENSE_ACTIVATIONS, DENSE_UNITS};
pub use core::Topology;
pub use node::{Node, NodeId, Shape};
pub use resolve::{GraphResolver, ResolvedGraph};
