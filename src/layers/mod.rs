//! Layer implementations used by the blocks of a graph.

pub mod activation;
pub mod dense;

pub use activation::Activation;
pub use dense::{Dense, DenseConfig};
