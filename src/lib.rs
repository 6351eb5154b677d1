//! # automodel
//!
//! Architecture search over declared block graphs, built on Burn.
//!
//! Users declare input and output nodes and wire blocks between them in a
//! [`Topology`](graph::Topology). The graph is validated once: cycles are
//! rejected, nodes off every input-to-output path are pruned, and blocks are
//! put in a topological order. Every trial then builds a trainable network
//! from that order under a fresh hyperparameter sample.
//!
//! ## Features
//!
//! - **Graph resolution**: iterative cycle detection, reachability pruning and
//!   deterministic node ids, so repeated builds line up.
//! - **Searchable blocks**: dense blocks register their width and activation
//!   as hyperparameters the first time they are built.
//! - **Burn Backend**: Uses the Burn framework with WGPU backend for GPU
//!   acceleration, or NdArray on the CPU.
//!
//! ## Example
//!
//! ```
//! use automodel::prelude::*;
//! use burn::backend::{Autodiff, NdArray};
//!
//! type Backend = Autodiff<NdArray>;
//!
//! let device = <Backend as burn::tensor::backend::Backend>::Device::default();
//!
//! let mut topology = Topology::new();
//! let input = topology.add_node_with_shape(vec![4]);
//! let hidden = topology.dense(input);
//! let output = topology.classification_head(hidden);
//! topology.set_shape(output, vec![3]).unwrap();
//!
//! let resolved = ResolvedGraph::resolve(&topology, &[input], &[output]).unwrap();
//! let config = SearchConfig::default();
//! let mut hp = HyperParameters::new();
//! let model: TrainableModel<Backend> = ModelBuilder::new(&topology, &config)
//!     .build(&resolved, &mut hp, &device)
//!     .expect("Failed to build model");
//!
//! assert_eq!(model.metric(), Metric::Accuracy);
//! assert_eq!(hp.get_int("dense_0/units"), Some(16));
//! ```

pub mod auto_model;
pub mod data;
pub mod errors;
pub mod graph;
pub mod hyperparameters;
pub mod layers;
pub mod model;
pub mod training;
pub mod tuner;

// Re-exports for convenience
pub use auto_model::AutoModel;
pub use errors::{GraphError, ModelError};
pub use layers::activation::Activation;
pub use model::TrainableModel;
pub use training::{Loss, Metric, TrainingConfig};

/// Backend type alias for WGPU with autodiff support.
pub type Backend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Backend type for inference (no autodiff).
pub type InferenceBackend = burn::backend::Wgpu;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::auto_model::AutoModel;
    pub use crate::data::Samples;
    pub use crate::errors::{GraphError, ModelError};
    pub use crate::graph::{BlockKind, NodeId, ResolvedGraph, Topology};
    pub use crate::hyperparameters::HyperParameters;
    pub use crate::layers::activation::Activation;
    pub use crate::model::{ModelBuilder, TrainableModel};
    pub use crate::training::{Loss, Metric, OptimizerKind, TrainingConfig};
    pub use crate::tuner::{RandomSearch, SearchConfig, Tuner};
    pub use crate::{Backend, InferenceBackend};
}
