//! Models built from resolved graphs.
//!
//! [`ModelBuilder`] walks the resolved block order once per hyperparameter
//! sample, building one [`BlockLayer`] per block and wiring them into a
//! [`Network`]. The result is wrapped in a [`TrainableModel`] together with
//! the optimizer, loss and metric inferred for it.

mod builder;
mod layer;
mod network;
mod trainable;

pub use builder::{BuiltNetwork, ModelBuilder, Port};
pub use layer::{BlockLayer, BuiltBlock, LayerKind};
pub use network::Network;
pub use trainable::{CompileSettings, TrainableModel};
