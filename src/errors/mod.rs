//! Error types for graph resolution and model building.

mod graph_error;
mod model_error;

pub use graph_error::GraphError;
pub use model_error::ModelError;
