//! Model-related error types.

use thiserror::Error;

use super::GraphError;

/// Errors that can occur while building, training or querying a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid graph structure: {0}")]
    Graph(#[from] GraphError),

    #[error("Shape of {name} is unknown; fit the model or set the shape first")]
    UnknownShape { name: String },

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Invalid block configuration: {message}")]
    InvalidBlockConfig { message: String },

    #[error("Data does not match the model: {message}")]
    DataMismatch { message: String },

    #[error("Training error: {message}")]
    TrainingError { message: String },

    #[error("Model has not been fitted")]
    NotFitted,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
