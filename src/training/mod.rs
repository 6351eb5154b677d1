//! Training utilities for built networks.
//!
//! This module provides:
//! - Loss functions (MSE, categorical cross entropy)
//! - Metrics (accuracy, MSE)
//! - Optimizer selection (Adam, AdaGrad, SGD)
//! - Training configuration and the mini-batch training loop

mod config;
mod loss;
mod metric;
mod optimizer;
mod trainer;

pub use config::TrainingConfig;
pub use loss::Loss;
pub use metric::Metric;
pub use optimizer::OptimizerKind;
pub use trainer::{Evaluation, History, TrainingResult, evaluate, predict, train};
