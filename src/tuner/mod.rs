//! Search orchestration.
//!
//! A [`Tuner`] repeatedly builds an [`AutoModel`] under hyperparameter
//! samples, trains each candidate and keeps the best one.

mod config;
mod random_search;

use burn::tensor::backend::AutodiffBackend;

use crate::auto_model::AutoModel;
use crate::data::Samples;
use crate::errors::ModelError;
use crate::hyperparameters::HyperParameters;
use crate::model::TrainableModel;

pub use config::SearchConfig;
pub use random_search::RandomSearch;

/// Score of one trained candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub hyperparameters: HyperParameters,
    pub val_loss: f32,
    pub val_metric: f32,
}

/// The best model of a search and every trial that led to it.
#[derive(Debug)]
pub struct SearchOutcome<B: AutodiffBackend> {
    pub best_model: TrainableModel<B>,
    pub best_hyperparameters: HyperParameters,
    pub trials: Vec<TrialRecord>,
}

/// Searches the hyperparameter space of an [`AutoModel`].
pub trait Tuner {
    fn search<B: AutodiffBackend>(
        &mut self,
        model: &AutoModel<B>,
        train: (&[Samples], &[Samples]),
        validation: (&[Samples], &[Samples]),
        device: &B::Device,
    ) -> Result<SearchOutcome<B>, ModelError>;
}
