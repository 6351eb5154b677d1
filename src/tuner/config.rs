//! Search configuration.

use crate::training::TrainingConfig;

/// Configuration for an architecture search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of models built and trained.
    pub max_trials: usize,
    /// Seed for hyperparameter sampling.
    pub seed: u64,
    /// Dropout rate applied by dense blocks.
    pub dropout_rate: f64,
    /// How each trial is trained.
    pub training: TrainingConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_trials: 10,
            seed: 42,
            dropout_rate: 0.25,
            training: TrainingConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Creates a new SearchConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of trials.
    pub fn max_trials(mut self, max_trials: usize) -> Self {
        self.max_trials = max_trials;
        self
    }

    /// Sets the sampling seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the dense dropout rate.
    pub fn dropout_rate(mut self, rate: f64) -> Self {
        self.dropout_rate = rate;
        self
    }

    /// Sets the per-trial training configuration.
    pub fn training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }
}
