//! TrainableModel - a built network with its compile settings.

use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;

use super::builder::BuiltNetwork;
use super::network::Network;
use crate::data::{Samples, common_len, split_train_to_valid};
use crate::errors::ModelError;
use crate::training::{
    self, Evaluation, History, Loss, Metric, OptimizerKind, TrainingConfig,
};

/// Optimizer, loss and metric a model is trained and scored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileSettings {
    pub optimizer: OptimizerKind,
    pub loss: Loss,
    pub metric: Metric,
}

/// A trainable model built from one hyperparameter sample.
#[derive(Debug)]
pub struct TrainableModel<B: AutodiffBackend> {
    network: Network<B>,
    settings: CompileSettings,
    input_widths: Vec<usize>,
    output_widths: Vec<usize>,
    device: B::Device,
}

impl<B: AutodiffBackend> TrainableModel<B> {
    pub(crate) fn new(
        built: BuiltNetwork<B>,
        settings: CompileSettings,
        device: B::Device,
    ) -> Self {
        Self {
            network: built.network,
            settings,
            input_widths: built.input_widths,
            output_widths: built.output_widths,
            device,
        }
    }

    /// Trains on `x`/`y`, holding out the tail `config.validation_split`
    /// fraction for validation when it is positive.
    pub fn fit(
        &mut self,
        x: &[Samples],
        y: &[Samples],
        config: &TrainingConfig,
    ) -> Result<History, ModelError> {
        if config.validation_split > 0.0 {
            let ((train_x, train_y), (valid_x, valid_y)) =
                split_train_to_valid(x, y, config.validation_split)?;
            self.fit_with_validation(&train_x, &train_y, Some((&valid_x, &valid_y)), config)
        } else {
            self.fit_with_validation(x, y, None, config)
        }
    }

    /// Trains on `x`/`y`, scoring `validation` after every epoch.
    pub fn fit_with_validation(
        &mut self,
        x: &[Samples],
        y: &[Samples],
        validation: Option<(&[Samples], &[Samples])>,
        config: &TrainingConfig,
    ) -> Result<History, ModelError> {
        self.check_data(x, Some(y))?;
        if let Some((vx, vy)) = validation {
            self.check_data(vx, Some(vy))?;
        }

        let result = training::train(
            self.network.clone(),
            &self.settings,
            (x, y),
            validation,
            config,
            &self.device,
        )?;
        self.network = result.network;
        Ok(result.history)
    }

    /// Computes the loss and metric over `x`/`y`.
    pub fn evaluate(&self, x: &[Samples], y: &[Samples]) -> Result<Evaluation, ModelError> {
        self.check_data(x, Some(y))?;
        training::evaluate(&self.network.valid(), &self.settings, x, y, &self.device)
    }

    /// Returns predicted rows for each model output.
    pub fn predict(&self, x: &[Samples]) -> Result<Vec<Vec<Vec<f32>>>, ModelError> {
        self.check_data(x, None)?;
        training::predict(&self.network.valid(), x, &self.device)
    }

    pub fn optimizer(&self) -> OptimizerKind {
        self.settings.optimizer
    }

    pub fn loss(&self) -> Loss {
        self.settings.loss
    }

    pub fn metric(&self) -> Metric {
        self.settings.metric
    }

    pub fn settings(&self) -> &CompileSettings {
        &self.settings
    }

    pub fn network(&self) -> &Network<B> {
        &self.network
    }

    pub fn input_widths(&self) -> &[usize] {
        &self.input_widths
    }

    pub fn output_widths(&self) -> &[usize] {
        &self.output_widths
    }

    fn check_data(&self, x: &[Samples], y: Option<&[Samples]>) -> Result<(), ModelError> {
        check_widths("input", &self.input_widths, x)?;
        if let Some(y) = y {
            check_widths("output", &self.output_widths, y)?;
        }
        common_len(x, y.unwrap_or_default())?;
        Ok(())
    }
}

fn check_widths(kind: &str, expected: &[usize], samples: &[Samples]) -> Result<(), ModelError> {
    if samples.len() != expected.len() {
        return Err(ModelError::DataMismatch {
            message: format!(
                "model has {} {kind}(s), got {} data sets",
                expected.len(),
                samples.len()
            ),
        });
    }
    for (&width, s) in expected.iter().zip(samples) {
        if s.width() != width {
            return Err(ModelError::ShapeMismatch {
                expected: width,
                actual: s.width(),
            });
        }
    }
    Ok(())
}
