//! Training loop implementation.

use burn::{
    module::AutodiffModule,
    optim::{AdaGradConfig, AdamConfig, GradientsParams, Optimizer, SgdConfig},
    tensor::{
        ElementConversion, Tensor,
        backend::{AutodiffBackend, Backend},
    },
};

use super::{Loss, TrainingConfig};
use crate::data::{Samples, common_len};
use crate::errors::ModelError;
use crate::model::{CompileSettings, Network};
use crate::training::OptimizerKind;

/// Per-epoch losses and validation scores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    /// Mean training loss per epoch.
    pub loss: Vec<f32>,
    /// Validation loss per epoch, empty without validation data.
    pub val_loss: Vec<f32>,
    /// Validation metric per epoch, empty without validation data.
    pub val_metric: Vec<f32>,
}

/// Loss and metric of a network over a data set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f32,
    pub metric: f32,
}

/// Training result containing the trained network and its history.
#[derive(Debug)]
pub struct TrainingResult<B: AutodiffBackend> {
    pub network: Network<B>,
    pub history: History,
}

/// Trains a network with the optimizer and loss named in `settings`.
pub fn train<B: AutodiffBackend>(
    network: Network<B>,
    settings: &CompileSettings,
    data: (&[Samples], &[Samples]),
    validation: Option<(&[Samples], &[Samples])>,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<TrainingResult<B>, ModelError> {
    match settings.optimizer {
        OptimizerKind::Adam => {
            let optimizer = AdamConfig::new().init::<B, Network<B>>();
            run(network, optimizer, settings, data, validation, config, device)
        }
        OptimizerKind::AdaGrad => {
            let optimizer = AdaGradConfig::new().init::<B, Network<B>>();
            run(network, optimizer, settings, data, validation, config, device)
        }
        OptimizerKind::Sgd => {
            let optimizer = SgdConfig::new().init::<B, Network<B>>();
            run(network, optimizer, settings, data, validation, config, device)
        }
    }
}

fn run<B, O>(
    mut network: Network<B>,
    mut optimizer: O,
    settings: &CompileSettings,
    (x, y): (&[Samples], &[Samples]),
    validation: Option<(&[Samples], &[Samples])>,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<TrainingResult<B>, ModelError>
where
    B: AutodiffBackend,
    O: Optimizer<Network<B>, B>,
{
    let num_samples = common_len(x, y)?;
    if num_samples == 0 {
        return Err(ModelError::TrainingError {
            message: "no training samples".to_string(),
        });
    }

    // Convert data to tensors
    let inputs: Vec<Tensor<B, 2>> = x.iter().map(|s| s.to_tensor::<B>(device)).collect();
    let targets: Vec<Tensor<B, 2>> = y.iter().map(|s| s.to_tensor::<B>(device)).collect();
    let batch_size = config.batch_size.clamp(1, num_samples);

    let mut history = History::default();
    for epoch in 0..config.epochs {
        let mut epoch_loss = 0.0;
        let mut num_batches = 0;

        for start in (0..num_samples).step_by(batch_size) {
            let end = (start + batch_size).min(num_samples);
            let batch_x = inputs.iter().map(|t| t.clone().slice([start..end])).collect();
            let batch_y = targets.iter().map(|t| t.clone().slice([start..end])).collect();

            let predictions = network.forward(batch_x);
            let loss = total_loss(settings.loss, predictions, batch_y)?;
            let loss_value: f32 = loss.clone().into_scalar().elem();
            epoch_loss += loss_value;
            num_batches += 1;

            let grads = loss.backward();
            let grads_params = GradientsParams::from_grads(grads, &network);
            network = optimizer.step(config.learning_rate, network, grads_params);
        }

        let mean_loss = epoch_loss / num_batches as f32;
        history.loss.push(mean_loss);

        if let Some((vx, vy)) = validation {
            let evaluation = evaluate(&network.valid(), settings, vx, vy, device)?;
            history.val_loss.push(evaluation.loss);
            history.val_metric.push(evaluation.metric);
        }

        if config.verbose && (epoch % 10 == 0 || epoch + 1 == config.epochs) {
            match (history.val_loss.last(), history.val_metric.last()) {
                (Some(val_loss), Some(val_metric)) => log::info!(
                    "Epoch {}/{}: loss = {:.6}, val_loss = {:.6}, val_{} = {:.4}",
                    epoch + 1,
                    config.epochs,
                    mean_loss,
                    val_loss,
                    settings.metric.name(),
                    val_metric
                ),
                _ => log::info!(
                    "Epoch {}/{}: loss = {:.6}",
                    epoch + 1,
                    config.epochs,
                    mean_loss
                ),
            }
        }
    }

    Ok(TrainingResult { network, history })
}

/// Sum of the per-output losses.
fn total_loss<B: Backend>(
    loss: Loss,
    predictions: Vec<Tensor<B, 2>>,
    targets: Vec<Tensor<B, 2>>,
) -> Result<Tensor<B, 1>, ModelError> {
    predictions
        .into_iter()
        .zip(targets)
        .map(|(p, t)| loss.compute(p, t))
        .reduce(|acc, l| acc + l)
        .ok_or_else(|| ModelError::TrainingError {
            message: "model has no outputs".to_string(),
        })
}

/// Evaluates a network without tracking gradients.
///
/// The loss is summed over outputs, the metric averaged.
pub fn evaluate<B: Backend>(
    network: &Network<B>,
    settings: &CompileSettings,
    x: &[Samples],
    y: &[Samples],
    device: &B::Device,
) -> Result<Evaluation, ModelError> {
    let inputs = x.iter().map(|s| s.to_tensor::<B>(device)).collect();
    let predictions = network.forward(inputs);
    let targets: Vec<Tensor<B, 2>> = y.iter().map(|s| s.to_tensor::<B>(device)).collect();

    let mut metric = 0.0;
    for (prediction, target) in predictions.iter().zip(y) {
        let rows = to_rows(prediction.clone())?;
        metric += settings.metric.compute(&rows, target.rows());
    }
    metric /= predictions.len().max(1) as f32;

    let loss: f32 = total_loss(settings.loss, predictions, targets)?
        .into_scalar()
        .elem();
    Ok(Evaluation { loss, metric })
}

/// Runs a forward pass and returns host rows per output.
pub fn predict<B: Backend>(
    network: &Network<B>,
    x: &[Samples],
    device: &B::Device,
) -> Result<Vec<Vec<Vec<f32>>>, ModelError> {
    let inputs = x.iter().map(|s| s.to_tensor::<B>(device)).collect();
    network.forward(inputs).into_iter().map(to_rows).collect()
}

fn to_rows<B: Backend>(tensor: Tensor<B, 2>) -> Result<Vec<Vec<f32>>, ModelError> {
    let [_, width] = tensor.dims();
    let data: Vec<f32> = tensor
        .into_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|e| ModelError::TrainingError {
            message: format!("Failed to read tensor data: {:?}", e),
        })?;
    Ok(data.chunks(width.max(1)).map(<[f32]>::to_vec).collect())
}
