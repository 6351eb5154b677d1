//! Loss functions for training.

use burn::tensor::{Tensor, backend::Backend};

/// Supported loss functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loss {
    /// Mean Squared Error loss.
    Mse,
    /// Binary Cross Entropy loss.
    BinaryCrossEntropy,
    /// Cross entropy over softmax probabilities and one-hot targets.
    ///
    /// Single-column outputs are sigmoid probabilities and are scored as
    /// binary cross entropy.
    CategoricalCrossEntropy,
}

impl Loss {
    pub fn name(&self) -> &'static str {
        match self {
            Loss::Mse => "mean_squared_error",
            Loss::BinaryCrossEntropy => "binary_crossentropy",
            Loss::CategoricalCrossEntropy => "categorical_crossentropy",
        }
    }

    /// Computes the loss between predictions and targets.
    pub fn compute<B: Backend>(
        &self,
        predictions: Tensor<B, 2>,
        targets: Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        match self {
            Loss::Mse => {
                let diff = predictions - targets;
                let squared = diff.clone() * diff;
                squared.mean()
            }
            Loss::BinaryCrossEntropy => {
                // BCE = -mean(y * log(p) + (1-y) * log(1-p))
                let epsilon = 1e-7;
                let ones = Tensor::ones_like(&predictions);
                let p_clipped = predictions.clamp(epsilon, 1.0 - epsilon);
                let log_p = p_clipped.clone().log();
                let log_1_minus_p = (ones.clone() - p_clipped).log();
                let bce = targets.clone() * log_p + (ones - targets) * log_1_minus_p;
                bce.neg().mean()
            }
            Loss::CategoricalCrossEntropy if predictions.dims()[1] == 1 => {
                Loss::BinaryCrossEntropy.compute(predictions, targets)
            }
            Loss::CategoricalCrossEntropy => {
                // CCE = -mean_over_rows(sum(y * log(p)))
                let epsilon = 1e-7;
                let log_p = predictions.clamp(epsilon, 1.0 - epsilon).log();
                (targets * log_p).sum_dim(1).neg().mean()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_mse_loss_zero() {
        let device = <TestBackend as Backend>::Device::default();
        let predictions = Tensor::<TestBackend, 2>::from_floats([[1.0, 2.0], [3.0, 4.0]], &device);
        let targets = predictions.clone();

        let loss = Loss::Mse.compute(predictions, targets);
        let loss_value: f32 = loss.into_scalar();

        assert!(
            loss_value.abs() < 1e-6,
            "MSE of identical tensors should be 0"
        );
    }

    #[test]
    fn test_mse_loss_nonzero() {
        let device = <TestBackend as Backend>::Device::default();
        let predictions = Tensor::<TestBackend, 2>::from_floats([[1.0], [2.0]], &device);
        let targets = Tensor::<TestBackend, 2>::from_floats([[2.0], [2.0]], &device);

        let loss = Loss::Mse.compute(predictions, targets);
        let loss_value: f32 = loss.into_scalar();

        // MSE = mean((1-2)^2 + (2-2)^2) = 0.5
        assert!((loss_value - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_cce_loss_confident_prediction() {
        let device = <TestBackend as Backend>::Device::default();
        let predictions = Tensor::<TestBackend, 2>::from_floats(
            [[0.98, 0.01, 0.01], [0.01, 0.98, 0.01]],
            &device,
        );
        let targets =
            Tensor::<TestBackend, 2>::from_floats([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &device);

        let loss_value: f32 = Loss::CategoricalCrossEntropy
            .compute(predictions, targets)
            .into_scalar();

        assert!(loss_value < 0.1);
    }

    #[test]
    fn test_cce_loss_uniform_prediction() {
        let device = <TestBackend as Backend>::Device::default();
        let predictions = Tensor::<TestBackend, 2>::from_floats([[0.5, 0.5]], &device);
        let targets = Tensor::<TestBackend, 2>::from_floats([[0.0, 1.0]], &device);

        let loss_value: f32 = Loss::CategoricalCrossEntropy
            .compute(predictions, targets)
            .into_scalar();

        // -ln(0.5)
        assert!((loss_value - std::f32::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_bce_loss_perfect_prediction() {
        let device = <TestBackend as Backend>::Device::default();
        let predictions = Tensor::<TestBackend, 2>::from_floats([[0.99], [0.01]], &device);
        let targets = Tensor::<TestBackend, 2>::from_floats([[1.0], [0.0]], &device);

        let loss_value: f32 = Loss::BinaryCrossEntropy
            .compute(predictions, targets)
            .into_scalar();

        assert!(loss_value < 0.1);
    }

    #[test]
    fn test_cce_single_column_penalizes_constant_prediction() {
        // A constant 1.0 prediction must not score well against 0 labels.
        let device = <TestBackend as Backend>::Device::default();
        let predictions = Tensor::<TestBackend, 2>::from_floats([[1.0], [1.0]], &device);
        let targets = Tensor::<TestBackend, 2>::from_floats([[1.0], [0.0]], &device);

        let loss_value: f32 = Loss::CategoricalCrossEntropy
            .compute(predictions, targets)
            .into_scalar();

        assert!(loss_value > 1.0, "loss {loss_value}");
    }
}
