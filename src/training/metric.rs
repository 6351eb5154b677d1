//! Evaluation metrics, computed on host rows.

/// Supported metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Fraction of rows whose predicted class matches the target class.
    Accuracy,
    /// Mean squared error over every feature.
    Mse,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Mse => "mean_squared_error",
        }
    }

    pub fn higher_is_better(&self) -> bool {
        matches!(self, Metric::Accuracy)
    }

    /// Computes the metric over paired rows.
    pub fn compute(&self, predictions: &[Vec<f32>], targets: &[Vec<f32>]) -> f32 {
        if predictions.is_empty() {
            return 0.0;
        }
        match self {
            Metric::Accuracy => {
                let correct = predictions
                    .iter()
                    .zip(targets)
                    .filter(|(p, t)| class_of(p) == class_of(t))
                    .count();
                correct as f32 / predictions.len() as f32
            }
            Metric::Mse => {
                let (sum, count) = predictions
                    .iter()
                    .zip(targets)
                    .flat_map(|(p, t)| p.iter().zip(t))
                    .fold((0.0, 0usize), |(sum, count), (p, t)| {
                        (sum + (p - t) * (p - t), count + 1)
                    });
                if count == 0 { 0.0 } else { sum / count as f32 }
            }
        }
    }
}

/// Argmax for one-hot rows, threshold at 0.5 for single-column rows.
fn class_of(row: &[f32]) -> usize {
    match row {
        [value] => usize::from(*value >= 0.5),
        _ => row
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, &v)| {
                if v > best.1 { (i, v) } else { best }
            })
            .0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_one_hot() {
        let predictions = vec![vec![0.7, 0.2, 0.1], vec![0.1, 0.3, 0.6]];
        let targets = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        assert!((Metric::Accuracy.compute(&predictions, &targets) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_accuracy_single_column() {
        let predictions = vec![vec![0.9], vec![0.2], vec![0.4]];
        let targets = vec![vec![1.0], vec![0.0], vec![1.0]];
        let accuracy = Metric::Accuracy.compute(&predictions, &targets);
        assert!((accuracy - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_mse_metric() {
        let predictions = vec![vec![1.0, 2.0]];
        let targets = vec![vec![0.0, 2.0]];
        assert!((Metric::Mse.compute(&predictions, &targets) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty_rows() {
        assert_eq!(Metric::Mse.compute(&[], &[]), 0.0);
        assert!(Metric::Accuracy.higher_is_better());
        assert!(!Metric::Mse.higher_is_better());
    }
}
