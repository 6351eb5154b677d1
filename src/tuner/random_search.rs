//! Random search over the discovered hyperparameter space.

use burn::tensor::backend::AutodiffBackend;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::{SearchConfig, SearchOutcome, TrialRecord, Tuner};
use crate::auto_model::AutoModel;
use crate::data::Samples;
use crate::errors::ModelError;
use crate::hyperparameters::HyperParameters;
use crate::model::TrainableModel;

/// Trial 0 builds with every default; later trials sample each choice
/// registered so far uniformly. The lowest validation loss wins.
#[derive(Debug)]
pub struct RandomSearch {
    config: SearchConfig,
    rng: StdRng,
}

impl RandomSearch {
    pub fn new(config: SearchConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

impl Tuner for RandomSearch {
    fn search<B: AutodiffBackend>(
        &mut self,
        model: &AutoModel<B>,
        (x, y): (&[Samples], &[Samples]),
        (valid_x, valid_y): (&[Samples], &[Samples]),
        device: &B::Device,
    ) -> Result<SearchOutcome<B>, ModelError> {
        let mut known = HyperParameters::new();
        let mut trials = Vec::with_capacity(self.config.max_trials);
        let mut best: Option<(TrainableModel<B>, HyperParameters, f32)> = None;

        for trial in 0..self.config.max_trials {
            let mut hp = if trial == 0 {
                HyperParameters::new()
            } else {
                HyperParameters::sample(known.space(), &mut self.rng)
            };

            let mut candidate = model.build(&mut hp, device)?;
            known.extend_space(hp.space());

            candidate.fit_with_validation(x, y, Some((valid_x, valid_y)), &self.config.training)?;
            let evaluation = candidate.evaluate(valid_x, valid_y)?;

            log::info!(
                "Trial {}/{}: val_loss = {:.6}, val_{} = {:.4}, hyperparameters = {:?}",
                trial + 1,
                self.config.max_trials,
                evaluation.loss,
                candidate.metric().name(),
                evaluation.metric,
                hp.values()
            );
            trials.push(TrialRecord {
                hyperparameters: hp.clone(),
                val_loss: evaluation.loss,
                val_metric: evaluation.metric,
            });

            let improved = best
                .as_ref()
                .is_none_or(|(_, _, score)| score.is_nan() || evaluation.loss < *score);
            if improved {
                best = Some((candidate, hp, evaluation.loss));
            }
        }

        let (best_model, best_hyperparameters, _) = best.ok_or_else(|| ModelError::TrainingError {
            message: "search ran no trials".to_string(),
        })?;
        Ok(SearchOutcome {
            best_model,
            best_hyperparameters,
            trials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Topology;
    use crate::training::TrainingConfig;
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::backend::Backend;

    type TestBackend = Autodiff<NdArray>;

    fn regression_model(
        config: SearchConfig,
    ) -> (AutoModel<TestBackend>, Vec<Samples>, Vec<Samples>) {
        let mut topology = Topology::new();
        let input = topology.add_node();
        let hidden = topology.dense(input);
        let output = topology.regression_head(hidden);
        let mut model = AutoModel::new(topology, &[input], &[output], config).unwrap();

        let x = vec![Samples::from_rows((0..12).map(|i| vec![i as f32 / 12.0]).collect()).unwrap()];
        let labels: Vec<f32> = (0..12).map(|i| 2.0 * i as f32 / 12.0).collect();
        let y = vec![Samples::from_scalars(&labels)];
        model.set_shapes(&x, &y).unwrap();
        (model, x, y)
    }

    fn config(max_trials: usize, seed: u64) -> SearchConfig {
        SearchConfig::new()
            .max_trials(max_trials)
            .seed(seed)
            .dropout_rate(0.0)
            .training(TrainingConfig::new().epochs(2).verbose(false))
    }

    #[test]
    fn test_first_trial_uses_defaults() {
        let (model, x, y) = regression_model(config(1, 0));
        let device = <TestBackend as Backend>::Device::default();

        let outcome = RandomSearch::new(config(1, 0))
            .search(&model, (&x, &y), (&x, &y), &device)
            .unwrap();

        let hp = &outcome.trials[0].hyperparameters;
        assert_eq!(hp.get_int("dense_0/units"), Some(16));
        assert_eq!(hp.get_str("dense_0/activation"), Some("relu"));
        assert_eq!(hp.get_str("optimizer"), Some("adam"));
    }

    #[test]
    fn test_later_trials_sample_known_space() {
        let (model, x, y) = regression_model(config(4, 3));
        let device = <TestBackend as Backend>::Device::default();

        let outcome = RandomSearch::new(config(4, 3))
            .search(&model, (&x, &y), (&x, &y), &device)
            .unwrap();

        assert_eq!(outcome.trials.len(), 4);
        for trial in &outcome.trials {
            let units = trial.hyperparameters.get_int("dense_0/units").unwrap();
            assert!([16, 32, 64, 128].contains(&units));
            assert_eq!(trial.hyperparameters.space().len(), 3);
        }

        let best = outcome
            .trials
            .iter()
            .map(|t| t.val_loss)
            .fold(f32::INFINITY, f32::min);
        let chosen = outcome.best_model.evaluate(&x, &y).unwrap();
        assert!((chosen.loss - best).abs() < 1e-6);
    }

    #[test]
    fn test_zero_trials_is_an_error() {
        let (model, x, y) = regression_model(config(0, 0));
        let device = <TestBackend as Backend>::Device::default();

        let result = RandomSearch::new(config(0, 0)).search(&model, (&x, &y), (&x, &y), &device);
        assert!(matches!(result, Err(ModelError::TrainingError { .. })));
    }
}
