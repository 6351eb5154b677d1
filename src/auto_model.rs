//! AutoModel - searches the architectures a declared block graph admits.
//!
//! # Example
//!
//! ```
//! use automodel::prelude::*;
//! use burn::backend::{Autodiff, NdArray};
//!
//! type Backend = Autodiff<NdArray>;
//!
//! let mut topology = Topology::new();
//! let input = topology.add_node();
//! let hidden = topology.dense(input);
//! let output = topology.regression_head(hidden);
//!
//! let config = SearchConfig::new()
//!     .max_trials(2)
//!     .training(TrainingConfig::new().epochs(2).verbose(false));
//! let mut model: AutoModel<Backend> =
//!     AutoModel::new(topology, &[input], &[output], config).unwrap();
//!
//! let x = vec![Samples::from_rows((0..8).map(|i| vec![i as f32, 1.0]).collect()).unwrap()];
//! let y = vec![Samples::from_scalars(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0])];
//!
//! let device = Default::default();
//! model.fit(&x, &y, None, &device).unwrap();
//! let predictions = model.predict(&x).unwrap();
//! assert_eq!(predictions[0].len(), 8);
//! ```

use burn::tensor::backend::AutodiffBackend;

use crate::data::{Samples, split_train_to_valid};
use crate::errors::{GraphError, ModelError};
use crate::graph::{NodeId, ResolvedGraph, Topology};
use crate::hyperparameters::HyperParameters;
use crate::model::{ModelBuilder, TrainableModel};
use crate::tuner::{RandomSearch, SearchConfig, SearchOutcome, Tuner};

/// A declared graph, its resolution and the best model found for it.
#[derive(Debug)]
pub struct AutoModel<B: AutodiffBackend> {
    topology: Topology,
    resolved: ResolvedGraph,
    config: SearchConfig,
    outcome: Option<SearchOutcome<B>>,
}

impl<B: AutodiffBackend> AutoModel<B> {
    /// Resolves the graph between `inputs` and `outputs` eagerly.
    pub fn new(
        topology: Topology,
        inputs: &[NodeId],
        outputs: &[NodeId],
        config: SearchConfig,
    ) -> Result<Self, GraphError> {
        let resolved = ResolvedGraph::resolve(&topology, inputs, outputs)?;
        Ok(Self {
            topology,
            resolved,
            config,
            outcome: None,
        })
    }

    /// Builds one candidate model under `hp`.
    pub fn build(
        &self,
        hp: &mut HyperParameters,
        device: &B::Device,
    ) -> Result<TrainableModel<B>, ModelError> {
        ModelBuilder::new(&self.topology, &self.config).build(&self.resolved, hp, device)
    }

    /// Sets the shapes of the declared inputs and outputs from data.
    pub fn set_shapes(&mut self, x: &[Samples], y: &[Samples]) -> Result<(), ModelError> {
        let inputs = self.resolved.inputs().to_vec();
        let outputs = self.resolved.outputs().to_vec();
        for (nodes, samples) in [(inputs, x), (outputs, y)] {
            if nodes.len() != samples.len() {
                return Err(ModelError::DataMismatch {
                    message: format!(
                        "graph declares {} node(s), got {} data sets",
                        nodes.len(),
                        samples.len()
                    ),
                });
            }
            for (node, s) in nodes.into_iter().zip(samples) {
                self.topology.set_shape(node, s.shape().to_vec())?;
            }
        }
        Ok(())
    }

    /// Searches with a [`RandomSearch`] seeded from the config.
    ///
    /// Without `validation`, the tail `validation_split` fraction of the
    /// data is held out.
    pub fn fit(
        &mut self,
        x: &[Samples],
        y: &[Samples],
        validation: Option<(&[Samples], &[Samples])>,
        device: &B::Device,
    ) -> Result<&SearchOutcome<B>, ModelError> {
        let mut tuner = RandomSearch::new(self.config.clone());
        self.fit_with_tuner(&mut tuner, x, y, validation, device)
    }

    /// Searches with the given tuner and keeps its best model.
    pub fn fit_with_tuner<T: Tuner>(
        &mut self,
        tuner: &mut T,
        x: &[Samples],
        y: &[Samples],
        validation: Option<(&[Samples], &[Samples])>,
        device: &B::Device,
    ) -> Result<&SearchOutcome<B>, ModelError> {
        self.set_shapes(x, y)?;

        let split;
        let (train, validation) = match validation {
            Some(validation) => ((x, y), validation),
            None => {
                split = split_train_to_valid(x, y, self.config.training.validation_split)?;
                let ((train_x, train_y), (valid_x, valid_y)) = &split;
                (
                    (train_x.as_slice(), train_y.as_slice()),
                    (valid_x.as_slice(), valid_y.as_slice()),
                )
            }
        };

        let outcome = tuner.search(self, train, validation, device)?;
        log::info!(
            "Search finished: best hyperparameters = {:?}",
            outcome.best_hyperparameters.values()
        );
        let outcome: &SearchOutcome<B> = self.outcome.insert(outcome);
        Ok(outcome)
    }

    /// Predicts with the best model found by [`AutoModel::fit`].
    pub fn predict(&self, x: &[Samples]) -> Result<Vec<Vec<Vec<f32>>>, ModelError> {
        self.best_model()?.predict(x)
    }

    pub fn best_model(&self) -> Result<&TrainableModel<B>, ModelError> {
        self.outcome
            .as_ref()
            .map(|outcome| &outcome.best_model)
            .ok_or(ModelError::NotFitted)
    }

    pub fn outcome(&self) -> Option<&SearchOutcome<B>> {
        self.outcome.as_ref()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn resolved(&self) -> &ResolvedGraph {
        &self.resolved
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{Metric, TrainingConfig};
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::backend::Backend;

    type TestBackend = Autodiff<NdArray>;

    fn quick_config(max_trials: usize) -> SearchConfig {
        SearchConfig::new()
            .max_trials(max_trials)
            .dropout_rate(0.0)
            .training(TrainingConfig::new().epochs(3).batch_size(8).verbose(false))
    }

    fn classifier(max_trials: usize) -> AutoModel<TestBackend> {
        let mut topology = Topology::new();
        let input = topology.add_node();
        let hidden = topology.dense(input);
        let output = topology.classification_head(hidden);
        AutoModel::new(topology, &[input], &[output], quick_config(max_trials)).unwrap()
    }

    fn blobs(n: usize) -> (Vec<Samples>, Vec<Samples>) {
        let rows = (0..n)
            .map(|i| {
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                vec![sign, sign * 0.5, (i % 3) as f32 * 0.1]
            })
            .collect();
        let labels = (0..n)
            .map(|i| if i % 2 == 0 { vec![1.0, 0.0] } else { vec![0.0, 1.0] })
            .collect();
        (
            vec![Samples::from_rows(rows).unwrap()],
            vec![Samples::from_rows(labels).unwrap()],
        )
    }

    #[test]
    fn test_new_rejects_cycle() {
        let mut topology = Topology::new();
        let input = topology.add_node();
        let output = topology.add_node();
        topology.add_block(crate::graph::BlockKind::Identity, &[input], &[output]);
        topology.add_block(crate::graph::BlockKind::Identity, &[output], &[input]);

        let result = AutoModel::<TestBackend>::new(topology, &[input], &[output], quick_config(1));
        assert!(matches!(result, Err(GraphError::Cycle { .. })));
    }

    #[test]
    fn test_predict_before_fit() {
        let model = classifier(1);
        let (x, _) = blobs(4);
        assert!(matches!(model.predict(&x), Err(ModelError::NotFitted)));
    }

    #[test]
    fn test_build_before_shapes_are_known() {
        let model = classifier(1);
        let device = <TestBackend as Backend>::Device::default();
        let result = model.build(&mut HyperParameters::new(), &device);
        assert!(matches!(result, Err(ModelError::UnknownShape { .. })));
    }

    #[test]
    fn test_set_shapes_counts_data_sets() {
        let mut model = classifier(1);
        let (x, y) = blobs(4);
        let result = model.set_shapes(&[x[0].clone(), x[0].clone()], &y);
        assert!(matches!(result, Err(ModelError::DataMismatch { .. })));
    }

    #[test]
    fn test_fit_and_predict() {
        let mut model = classifier(3);
        let (x, y) = blobs(20);
        let device = <TestBackend as Backend>::Device::default();

        let outcome = model.fit(&x, &y, None, &device).unwrap();
        assert_eq!(outcome.trials.len(), 3);
        assert_eq!(outcome.best_model.metric(), Metric::Accuracy);

        let output = model.resolved().outputs()[0];
        assert_eq!(model.topology().node(output).unwrap().shape(), Some(&[2][..]));

        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].len(), 20);
        assert_eq!(predictions[0][0].len(), 2);
    }

    #[test]
    fn test_fit_with_explicit_validation() {
        let mut model = classifier(1);
        let (x, y) = blobs(12);
        let (vx, vy) = blobs(4);
        let device = <TestBackend as Backend>::Device::default();

        let outcome = model.fit(&x, &y, Some((&vx, &vy)), &device).unwrap();
        assert_eq!(outcome.trials.len(), 1);
        assert!(outcome.trials[0].val_loss.is_finite());
    }
}
