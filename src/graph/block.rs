//! Blocks - the composable computation units of the graph.
//!
//! Uses a simple enum instead of trait objects for clarity. The variant
//! decides the block's arity, its role for metric/loss inference and the
//! layer it builds under a hyperparameter sample.

use std::fmt;

use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};

use super::node::{NodeId, Shape};
use crate::errors::ModelError;
use crate::hyperparameters::HyperParameters;
use crate::layers::{Activation, DenseConfig};
use crate::model::{BuiltBlock, LayerKind, Port};

/// Candidate widths for a dense block whose units are searched.
pub const DENSE_UNITS: [i64; 4] = [16, 32, 64, 128];

/// Candidate activations for a dense block whose activation is searched.
pub const DENSE_ACTIVATIONS: [&str; 3] = ["relu", "tanh", "sigmoid"];

/// Stable arena index of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    /// Returns the arena index of this block.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block#{}", self.0)
    }
}

/// What a block contributes to metric and loss inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    Classification,
    Regression,
    Other,
}

/// The computation a block performs.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    /// Passes its single input through unchanged.
    Identity,
    /// Fully connected layer. `None` fields are searched.
    Dense {
        units: Option<usize>,
        activation: Option<Activation>,
    },
    /// Element-wise sum of two or more equally sized inputs.
    Add,
    /// Concatenation along the feature dimension.
    Concat,
    /// Replicates its single input onto `ways` outputs.
    Fork { ways: usize },
    /// Softmax projection onto the shape of the block's output.
    ClassificationHead,
    /// Linear projection onto the shape of the block's output.
    RegressionHead,
}

impl BlockKind {
    /// Dense block with searched units and activation.
    pub fn dense() -> Self {
        Self::Dense {
            units: None,
            activation: None,
        }
    }

    /// Dense block with fixed units and activation.
    pub fn dense_fixed(units: usize, activation: Activation) -> Self {
        Self::Dense {
            units: Some(units),
            activation: Some(activation),
        }
    }

    /// Returns the role tag used when inferring metrics and losses.
    pub fn role(&self) -> BlockRole {
        match self {
            Self::ClassificationHead => BlockRole::Classification,
            Self::RegressionHead => BlockRole::Regression,
            _ => BlockRole::Other,
        }
    }

    /// Prefix used when a block is given a generated name.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Dense { .. } => "dense",
            Self::Add => "add",
            Self::Concat => "concat",
            Self::Fork { .. } => "fork",
            Self::ClassificationHead => "classification_head",
            Self::RegressionHead => "regression_head",
        }
    }

    /// Number of outputs this kind produces.
    pub fn num_outputs(&self) -> usize {
        match self {
            Self::Fork { ways } => *ways,
            _ => 1,
        }
    }

    /// Panics if the given arity is not valid for this kind.
    pub(crate) fn check_arity(&self, num_inputs: usize, num_outputs: usize) {
        match self {
            Self::Add => assert!(num_inputs >= 2, "Add requires at least 2 inputs"),
            Self::Concat => assert!(num_inputs >= 1, "Concat requires at least 1 input"),
            _ => assert_eq!(
                num_inputs,
                1,
                "{} requires exactly 1 input",
                self.prefix()
            ),
        }
        if let Self::Fork { ways } = self {
            assert!(*ways >= 1, "Fork requires at least 1 way");
        }
        assert_eq!(
            num_outputs,
            self.num_outputs(),
            "{} produces {} output(s)",
            self.prefix(),
            self.num_outputs()
        );
    }
}

/// A block of the graph with its wiring.
#[derive(Debug, Clone)]
pub struct Block {
    name: String,
    kind: BlockKind,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    output_shape: Option<Shape>,
}

impl Block {
    pub(crate) fn new(
        name: String,
        kind: BlockKind,
        inputs: Vec<NodeId>,
        outputs: Vec<NodeId>,
    ) -> Self {
        Self {
            name,
            kind,
            inputs,
            outputs,
            output_shape: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    pub fn role(&self) -> BlockRole {
        self.kind.role()
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    /// Cached shape of the block's output, set once the output's shape is known.
    pub fn output_shape(&self) -> Option<&[usize]> {
        self.output_shape.as_deref()
    }

    pub(crate) fn set_output_shape(&mut self, shape: Shape) {
        self.output_shape = Some(shape);
    }

    /// Builds the layer for this block under the given hyperparameters.
    ///
    /// With `sub_model` set, searched hyperparameters are scoped by the
    /// block name so several blocks can share one sample.
    pub fn build<B: Backend>(
        &self,
        hp: &mut HyperParameters,
        inputs: &[Port],
        sub_model: bool,
        dropout_rate: f64,
        device: &B::Device,
    ) -> Result<BuiltBlock<B>, ModelError> {
        let widths: Vec<usize> = inputs.iter().map(|port| port.width).collect();
        let Some(&first) = widths.first() else {
            return Err(ModelError::InvalidBlockConfig {
                message: format!("block {} was built without inputs", self.name),
            });
        };

        match &self.kind {
            BlockKind::Identity => Ok(BuiltBlock::passthrough(LayerKind::Identity, vec![first])),
            BlockKind::Dense { units, activation } => {
                let units = match units {
                    Some(units) => *units,
                    None => hp.choice_int(&self.scoped("units", sub_model), &DENSE_UNITS) as usize,
                };
                let activation = match activation {
                    Some(activation) => *activation,
                    None => {
                        let param = self.scoped("activation", sub_model);
                        let name = hp.choice_str(&param, &DENSE_ACTIVATIONS);
                        Activation::from_name(&name).ok_or_else(|| {
                            ModelError::InvalidBlockConfig {
                                message: format!("unknown activation {name}"),
                            }
                        })?
                    }
                };
                let dense = DenseConfig::new(first, units)
                    .with_activation(activation)
                    .with_dropout(dropout_rate)
                    .init(device);
                Ok(BuiltBlock::dense(dense))
            }
            BlockKind::Add => {
                if let Some(&actual) = widths.iter().find(|&&w| w != first) {
                    return Err(ModelError::ShapeMismatch {
                        expected: first,
                        actual,
                    });
                }
                Ok(BuiltBlock::passthrough(LayerKind::Add, vec![first]))
            }
            BlockKind::Concat => Ok(BuiltBlock::passthrough(
                LayerKind::Concat,
                vec![widths.iter().sum()],
            )),
            BlockKind::Fork { ways } => {
                Ok(BuiltBlock::passthrough(LayerKind::Fork, vec![first; *ways]))
            }
            BlockKind::ClassificationHead => self.build_head(first, true, device),
            BlockKind::RegressionHead => self.build_head(first, false, device),
        }
    }

    fn build_head<B: Backend>(
        &self,
        input_width: usize,
        classification: bool,
        device: &B::Device,
    ) -> Result<BuiltBlock<B>, ModelError> {
        let width: usize = self
            .output_shape
            .as_ref()
            .map(|shape| shape.iter().product())
            .ok_or_else(|| ModelError::UnknownShape {
                name: self.name.clone(),
            })?;
        // A single class column is a binary probability.
        let activation = match (classification, width) {
            (false, _) => Activation::None,
            (true, 1) => Activation::Sigmoid,
            (true, _) => Activation::Softmax,
        };
        let dense = DenseConfig::new(input_width, width)
            .with_activation(activation)
            .init(device);
        Ok(BuiltBlock::dense(dense))
    }

    fn scoped(&self, param: &str, sub_model: bool) -> String {
        if sub_model {
            format!("{}/{}", self.name, param)
        } else {
            param.to_string()
        }
    }
}
