//! Built block layers.

use burn::{
    module::Module,
    tensor::{Tensor, backend::Backend},
};

use crate::layers::Dense;

/// Computation performed by a built block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Identity,
    Dense,
    Add,
    Concat,
    Fork,
}

impl LayerKind {
    /// Converts the kind to a numeric ID for storage in Module.
    pub fn to_id(&self) -> u8 {
        match self {
            LayerKind::Identity => 0,
            LayerKind::Dense => 1,
            LayerKind::Add => 2,
            LayerKind::Concat => 3,
            LayerKind::Fork => 4,
        }
    }

    /// Creates a LayerKind from a numeric ID.
    pub fn from_id(id: u8) -> Self {
        match id {
            1 => LayerKind::Dense,
            2 => LayerKind::Add,
            3 => LayerKind::Concat,
            4 => LayerKind::Fork,
            _ => LayerKind::Identity,
        }
    }
}

/// The result of building one block: its layer and the widths it produces.
#[derive(Debug)]
pub struct BuiltBlock<B: Backend> {
    kind: LayerKind,
    dense: Option<Dense<B>>,
    output_widths: Vec<usize>,
}

impl<B: Backend> BuiltBlock<B> {
    /// A parameter-free layer.
    pub fn passthrough(kind: LayerKind, output_widths: Vec<usize>) -> Self {
        Self {
            kind,
            dense: None,
            output_widths,
        }
    }

    /// A dense layer producing a single output.
    pub fn dense(dense: Dense<B>) -> Self {
        let output_widths = vec![dense.output_size()];
        Self {
            kind: LayerKind::Dense,
            dense: Some(dense),
            output_widths,
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn output_widths(&self) -> &[usize] {
        &self.output_widths
    }

    /// The dense layer, for kinds that carry parameters.
    pub fn dense_layer(&self) -> Option<&Dense<B>> {
        self.dense.as_ref()
    }

    /// Wires the layer between network slots.
    pub(crate) fn into_layer(self, inputs: Vec<usize>, outputs: Vec<usize>) -> BlockLayer<B> {
        BlockLayer {
            dense: self.dense,
            kind_id: self.kind.to_id(),
            inputs,
            outputs,
        }
    }
}

/// A block layer placed in a network, reading and writing value slots.
#[derive(Module, Debug)]
pub struct BlockLayer<B: Backend> {
    dense: Option<Dense<B>>,
    kind_id: u8,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
}

impl<B: Backend> BlockLayer<B> {
    pub fn kind(&self) -> LayerKind {
        LayerKind::from_id(self.kind_id)
    }

    /// Slots this layer reads, in block input order.
    pub fn inputs(&self) -> &[usize] {
        &self.inputs
    }

    /// Slots this layer writes, in block output order.
    pub fn outputs(&self) -> &[usize] {
        &self.outputs
    }

    /// Applies the layer; returns one tensor per output slot.
    pub fn forward(&self, inputs: Vec<Tensor<B, 2>>) -> Vec<Tensor<B, 2>> {
        match self.kind() {
            LayerKind::Identity => inputs.into_iter().take(1).collect(),
            LayerKind::Dense => match &self.dense {
                Some(dense) => inputs.into_iter().take(1).map(|x| dense.forward(x)).collect(),
                None => inputs.into_iter().take(1).collect(),
            },
            LayerKind::Add => inputs.into_iter().reduce(|acc, x| acc + x).into_iter().collect(),
            LayerKind::Concat => vec![Tensor::cat(inputs, 1)],
            LayerKind::Fork => match inputs.into_iter().next() {
                Some(x) => vec![x; self.outputs.len()],
                None => Vec::new(),
            },
        }
    }
}
