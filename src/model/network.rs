//! Network - the trainable module assembled from a resolved graph.

use std::collections::HashMap;

use burn::{
    module::Module,
    tensor::{Tensor, backend::Backend},
};

use super::layer::BlockLayer;

/// Layers in block order, wired through numbered value slots.
///
/// `entries` are the slots fed by the model inputs and `exits` the slots
/// read as model outputs, both in declaration order.
#[derive(Module, Debug)]
pub struct Network<B: Backend> {
    layers: Vec<BlockLayer<B>>,
    entries: Vec<usize>,
    exits: Vec<usize>,
}

impl<B: Backend> Network<B> {
    pub(crate) fn new(layers: Vec<BlockLayer<B>>, entries: Vec<usize>, exits: Vec<usize>) -> Self {
        Self {
            layers,
            entries,
            exits,
        }
    }

    /// Performs a forward pass; one tensor per model input, one per output.
    pub fn forward(&self, inputs: Vec<Tensor<B, 2>>) -> Vec<Tensor<B, 2>> {
        let mut slots: HashMap<usize, Tensor<B, 2>> = HashMap::new();
        for (&slot, tensor) in self.entries.iter().zip(inputs) {
            slots.insert(slot, tensor);
        }

        for layer in &self.layers {
            let args = layer
                .inputs()
                .iter()
                .map(|slot| slots[slot].clone())
                .collect();
            for (&slot, tensor) in layer.outputs().iter().zip(layer.forward(args)) {
                slots.insert(slot, tensor);
            }
        }

        self.exits.iter().map(|slot| slots[slot].clone()).collect()
    }

    pub fn layers(&self) -> &[BlockLayer<B>] {
        &self.layers
    }

    /// Slots fed by the model inputs.
    pub fn entries(&self) -> &[usize] {
        &self.entries
    }

    /// Slots read as model outputs.
    pub fn exits(&self) -> &[usize] {
        &self.exits
    }

    pub fn num_inputs(&self) -> usize {
        self.entries.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.exits.len()
    }
}
