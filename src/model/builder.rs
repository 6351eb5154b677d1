//! ModelBuilder - turns a resolved graph and a hyperparameter sample into
//! a trainable model.

use std::collections::HashMap;

use burn::tensor::backend::{AutodiffBackend, Backend};

use super::network::Network;
use super::trainable::{CompileSettings, TrainableModel};
use crate::errors::{GraphError, ModelError};
use crate::graph::{BlockRole, NodeId, ResolvedGraph, Topology};
use crate::hyperparameters::HyperParameters;
use crate::training::{Loss, Metric, OptimizerKind};
use crate::tuner::SearchConfig;

/// A value slot of a network being built, with its feature width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port {
    pub slot: usize,
    pub width: usize,
}

/// A network together with how it was wired.
#[derive(Debug)]
pub struct BuiltNetwork<B: Backend> {
    pub network: Network<B>,
    /// Widths of the model inputs, in declaration order.
    pub input_widths: Vec<usize>,
    /// Widths of the model outputs, in declaration order.
    pub output_widths: Vec<usize>,
}

/// Builds models from a topology.
///
/// The builder never mutates the resolved graph; every call starts from a
/// fresh slot map so repeated builds are independent.
pub struct ModelBuilder<'a> {
    topology: &'a Topology,
    config: &'a SearchConfig,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(topology: &'a Topology, config: &'a SearchConfig) -> Self {
        Self { topology, config }
    }

    /// Builds a trainable model, drawing the optimizer from `hp` and
    /// inferring the metric and loss from block roles.
    pub fn build<B: AutodiffBackend>(
        &self,
        resolved: &ResolvedGraph,
        hp: &mut HyperParameters,
        device: &B::Device,
    ) -> Result<TrainableModel<B>, ModelError> {
        let built = self.build_network::<B>(resolved, hp, device)?;

        let name = hp.choice_str("optimizer", &OptimizerKind::NAMES);
        let optimizer =
            OptimizerKind::from_name(&name).ok_or_else(|| ModelError::InvalidBlockConfig {
                message: format!("unknown optimizer {name}"),
            })?;
        let (metric, loss) = self.infer_compile(resolved)?;

        Ok(TrainableModel::new(
            built,
            CompileSettings {
                optimizer,
                loss,
                metric,
            },
            device.clone(),
        ))
    }

    /// Wires one layer per block of `resolved.block_order()`.
    pub fn build_network<B: Backend>(
        &self,
        resolved: &ResolvedGraph,
        hp: &mut HyperParameters,
        device: &B::Device,
    ) -> Result<BuiltNetwork<B>, ModelError> {
        if resolved.topology_len() != self.topology.num_nodes() {
            return Err(GraphError::TopologyMismatch {
                resolved: resolved.topology_len(),
                topology: self.topology.num_nodes(),
            }
            .into());
        }

        let mut ports: HashMap<usize, Port> = HashMap::new();
        let mut next_slot = 0;

        let mut entries = Vec::with_capacity(resolved.inputs().len());
        let mut input_widths = Vec::with_capacity(resolved.inputs().len());
        for &input in resolved.inputs() {
            let width = self.node_width(input)?;
            let id = resolved
                .node_id(input)
                .ok_or(GraphError::Disconnected { node: input })?;
            ports.insert(id, Port { slot: next_slot, width });
            entries.push(next_slot);
            input_widths.push(width);
            next_slot += 1;
        }

        let mut layers = Vec::with_capacity(resolved.block_order().len());
        for &block_id in resolved.block_order() {
            let block = self.topology.block(block_id)?;

            let inputs = block
                .inputs()
                .iter()
                .map(|&node| {
                    resolved
                        .node_id(node)
                        .and_then(|id| ports.get(&id).copied())
                        .ok_or_else(|| GraphError::BuildInvariant {
                            block: block.name().to_string(),
                            node,
                        })
                })
                .collect::<Result<Vec<Port>, GraphError>>()?;

            let built =
                block.build::<B>(hp, &inputs, true, self.config.dropout_rate, device)?;
            if built.output_widths().len() != block.outputs().len() {
                return Err(ModelError::InvalidBlockConfig {
                    message: format!(
                        "block {} built {} outputs for {} nodes",
                        block.name(),
                        built.output_widths().len(),
                        block.outputs().len()
                    ),
                });
            }

            let mut output_slots = Vec::with_capacity(block.outputs().len());
            for (&node, &width) in block.outputs().iter().zip(built.output_widths()) {
                if let Some(expected) = self.topology.node(node)?.width() {
                    if expected != width {
                        return Err(ModelError::ShapeMismatch {
                            expected,
                            actual: width,
                        });
                    }
                }
                let port = Port { slot: next_slot, width };
                next_slot += 1;
                output_slots.push(port.slot);
                // Pruned outputs keep their slot, nothing reads it.
                if let Some(id) = resolved.node_id(node) {
                    ports.insert(id, port);
                }
            }

            log::debug!(
                "Built block {} with inputs {:?} and output widths {:?}",
                block.name(),
                inputs,
                built.output_widths()
            );
            let input_slots = inputs.iter().map(|port| port.slot).collect();
            layers.push(built.into_layer(input_slots, output_slots));
        }

        let mut exits = Vec::with_capacity(resolved.outputs().len());
        let mut output_widths = Vec::with_capacity(resolved.outputs().len());
        for &output in resolved.outputs() {
            let port = resolved
                .node_id(output)
                .and_then(|id| ports.get(&id))
                .ok_or_else(|| GraphError::BuildInvariant {
                    block: self.producer_name(output),
                    node: output,
                })?;
            exits.push(port.slot);
            output_widths.push(port.width);
        }

        Ok(BuiltNetwork {
            network: Network::new(layers, entries, exits),
            input_widths,
            output_widths,
        })
    }

    /// Any classification block selects accuracy with cross entropy,
    /// otherwise mean squared error for both. Binary cross entropy is used
    /// when every classification head produces a single column.
    pub fn infer_compile(&self, resolved: &ResolvedGraph) -> Result<(Metric, Loss), GraphError> {
        let mut head_widths = Vec::new();
        for &id in resolved.block_order() {
            let block = self.topology.block(id)?;
            if block.role() == BlockRole::Classification {
                head_widths.push(block.output_shape().map(|s| s.iter().product::<usize>()));
            }
        }

        Ok(if head_widths.is_empty() {
            (Metric::Mse, Loss::Mse)
        } else if head_widths.iter().all(|&w| w == Some(1)) {
            (Metric::Accuracy, Loss::BinaryCrossEntropy)
        } else {
            (Metric::Accuracy, Loss::CategoricalCrossEntropy)
        })
    }

    fn node_width(&self, node: NodeId) -> Result<usize, ModelError> {
        self.topology
            .node(node)?
            .width()
            .ok_or_else(|| ModelError::UnknownShape {
                name: node.to_string(),
            })
    }

    fn producer_name(&self, node: NodeId) -> String {
        self.topology
            .node(node)
            .ok()
            .and_then(|n| n.in_blocks().first())
            .and_then(|&id| self.topology.block(id).ok())
            .map(|block| block.name().to_string())
            .unwrap_or_else(|| node.to_string())
    }
}
