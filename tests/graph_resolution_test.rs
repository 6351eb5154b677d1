//! Integration tests for graph declaration and resolution.

use automodel::graph::{BlockKind, GraphResolver, NodeId, ResolvedGraph, Topology};
use automodel::errors::GraphError;

fn ids(resolved: &ResolvedGraph) -> Vec<(usize, usize)> {
    resolved
        .node_to_id()
        .map(|(node, id)| (node.index(), id))
        .collect()
}

#[test]
fn test_single_identity_block() {
    let mut topology = Topology::new();
    let input = topology.add_node();
    let output = topology.identity(input);

    let resolved = ResolvedGraph::resolve(&topology, &[input], &[output]).unwrap();

    assert_eq!(resolved.node_id(input), Some(0));
    assert_eq!(resolved.node_id(output), Some(1));
    assert_eq!(resolved.nodes(), &[input, output]);
    assert_eq!(resolved.block_order().len(), 1);
    let block = topology.block(resolved.block_order()[0]).unwrap();
    assert_eq!(block.name(), "identity_0");
}

#[test]
fn test_dangling_branch_is_pruned() {
    let mut topology = Topology::new();
    let input = topology.add_node();
    let intermediate = topology.dense(input);
    let output = topology.dense(intermediate);
    let dangling = topology.dense(intermediate);

    let resolved = ResolvedGraph::resolve(&topology, &[input], &[output]).unwrap();

    assert!(!resolved.contains(dangling));
    assert_eq!(resolved.nodes().len(), 3);
    let names: Vec<&str> = resolved
        .block_order()
        .iter()
        .map(|&id| topology.block(id).unwrap().name())
        .collect();
    assert_eq!(names, vec!["dense_0", "dense_1"]);
}

#[test]
fn test_cycle_is_rejected() {
    let mut topology = Topology::new();
    let input = topology.add_node();
    let output = topology.add_node();
    topology.add_block(BlockKind::Identity, &[input], &[output]);
    topology.add_block(BlockKind::Identity, &[output], &[input]);

    let result = ResolvedGraph::resolve(&topology, &[input], &[output]);
    assert!(matches!(result, Err(GraphError::Cycle { .. })));
}

#[test]
fn test_unconnected_input_is_rejected() {
    let mut topology = Topology::new();
    let connected = topology.add_node();
    let unconnected = topology.add_node();
    let output = topology.dense(connected);

    let result = ResolvedGraph::resolve(&topology, &[connected, unconnected], &[output]);
    assert_eq!(result, Err(GraphError::Disconnected { node: unconnected }));
}

#[test]
fn test_unreached_output_is_rejected() {
    let mut topology = Topology::new();
    let input = topology.add_node();
    let reached = topology.dense(input);
    let undeclared = topology.add_node();
    let unreached = topology.dense(undeclared);

    let result = ResolvedGraph::resolve(&topology, &[input], &[reached, unreached]);
    assert_eq!(result, Err(GraphError::Disconnected { node: unreached }));
}

#[test]
fn test_resolution_is_repeatable() {
    let mut topology = Topology::new();
    let a = topology.add_node();
    let b = topology.add_node();
    let left = topology.dense(a);
    let right = topology.dense(b);
    let joined = topology.concat(&[left, right]);
    let deeper = topology.dense(joined);
    let output = topology.add(&[deeper, joined]);

    let resolver = GraphResolver::new(&topology);
    let first = resolver.resolve(&[a, b], &[output]).unwrap();
    let second = resolver.resolve(&[a, b], &[output]).unwrap();

    assert_eq!(first, second);
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.node_id(a), Some(0));
    assert_eq!(first.node_id(b), Some(1));
}

#[test]
fn test_every_retained_block_precedes_its_consumers() {
    let mut topology = Topology::new();
    let input = topology.add_node();
    let branches = topology.fork(input, 3);
    let short = topology.identity(branches[0]);
    let long = topology.dense(branches[1]);
    let longer = topology.dense(long);
    let merged = topology.concat(&[longer, short, branches[2]]);
    let output = topology.regression_head(merged);

    let resolved = ResolvedGraph::resolve(&topology, &[input], &[output]).unwrap();

    let mut produced = vec![input];
    for &block_id in resolved.block_order() {
        let block = topology.block(block_id).unwrap();
        for node in block.inputs() {
            assert!(produced.contains(node), "{} consumed before production", node);
        }
        produced.extend_from_slice(block.outputs());
    }
    assert_eq!(resolved.block_order().len(), 6);
}

#[test]
fn test_resolved_graph_serializes() {
    let mut topology = Topology::new();
    let input = topology.add_node();
    let output = topology.classification_head(input);

    let resolved = ResolvedGraph::resolve(&topology, &[input], &[output]).unwrap();
    let json = serde_json::to_string(&resolved).unwrap();
    let restored: ResolvedGraph = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, resolved);
}

#[test]
fn test_resolved_graph_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResolvedGraph>();
    assert_send_sync::<NodeId>();
}
