//! End-to-end placement scenarios over small hand-built clusters.

use std::collections::BTreeMap;

use quorumgrid_model::{
    ClusterNode, NodeIx, Resource, ResourceFlags, RscIx, Score, Variant, WorkingSet,
};
use quorumgrid_placement::assign_instances;

struct Cluster {
    ws: WorkingSet,
    nodes: Vec<NodeIx>,
    collective: RscIx,
    instances: Vec<RscIx>,
}

fn build_cluster(node_ids: &[&str], instance_count: usize) -> Cluster {
    let mut ws = WorkingSet::new();
    let nodes: Vec<_> = node_ids
        .iter()
        .map(|id| ws.add_node(ClusterNode::online(*id)))
        .collect();
    let collective = ws.add_resource(Resource::new("web-clone", Variant::Clone));
    for &node in &nodes {
        ws.allow_node(collective, node, Score::ZERO);
    }
    let mut instances = Vec::new();
    for i in 0..instance_count {
        let child = ws.add_resource(Resource::new(format!("web:{i}"), Variant::Primitive));
        ws.set_parent(child, collective);
        for &node in &nodes {
            ws.allow_node(child, node, Score::ZERO);
        }
        instances.push(child);
    }
    Cluster {
        ws,
        nodes,
        collective,
        instances,
    }
}

fn assignments(ws: &WorkingSet, instances: &[RscIx]) -> BTreeMap<String, Option<String>> {
    instances
        .iter()
        .map(|&i| {
            (
                ws.resource(i).id.clone(),
                ws.resource(i).assigned_to.clone(),
            )
        })
        .collect()
}

/// Instances per node must never exceed the per-node cap, totals must
/// never exceed the collective total, and nothing may land on a banned
/// node.
fn check_invariants(ws: &WorkingSet, instances: &[RscIx], max_total: u32, max_per_node: u32) {
    let mut per_node: BTreeMap<String, u32> = BTreeMap::new();
    let mut total = 0u32;
    for &instance in instances {
        let rsc = ws.resource(instance);
        if let Some(node) = &rsc.assigned_to {
            assert!(
                !rsc.allowed[node].weight.is_minus_inf(),
                "{} assigned to banned node {node}",
                rsc.id
            );
            *per_node.entry(node.clone()).or_default() += 1;
            total += 1;
        }
    }
    assert!(total <= max_total);
    for (node, count) in per_node {
        assert!(count <= max_per_node, "{count} instances on {node}");
    }
}

#[test]
fn even_spread_across_three_nodes() {
    let mut cluster = build_cluster(&["a", "b", "c"], 3);
    let placed = assign_instances(
        &mut cluster.ws,
        cluster.collective,
        &cluster.instances,
        3,
        1,
    );

    assert_eq!(placed, 3);
    check_invariants(&cluster.ws, &cluster.instances, 3, 1);

    let nodes: Vec<String> = cluster
        .instances
        .iter()
        .filter_map(|&i| cluster.ws.resource(i).assigned_to.clone())
        .collect();
    let mut unique = nodes.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 3, "one instance per node, got {nodes:?}");
}

#[test]
fn active_instances_stick_to_their_current_node() {
    let mut cluster = build_cluster(&["a", "b"], 2);
    cluster
        .ws
        .resource_mut(cluster.instances[0])
        .running_on
        .insert("a".to_string());
    cluster
        .ws
        .resource_mut(cluster.instances[1])
        .running_on
        .insert("b".to_string());

    let placed = assign_instances(
        &mut cluster.ws,
        cluster.collective,
        &cluster.instances,
        2,
        1,
    );

    assert_eq!(placed, 2);
    assert_eq!(
        cluster
            .ws
            .resource(cluster.instances[0])
            .assigned_to
            .as_deref(),
        Some("a")
    );
    assert_eq!(
        cluster
            .ws
            .resource(cluster.instances[1])
            .assigned_to
            .as_deref(),
        Some("b")
    );
}

#[test]
fn collective_limit_pins_excess_instances() {
    let mut cluster = build_cluster(&["a", "b"], 3);
    let placed = assign_instances(
        &mut cluster.ws,
        cluster.collective,
        &cluster.instances,
        3,
        1,
    );

    assert_eq!(placed, 2);
    check_invariants(&cluster.ws, &cluster.instances, 3, 1);

    let leftover = cluster.instances[2];
    let rsc = cluster.ws.resource(leftover);
    assert!(rsc.is(ResourceFlags::PROVISIONAL));
    assert_eq!(rsc.assigned_to, None);
    assert!(rsc.allowed.values().all(|e| e.weight.is_minus_inf()));
    assert!(
        cluster
            .ws
            .bans
            .iter()
            .any(|b| b.resource == leftover && b.reason == "collective limit reached")
    );
}

#[test]
fn banned_node_cascades_to_every_instance() {
    let mut cluster = build_cluster(&["a", "b"], 2);
    cluster
        .ws
        .resource_mut(cluster.collective)
        .allowed
        .get_mut("a")
        .unwrap()
        .weight = Score::MinusInf;

    assign_instances(
        &mut cluster.ws,
        cluster.collective,
        &cluster.instances,
        2,
        1,
    );

    for &instance in &cluster.instances {
        let rsc = cluster.ws.resource(instance);
        assert!(
            rsc.allowed["a"].weight.is_minus_inf(),
            "{} still allows a",
            rsc.id
        );
        assert_ne!(rsc.assigned_to.as_deref(), Some("a"));
    }
}

#[test]
fn standby_nodes_receive_nothing() {
    let mut cluster = build_cluster(&["a", "b"], 2);
    cluster.ws.node_mut(cluster.nodes[0]).standby = true;

    let placed = assign_instances(
        &mut cluster.ws,
        cluster.collective,
        &cluster.instances,
        2,
        1,
    );

    assert_eq!(placed, 1);
    for &instance in &cluster.instances {
        assert_ne!(
            cluster.ws.resource(instance).assigned_to.as_deref(),
            Some("a")
        );
    }
}

#[test]
fn placement_is_deterministic() {
    // Compare the entire serialized working set, not just the chosen
    // nodes: counts, weights, and ban records must match too.
    let run = || {
        let mut cluster = build_cluster(&["c", "a", "b"], 3);
        assign_instances(
            &mut cluster.ws,
            cluster.collective,
            &cluster.instances,
            3,
            1,
        );
        serde_json::to_value(&cluster.ws).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn replay_on_own_output_changes_nothing() {
    let mut cluster = build_cluster(&["a", "b", "c"], 3);
    assign_instances(
        &mut cluster.ws,
        cluster.collective,
        &cluster.instances,
        3,
        1,
    );
    let first = assignments(&cluster.ws, &cluster.instances);

    assign_instances(
        &mut cluster.ws,
        cluster.collective,
        &cluster.instances,
        3,
        1,
    );
    let second = assignments(&cluster.ws, &cluster.instances);

    assert_eq!(first, second);
}

#[test]
fn higher_per_node_cap_stacks_instances() {
    let mut cluster = build_cluster(&["a", "b"], 4);
    let placed = assign_instances(
        &mut cluster.ws,
        cluster.collective,
        &cluster.instances,
        4,
        2,
    );

    assert_eq!(placed, 4);
    check_invariants(&cluster.ws, &cluster.instances, 4, 2);
}
