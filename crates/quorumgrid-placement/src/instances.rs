//! The collective placement engine.
//!
//! Placement runs in three phases over the supplied instance order:
//! reset the collective's per-node counts, keep active instances on
//! their current node where that is still sensible, then assign
//! whatever is left. Instances beyond the collective's total get an
//! explicit -INFINITY location record instead of a node.

use tracing::{debug, error, info, warn};

use quorumgrid_model::{
    ColocIx, NodeId, ResourceFlags, RscIx, Score, working_set::WorkingSet,
};

use crate::assign::assign_resource;

/// Assign up to `max_total` of `instances` across the collective's
/// allowed nodes, at most `max_per_node` per node. Returns the number of
/// instances placed.
pub fn assign_instances(
    ws: &mut WorkingSet,
    collective: RscIx,
    instances: &[RscIx],
    max_total: u32,
    max_per_node: u32,
) -> u32 {
    // Phase 0: reset the counting state for this pass.
    for entry in ws.resource_mut(collective).allowed.values_mut() {
        entry.count = 0;
    }
    let available_nodes = ws
        .resource(collective)
        .allowed
        .values()
        .filter(|entry| ws.node(entry.node).available(false, false))
        .count() as u32;
    let optimal_per_node = if available_nodes == 0 {
        1
    } else {
        (max_total / available_nodes).max(1)
    };
    // With slack, honor all parent colocations; otherwise only bans and
    // mandates, to avoid needless shuffling.
    let all_coloc = max_total < available_nodes;
    let max_total = max_total.min(available_nodes * max_per_node);

    debug!(
        collective = %ws.resource(collective).id,
        max_total,
        max_per_node,
        available_nodes,
        optimal_per_node,
        all_coloc,
        "assigning instances"
    );

    // Phase 1: keep active instances on their current node.
    let mut assigned = 0u32;
    for &instance in instances {
        copy_parent_colocations(ws, collective, instance, all_coloc);

        if let Some(preferred) = preferred_node(ws, instance, optimal_per_node) {
            if assign_instance(ws, instance, Some(&preferred), max_per_node) {
                assigned += 1;
            }
        }
        if assigned == max_total {
            break;
        }
    }

    // Phase 2: final assignment of whatever is still provisional.
    for &instance in instances {
        if !ws.resource(instance).is(ResourceFlags::PROVISIONAL) {
            continue;
        }
        if assigned >= max_total {
            ws.ban(
                instance,
                None,
                Score::MinusInf,
                "collective limit reached",
            );
        } else if assign_instance(ws, instance, None, max_per_node) {
            assigned += 1;
        } else {
            ws.ban(instance, None, Score::MinusInf, "no viable node");
        }
    }

    info!(
        collective = %ws.resource(collective).id,
        assigned,
        total = instances.len(),
        "instance placement complete"
    );
    assigned
}

/// The node an instance should keep, if any: its current node, when the
/// instance is active, still unplaced, not failed, the node is strictly
/// available, and the collective's view of that node is under the
/// optimal share.
pub fn preferred_node(
    ws: &WorkingSet,
    instance: RscIx,
    optimal_per_node: u32,
) -> Option<NodeId> {
    let rsc = ws.resource(instance);
    if !rsc.is_active() || !rsc.is(ResourceFlags::PROVISIONAL) || rsc.is(ResourceFlags::FAILED) {
        return None;
    }
    let node_id = rsc.current_node()?.clone();
    let node = ws.node_ix(&node_id)?;
    if !ws.node(node).available(true, false) {
        return None;
    }
    let top = ws.top_allowed(instance, &node_id)?;
    if top.count >= optimal_per_node {
        return None;
    }
    Some(node_id)
}

/// Assign one instance, preferring `prefer` when given.
///
/// With a preference, the allowed table is snapshotted first and the
/// whole attempt is rolled back unless the preferred node is the one
/// chosen. Failure leaves the instance provisional.
fn assign_instance(
    ws: &mut WorkingSet,
    instance: RscIx,
    prefer: Option<&NodeId>,
    max_per_node: u32,
) -> bool {
    {
        let rsc = ws.resource(instance);
        if !rsc.is(ResourceFlags::PROVISIONAL) {
            return rsc.assigned_to.is_some();
        }
        if rsc.is(ResourceFlags::ALLOCATING) {
            warn!(resource = %rsc.id, "dependency cycle detected during placement");
            return false;
        }
        if let Some(wanted) = prefer {
            match rsc.allowed.get(wanted) {
                Some(entry) if !entry.weight.is_negative() => {}
                _ => return false,
            }
        }
    }

    let backup = prefer.map(|_| ws.resource(instance).allowed.clone());

    ban_unavailable_nodes(ws, instance, max_per_node);

    ws.resource_mut(instance)
        .flags
        .insert(ResourceFlags::ALLOCATING);
    let chosen = assign_resource(ws, instance, prefer);
    ws.resource_mut(instance)
        .flags
        .remove(ResourceFlags::ALLOCATING);

    if let Some(wanted) = prefer {
        if chosen.as_ref() != Some(wanted) {
            // Could not keep the preferred node; revert the attempt.
            debug!(
                resource = %ws.resource(instance).id,
                wanted = %wanted,
                "rolling back early assignment"
            );
            if let Some(backup) = backup {
                ws.resource_mut(instance).allowed = backup;
            }
            ws.unassign(instance);
            return false;
        }
    }

    match chosen {
        Some(node) => {
            if let Some(top) = ws.top_allowed_mut(instance, &node) {
                top.count += 1;
            } else if ws.resource(instance).is(ResourceFlags::MANAGED) {
                error!(
                    resource = %ws.resource(instance).id,
                    node = %node,
                    "managed instance assigned to a node with no top-level view"
                );
            }
            true
        }
        None => false,
    }
}

/// Pin -INFINITY onto every allowed node an instance cannot use: the
/// instance is orphaned, the node is unavailable, the collective has no
/// view of it, that view is negative, or its per-node cap is spent.
fn ban_unavailable_nodes(ws: &mut WorkingSet, instance: RscIx, max_per_node: u32) {
    let orphan = ws.resource(instance).is(ResourceFlags::ORPHAN);
    let ids: Vec<NodeId> = ws.resource(instance).allowed.keys().cloned().collect();
    for id in ids {
        let node = ws.resource(instance).allowed[&id].node;
        let banned = orphan
            || !ws.node(node).available(true, false)
            || match ws.top_allowed(instance, &id) {
                None => true,
                Some(top) => top.weight.is_negative() || top.count >= max_per_node,
            };
        if banned {
            if let Some(entry) = ws.resource_mut(instance).allowed.get_mut(&id) {
                entry.weight = Score::MinusInf;
            }
        }
    }
}

fn keep_colocation(score: Score, all_coloc: bool) -> bool {
    all_coloc || score.is_negative() || score.is_plus_inf()
}

/// Copy the collective's colocations onto an instance. Incoming edges
/// are additionally filtered by their influence on this instance.
fn copy_parent_colocations(
    ws: &mut WorkingSet,
    collective: RscIx,
    instance: RscIx,
    all_coloc: bool,
) {
    let outgoing: Vec<ColocIx> = ws.resource(collective).colocations.clone();
    for cix in outgoing {
        if !keep_colocation(ws.colocation(cix).score, all_coloc) {
            continue;
        }
        let list = &mut ws.resource_mut(instance).colocations;
        if !list.contains(&cix) {
            list.push(cix);
        }
    }

    let incoming: Vec<ColocIx> = ws.resource(collective).colocations_in.clone();
    for cix in incoming {
        if !keep_colocation(ws.colocation(cix).score, all_coloc) {
            continue;
        }
        if !ws.colocation_influences(cix, instance) {
            continue;
        }
        let list = &mut ws.resource_mut(instance).colocations_in;
        if !list.contains(&cix) {
            list.push(cix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorumgrid_model::{ClusterNode, Colocation, Resource, Variant};

    fn clone_with_instances(
        node_ids: &[&str],
        instance_count: usize,
    ) -> (WorkingSet, RscIx, Vec<RscIx>) {
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
            let child = ws.add_resource(Resource::new(
                format!("web:{i}"),
                Variant::Primitive,
            ));
            ws.set_parent(child, collective);
            for &node in &nodes {
                ws.allow_node(child, node, Score::ZERO);
            }
            instances.push(child);
        }
        (ws, collective, instances)
    }

    #[test]
    fn preferred_node_requires_active_instance() {
        let (ws, _, instances) = clone_with_instances(&["a", "b"], 1);
        assert_eq!(preferred_node(&ws, instances[0], 1), None);
    }

    #[test]
    fn preferred_node_respects_optimal_share() {
        let (mut ws, collective, instances) = clone_with_instances(&["a", "b"], 2);
        ws.resource_mut(instances[0])
            .running_on
            .insert("a".to_string());
        ws.resource_mut(collective)
            .allowed
            .get_mut("a")
            .unwrap()
            .count = 1;
        assert_eq!(preferred_node(&ws, instances[0], 1), None);
        assert_eq!(
            preferred_node(&ws, instances[0], 2).as_deref(),
            Some("a")
        );
    }

    #[test]
    fn cycle_guard_fails_instead_of_recursing() {
        let (mut ws, _, instances) = clone_with_instances(&["a"], 1);
        ws.resource_mut(instances[0])
            .flags
            .insert(ResourceFlags::ALLOCATING);
        assert!(!assign_instance(&mut ws, instances[0], None, 1));
        assert!(ws.resource(instances[0]).is(ResourceFlags::PROVISIONAL));
    }

    #[test]
    fn rollback_restores_allowed_table() {
        // Prefer a node whose per-node cap is already spent: the ban
        // pass pins it, the assignment lands elsewhere, and the whole
        // attempt must be rolled back.
        let (mut ws, collective, instances) = clone_with_instances(&["a", "b"], 1);
        ws.resource_mut(collective)
            .allowed
            .get_mut("a")
            .unwrap()
            .count = 1;
        let before = ws.resource(instances[0]).allowed.clone();

        let prefer = "a".to_string();
        assert!(!assign_instance(&mut ws, instances[0], Some(&prefer), 1));

        assert_eq!(ws.resource(instances[0]).allowed, before);
        assert!(ws.resource(instances[0]).is(ResourceFlags::PROVISIONAL));
        assert_eq!(ws.resource(instances[0]).assigned_to, None);
    }

    #[test]
    fn copies_only_bans_and_mandates_without_slack() {
        let (mut ws, collective, instances) = clone_with_instances(&["a", "b"], 2);
        let other = ws.add_resource(Resource::new("db", Variant::Primitive));
        ws.add_colocation(Colocation::new("soft", collective, other, Score::Finite(10)));
        ws.add_colocation(Colocation::new("hard", collective, other, Score::PlusInf));
        ws.add_colocation(Colocation::new("avoid", collective, other, Score::Finite(-5)));

        copy_parent_colocations(&mut ws, collective, instances[0], false);
        assert_eq!(ws.resource(instances[0]).colocations.len(), 2);

        copy_parent_colocations(&mut ws, collective, instances[1], true);
        assert_eq!(ws.resource(instances[1]).colocations.len(), 3);
    }
}
