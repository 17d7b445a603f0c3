//! Native assignment, dispatched by resource variant.
//!
//! Primitives pick a node from their allowed table after colocation
//! scores are folded in. Groups place their members in order. Clones and
//! bundles delegate to the instance placement engine with their
//! configured totals.

use tracing::{debug, info};

use quorumgrid_model::{
    NodeId, ResourceFlags, RscIx, Score, Variant, meta, sorted_candidates, working_set::WorkingSet,
};

use crate::instances::assign_instances;

/// Assign `resource` to a node (or nodes, for collectives).
///
/// Returns the chosen node for primitives and groups; collectives place
/// their instances individually and return `None`.
pub fn assign_resource(
    ws: &mut WorkingSet,
    resource: RscIx,
    prefer: Option<&NodeId>,
) -> Option<NodeId> {
    match ws.resource(resource).variant {
        Variant::Primitive => assign_primitive(ws, resource, prefer),
        Variant::Group => assign_group(ws, resource, prefer),
        Variant::Clone | Variant::Bundle => {
            assign_collective(ws, resource);
            None
        }
    }
}

/// Assign every instance of a clone or bundle, reading `clone-max` and
/// `clone-node-max` from its meta attributes. Returns how many instances
/// were placed.
pub fn assign_collective(ws: &mut WorkingSet, collective: RscIx) -> u32 {
    if !ws.resource(collective).is(ResourceFlags::PROVISIONAL) {
        return 0;
    }
    let rsc = ws.resource(collective);
    let max_total = rsc
        .meta_u32(meta::CLONE_MAX)
        .unwrap_or(ws.node_count() as u32);
    let max_per_node = rsc.meta_u32(meta::CLONE_NODE_MAX).unwrap_or(1);
    let instances: Vec<RscIx> = rsc.children.clone();

    let assigned = assign_instances(ws, collective, &instances, max_total, max_per_node);
    ws.resource_mut(collective)
        .flags
        .remove(ResourceFlags::PROVISIONAL);
    assigned
}

fn assign_primitive(ws: &mut WorkingSet, resource: RscIx, prefer: Option<&NodeId>) -> Option<NodeId> {
    if !ws.resource(resource).is(ResourceFlags::PROVISIONAL) {
        return ws.resource(resource).assigned_to.clone();
    }

    apply_colocation_scores(ws, resource);

    let chosen = choose_node(ws, resource, prefer);
    match chosen {
        Some(node) => {
            let rsc = ws.resource_mut(resource);
            rsc.assigned_to = Some(node.clone());
            rsc.flags.remove(ResourceFlags::PROVISIONAL);
            info!(resource = %rsc.id, node = %node, "assigned");
            Some(node)
        }
        None => {
            // Left provisional: later engines read this as "not to be
            // started".
            debug!(resource = %ws.resource(resource).id, "no viable node");
            None
        }
    }
}

fn assign_group(ws: &mut WorkingSet, resource: RscIx, prefer: Option<&NodeId>) -> Option<NodeId> {
    if !ws.resource(resource).is(ResourceFlags::PROVISIONAL) {
        return ws.resource(resource).assigned_to.clone();
    }
    let members = ws.resource(resource).children.clone();
    let mut group_node: Option<NodeId> = None;
    for member in members {
        // Members after the first follow the first member's node.
        let target = group_node.clone();
        let chosen = assign_resource(ws, member, target.as_ref().or(prefer));
        if group_node.is_none() {
            group_node = chosen;
        }
    }
    let rsc = ws.resource_mut(resource);
    rsc.assigned_to = group_node.clone();
    rsc.flags.remove(ResourceFlags::PROVISIONAL);
    group_node
}

/// Fold colocation edges into the allowed-node table before choosing.
fn apply_colocation_scores(ws: &mut WorkingSet, resource: RscIx) {
    // "This with other": follow a primary that is already placed.
    let outgoing = ws.resource(resource).colocations.clone();
    for cix in outgoing {
        let (primary, score) = {
            let coloc = ws.colocation(cix);
            (coloc.primary, coloc.score)
        };
        let Some(primary_node) = ws.resource(primary).assigned_to.clone() else {
            continue;
        };
        match score {
            Score::PlusInf => {
                // Mandatory colocation: every other node is out.
                for (id, entry) in ws.resource_mut(resource).allowed.iter_mut() {
                    if *id != primary_node {
                        entry.weight = Score::MinusInf;
                    }
                }
            }
            Score::MinusInf => {
                if let Some(entry) = ws.resource_mut(resource).allowed.get_mut(&primary_node) {
                    entry.weight = Score::MinusInf;
                }
            }
            finite => {
                if let Some(entry) = ws.resource_mut(resource).allowed.get_mut(&primary_node) {
                    entry.weight = entry.weight.saturating_add(finite);
                }
            }
        }
    }

    // "Other with this": placed dependents with influence pull us
    // toward their node. Bans flow the other way only.
    let incoming = ws.resource(resource).colocations_in.clone();
    for cix in incoming {
        let (dependent, score) = {
            let coloc = ws.colocation(cix);
            (coloc.dependent, coloc.score)
        };
        if score.is_infinite() || !ws.colocation_influences(cix, dependent) {
            continue;
        }
        let Some(dependent_node) = ws.resource(dependent).assigned_to.clone() else {
            continue;
        };
        if let Some(entry) = ws.resource_mut(resource).allowed.get_mut(&dependent_node) {
            entry.weight = entry.weight.saturating_add(score);
        }
    }
}

/// Pick the node for a primitive: `prefer` when viable, else the best
/// non-banned available candidate in standard order.
fn choose_node(ws: &WorkingSet, resource: RscIx, prefer: Option<&NodeId>) -> Option<NodeId> {
    let rsc = ws.resource(resource);

    if let Some(wanted) = prefer {
        if let Some(entry) = rsc.allowed.get(wanted) {
            if !entry.weight.is_negative() && ws.node(entry.node).available(false, false) {
                return Some(wanted.clone());
            }
        }
    }

    sorted_candidates(&rsc.allowed)
        .into_iter()
        .find(|(_, entry)| {
            !entry.weight.is_minus_inf() && ws.node(entry.node).available(false, false)
        })
        .map(|(id, _)| id.clone())
}
