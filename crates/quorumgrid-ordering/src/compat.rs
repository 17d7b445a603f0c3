//! Child-compatibility search for interleaved orderings.
//!
//! Two collectives are interleaved by pairing children that live on the
//! same node. "Live on" is the current node when looking at stops of the
//! old state, and the assigned node when looking at starts of the new
//! one.

use quorumgrid_model::{NodeId, ResourceFlags, Role, RscIx, WorkingSet, sorted_candidates};

/// Where an instance is, for pairing purposes: the current node (sorted
/// first when active on several) or the node placement chose.
pub fn instance_location(ws: &WorkingSet, instance: RscIx, current: bool) -> Option<NodeId> {
    let rsc = ws.resource(instance);
    if current {
        rsc.current_node().cloned()
    } else {
        rsc.assigned_to.clone()
    }
}

/// The child of `peer` that shares a node with `local_child`, if any.
///
/// When `local_child` has no location yet, its allowed nodes are tried
/// in standard candidate order.
pub fn find_compatible_child(
    ws: &WorkingSet,
    local_child: RscIx,
    peer: RscIx,
    role: Role,
    current: bool,
) -> Option<RscIx> {
    if let Some(node) = instance_location(ws, local_child, current) {
        return find_compatible_child_on(ws, peer, &node, role, current);
    }

    for (node, _) in sorted_candidates(&ws.resource(local_child).allowed) {
        if let Some(found) = find_compatible_child_on(ws, peer, node, role, current) {
            return Some(found);
        }
    }
    None
}

/// The child of `peer` located on `node` with the wanted role, skipping
/// blocked instances. `Role::Unknown` matches any role.
pub fn find_compatible_child_on(
    ws: &WorkingSet,
    peer: RscIx,
    node: &NodeId,
    role: Role,
    current: bool,
) -> Option<RscIx> {
    ws.instances(peer).iter().copied().find(|&child| {
        let rsc = ws.resource(child);
        if rsc.is(ResourceFlags::BLOCKED) {
            return false;
        }
        if role != Role::Unknown && rsc.role != role {
            return false;
        }
        instance_location(ws, child, current).as_ref() == Some(node)
    })
}
