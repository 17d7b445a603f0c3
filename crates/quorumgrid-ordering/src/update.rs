//! Ordering propagation across the action graph.
//!
//! Given a user-supplied ordering between two actions, the updater
//! either pairs the children of two interleaved collectives node by
//! node, or propagates flags for the pair itself and recurses into the
//! children of the `then` side.

use tracing::{debug, error, info};

use quorumgrid_model::{
    ActionFlags, ActionIx, NodeId, OrderingFlags, ResourceFlags, Role, RscIx, Score, Task,
    UpdatedFlags, WorkingSet,
};

use crate::compat::find_compatible_child;

/// Walk the user-supplied ordering list in document order and update
/// the graph for each entry. Returns the union of what changed.
pub fn apply_orderings(ws: &mut WorkingSet) -> UpdatedFlags {
    let mut updated = UpdatedFlags::empty();
    let orderings = ws.orderings.clone();
    for ordering in orderings {
        ws.order_actions(ordering.first, ordering.then, ordering.flags);
        let first_flags = collective_action_flags(ws, ordering.first, ordering.node.as_ref());
        updated |= update_ordering(
            ws,
            ordering.first,
            ordering.then,
            ordering.node.as_ref(),
            first_flags,
            ActionFlags::all(),
            ordering.flags,
        );
    }
    updated
}

/// Update the graph for one ordering, dispatching to interleaved child
/// pairing when both sides are interleave-eligible collectives.
pub fn update_ordering(
    ws: &mut WorkingSet,
    first: ActionIx,
    then: ActionIx,
    node: Option<&NodeId>,
    first_flags: ActionFlags,
    filter: ActionFlags,
    flags: OrderingFlags,
) -> UpdatedFlags {
    match interleave_resources(ws, first, then) {
        Some(_) => update_interleaved_ordering(ws, first, then, node, filter, flags),
        None => update_recursive_ordering(ws, first, then, node, first_flags, filter, flags),
    }
}

/// Whether this ordering should be interleaved, and if so which
/// resource's `interleave` setting governs it: the `first` side for
/// stop/demote orderings (we are looking at the old state), otherwise
/// the `then` side.
fn interleave_resources(ws: &WorkingSet, first: ActionIx, then: ActionIx) -> Option<RscIx> {
    let first_rsc = ws.action(first).resource?;
    let then_rsc = ws.action(then).resource?;
    if first_rsc == then_rsc {
        return None;
    }
    if !ws.resource(first_rsc).variant.is_collective()
        || !ws.resource(then_rsc).variant.is_collective()
    {
        return None;
    }

    let then_uuid = &ws.action(then).uuid;
    let governing = if then_uuid.ends_with("_stop_0") || then_uuid.ends_with("_demote_0") {
        first_rsc
    } else {
        then_rsc
    };
    if ws
        .resource(governing)
        .meta_bool(quorumgrid_model::meta::INTERLEAVE)
    {
        Some(governing)
    } else {
        None
    }
}

/// Which side of a pairing an instance action is looked up for.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    First,
    Then,
}

/// Pair the children of two interleaved collectives by node and order
/// each pair. Children of `then` with no partner are inhibited when the
/// ordering is mandatory.
fn update_interleaved_ordering(
    ws: &mut WorkingSet,
    first: ActionIx,
    then: ActionIx,
    node: Option<&NodeId>,
    filter: ActionFlags,
    flags: OrderingFlags,
) -> UpdatedFlags {
    let mut updated = UpdatedFlags::empty();
    let (Some(first_rsc), Some(then_rsc)) =
        (ws.action(first).resource, ws.action(then).resource)
    else {
        return updated;
    };
    let first_task = ws.action(first).task;
    let then_task = ws.action(then).task;
    // Stops and demotes pair by where instances are, not where they go.
    let current = {
        let uuid = &ws.action(then).uuid;
        uuid.ends_with("_stopped_0") || uuid.ends_with("_demoted_0")
    };

    let then_children = ws.instances(then_rsc).to_vec();
    for then_child in then_children {
        let Some(first_child) =
            find_compatible_child(ws, then_child, first_rsc, Role::Unknown, current)
        else {
            if current {
                continue;
            }
            if flags.intersects(OrderingFlags::RUNNABLE_LEFT | OrderingFlags::IMPLIES_THEN) {
                info!(
                    child = %ws.resource(then_child).id,
                    "inhibiting instance with no interleave partner"
                );
                ws.ban(
                    then_child,
                    None,
                    Score::MinusInf,
                    "no compatible instance for interleaved ordering",
                );
                updated |= UpdatedFlags::THEN;
            }
            continue;
        };

        let Some(first_action) = instance_action(ws, first_child, first_task, Side::First) else {
            continue;
        };
        let Some(then_action) = instance_action(ws, then_child, then_task, Side::Then) else {
            continue;
        };

        if ws.order_actions(first_action, then_action, flags | OrderingFlags::INTERLEAVE) {
            updated |= UpdatedFlags::FIRST | UpdatedFlags::THEN;
        }
        let child_first_flags = ws.action(first_action).flags;
        updated |= update_recursive_ordering(
            ws,
            first_action,
            then_action,
            node,
            child_first_flags,
            filter,
            flags,
        );
    }
    updated
}

/// The action a paired instance contributes to an interleaved ordering.
///
/// Bundle replicas host a contained resource: its actions stand in for
/// the replica's when stopping (on the `first` side) and for promotion
/// and demotion (on the `then` side).
fn instance_action(ws: &WorkingSet, instance: RscIx, task: Task, side: Side) -> Option<ActionIx> {
    let target = match (side, task) {
        (Side::First, Task::Stop | Task::Stopped)
        | (Side::Then, Task::Promote | Task::Promoted | Task::Demote | Task::Demoted) => {
            ws.resource(instance).contained.unwrap_or(instance)
        }
        _ => instance,
    };
    let found = ws.find_first_action(target, task, None);
    if found.is_none() {
        let rsc = ws.resource(instance);
        if !rsc.is(ResourceFlags::ORPHAN) && !matches!(task, Task::Stop | Task::Demote) {
            error!(
                resource = %rsc.id,
                task = %task,
                "instance has no action to interleave"
            );
        } else {
            debug!(
                resource = %rsc.id,
                task = %task,
                "skipping interleave for missing action"
            );
        }
    }
    found
}

/// Propagate flags for the pair itself, then recurse into the children
/// of the `then` side.
fn update_recursive_ordering(
    ws: &mut WorkingSet,
    first: ActionIx,
    then: ActionIx,
    node: Option<&NodeId>,
    first_flags: ActionFlags,
    filter: ActionFlags,
    flags: OrderingFlags,
) -> UpdatedFlags {
    let mut updated = update_primitive_ordering(ws, first, then, node, first_flags, filter, flags);

    let Some(then_rsc) = ws.action(then).resource else {
        return updated;
    };
    let then_task = ws.action(then).task;
    let children = ws.instances(then_rsc).to_vec();
    for child in children {
        let Some(child_action) = ws.find_first_action(child, then_task, node) else {
            continue;
        };
        if !ws.action(child_action).is(ActionFlags::RUNNABLE) {
            continue;
        }
        let child_updated =
            update_ordering(ws, first, child_action, node, first_flags, filter, flags);
        updated |= child_updated;

        if child_updated.contains(UpdatedFlags::THEN) {
            // The child changed: push the change through its own
            // outgoing edges.
            let edges = ws.action(child_action).ordered_after.clone();
            let child_flags = ws.action(child_action).flags;
            for edge in edges {
                update_primitive_ordering(
                    ws,
                    child_action,
                    edge.then,
                    node,
                    child_flags,
                    filter,
                    edge.flags,
                );
            }
        }
    }
    updated
}

/// Flag propagation between two concrete actions. `first_flags` is
/// masked by `filter` before any test.
pub fn update_primitive_ordering(
    ws: &mut WorkingSet,
    first: ActionIx,
    then: ActionIx,
    _node: Option<&NodeId>,
    first_flags: ActionFlags,
    filter: ActionFlags,
    flags: OrderingFlags,
) -> UpdatedFlags {
    let mut updated = UpdatedFlags::empty();
    let masked = first_flags & filter;

    if flags.contains(OrderingFlags::IMPLIES_THEN)
        && !masked.contains(ActionFlags::OPTIONAL)
        && ws.action(then).is(ActionFlags::OPTIONAL)
    {
        ws.action_mut(then).flags.remove(ActionFlags::OPTIONAL);
        updated |= UpdatedFlags::THEN;
    }

    if flags.contains(OrderingFlags::RUNNABLE_LEFT)
        && !masked.contains(ActionFlags::RUNNABLE)
        && ws.action(then).is(ActionFlags::RUNNABLE)
    {
        ws.action_mut(then).flags.remove(ActionFlags::RUNNABLE);
        updated |= UpdatedFlags::THEN;
    }

    if flags.contains(OrderingFlags::IMPLIES_FIRST)
        && !ws.action(then).is(ActionFlags::OPTIONAL)
        && ws.action(first).is(ActionFlags::OPTIONAL)
    {
        ws.action_mut(first).flags.remove(ActionFlags::OPTIONAL);
        updated |= UpdatedFlags::FIRST;
    }

    updated
}

/// The effective flags of an action, summarizing over children when its
/// resource is a collective.
pub fn collective_action_flags(
    ws: &mut WorkingSet,
    action: ActionIx,
    node: Option<&NodeId>,
) -> ActionFlags {
    match ws.action(action).resource {
        Some(rsc) if !ws.resource(rsc).children.is_empty() => {
            let children = ws.resource(rsc).children.clone();
            summary_action_flags(ws, action, &children, node)
        }
        _ => ws.action(action).flags,
    }
}

/// Fold the child actions matching a collective action's task into
/// summary flags. A single required child makes the summary (and the
/// action itself) required; no runnable child makes the summary
/// unrunnable, and the action itself too when no node was given.
pub fn summary_action_flags(
    ws: &mut WorkingSet,
    action: ActionIx,
    children: &[RscIx],
    node: Option<&NodeId>,
) -> ActionFlags {
    let task = ws.action(action).task;
    let mut flags = ActionFlags::OPTIONAL | ActionFlags::RUNNABLE | ActionFlags::PSEUDO;
    let mut any_runnable = false;

    for &child in children {
        let Some(child_action) = ws.find_first_action(child, task, node) else {
            continue;
        };
        let child_flags = ws.action(child_action).flags;
        if !child_flags.contains(ActionFlags::OPTIONAL) && flags.contains(ActionFlags::OPTIONAL) {
            flags.remove(ActionFlags::OPTIONAL);
            ws.action_mut(action).flags.remove(ActionFlags::OPTIONAL);
        }
        if child_flags.contains(ActionFlags::RUNNABLE) {
            any_runnable = true;
        }
    }

    if !any_runnable {
        flags.remove(ActionFlags::RUNNABLE);
        if node.is_none() {
            ws.action_mut(action).flags.remove(ActionFlags::RUNNABLE);
        }
    }
    flags
}
