//! Collective state summary derived from child actions.

use bitflags::bitflags;

use quorumgrid_model::{ActionFlags, RscIx, Task, Variant, WorkingSet};

bitflags! {
    /// What a collective's instances are collectively up to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InstanceState: u32 {
        const STARTING = 1 << 0;
        const STOPPING = 1 << 1;
        const RESTARTING = 1 << 2;
        const ACTIVE = 1 << 3;
    }
}

/// Fold an instance subtree into `state`.
///
/// A non-optional runnable start marks `STARTING`; a non-optional stop
/// that is runnable or pseudo marks `STOPPING` (pseudo stops arise when
/// the node is being fenced and the stop is implied). An instance doing
/// both at once is `RESTARTING`.
pub fn check_instance_state(ws: &WorkingSet, instance: RscIx, state: &mut InstanceState) {
    if state.contains(InstanceState::all()) {
        return;
    }

    let rsc = ws.resource(instance);
    if rsc.variant != Variant::Primitive {
        for &child in &rsc.children {
            check_instance_state(ws, child, state);
            if state.contains(InstanceState::all()) {
                break;
            }
        }
        return;
    }

    if rsc.is_active() {
        state.insert(InstanceState::ACTIVE);
    }

    let mut starting = false;
    let mut stopping = false;
    for &aix in &rsc.actions {
        let action = ws.action(aix);
        match action.task {
            Task::Start
                if !action.is(ActionFlags::OPTIONAL) && action.is(ActionFlags::RUNNABLE) =>
            {
                starting = true;
            }
            Task::Stop
                if !action.is(ActionFlags::OPTIONAL)
                    && (action.is(ActionFlags::RUNNABLE) || action.is(ActionFlags::PSEUDO)) =>
            {
                stopping = true;
            }
            _ => {}
        }
    }

    if starting {
        state.insert(InstanceState::STARTING);
    }
    if stopping {
        state.insert(InstanceState::STOPPING);
    }
    if starting && stopping {
        state.insert(InstanceState::RESTARTING);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorumgrid_model::{Action, ClusterNode, Resource};

    fn primitive_with_actions(
        start: Option<ActionFlags>,
        stop: Option<ActionFlags>,
        running: bool,
    ) -> (WorkingSet, RscIx) {
        let mut ws = WorkingSet::new();
        ws.add_node(ClusterNode::online("a"));
        let rsc = ws.add_resource(Resource::new("db", Variant::Primitive));
        if running {
            ws.resource_mut(rsc).running_on.insert("a".to_string());
        }
        if let Some(flags) = start {
            let mut action = Action::new(rsc, "db", Task::Start, None);
            action.flags = flags;
            ws.add_action(action);
        }
        if let Some(flags) = stop {
            let mut action = Action::new(rsc, "db", Task::Stop, None);
            action.flags = flags;
            ws.add_action(action);
        }
        (ws, rsc)
    }

    #[test]
    fn runnable_required_start_marks_starting() {
        let (ws, rsc) = primitive_with_actions(Some(ActionFlags::RUNNABLE), None, false);
        let mut state = InstanceState::default();
        check_instance_state(&ws, rsc, &mut state);
        assert_eq!(state, InstanceState::STARTING);
    }

    #[test]
    fn optional_actions_are_ignored() {
        let (ws, rsc) = primitive_with_actions(
            Some(ActionFlags::RUNNABLE | ActionFlags::OPTIONAL),
            Some(ActionFlags::RUNNABLE | ActionFlags::OPTIONAL),
            true,
        );
        let mut state = InstanceState::default();
        check_instance_state(&ws, rsc, &mut state);
        assert_eq!(state, InstanceState::ACTIVE);
    }

    #[test]
    fn pseudo_stop_counts_as_stopping() {
        let (ws, rsc) = primitive_with_actions(None, Some(ActionFlags::PSEUDO), true);
        let mut state = InstanceState::default();
        check_instance_state(&ws, rsc, &mut state);
        assert!(state.contains(InstanceState::STOPPING));
        assert!(!state.contains(InstanceState::RESTARTING));
    }

    #[test]
    fn restarting_iff_starting_and_stopping() {
        let (ws, rsc) = primitive_with_actions(
            Some(ActionFlags::RUNNABLE),
            Some(ActionFlags::RUNNABLE),
            false,
        );
        let mut state = InstanceState::default();
        check_instance_state(&ws, rsc, &mut state);
        assert!(state.contains(InstanceState::STARTING));
        assert!(state.contains(InstanceState::STOPPING));
        assert!(state.contains(InstanceState::RESTARTING));
    }

    #[test]
    fn collectives_fold_over_children() {
        let mut ws = WorkingSet::new();
        ws.add_node(ClusterNode::online("a"));
        let clone = ws.add_resource(Resource::new("web-clone", Variant::Clone));
        let stopper = ws.add_resource(Resource::new("web:0", Variant::Primitive));
        let starter = ws.add_resource(Resource::new("web:1", Variant::Primitive));
        ws.set_parent(stopper, clone);
        ws.set_parent(starter, clone);

        let mut stop = Action::new(stopper, "web:0", Task::Stop, None);
        stop.flags = ActionFlags::RUNNABLE;
        ws.add_action(stop);
        let mut start = Action::new(starter, "web:1", Task::Start, None);
        start.flags = ActionFlags::RUNNABLE;
        ws.add_action(start);

        let mut state = InstanceState::default();
        check_instance_state(&ws, clone, &mut state);
        assert!(state.contains(InstanceState::STARTING));
        assert!(state.contains(InstanceState::STOPPING));
        // Different instances: the collective is not restarting.
        assert!(!state.contains(InstanceState::RESTARTING));
    }
}
