//! Pseudo-actions for collectives.
//!
//! A collective's own start/stop never runs on a node; it exists to
//! anchor ordering between the collective and the rest of the graph.
//! The builder derives the flags from the summarized child state.

use tracing::debug;

use quorumgrid_model::{
    Action, ActionFlags, ActionIx, OrderingFlags, RscIx, Score, Task, WorkingSet,
};

use crate::state::{InstanceState, check_instance_state};

/// Pre/post notification hooks around one collective verb.
#[derive(Debug, Clone, Copy)]
pub struct NotifyPair {
    pub pre: ActionIx,
    pub pre_done: ActionIx,
    pub post: ActionIx,
    pub post_done: ActionIx,
}

/// The pseudo-actions created for one collective.
#[derive(Debug, Clone, Copy)]
pub struct CollectiveActions {
    pub start: ActionIx,
    pub started: ActionIx,
    pub stop: ActionIx,
    pub stopped: ActionIx,
    pub start_notify: Option<NotifyPair>,
    pub stop_notify: Option<NotifyPair>,
}

/// Create the start/started/stop/stopped pseudo-actions for a
/// collective, plus notification hooks when requested.
pub fn create_collective_actions(
    ws: &mut WorkingSet,
    collective: RscIx,
    with_notify: bool,
) -> CollectiveActions {
    let mut state = InstanceState::default();
    check_instance_state(ws, collective, &mut state);

    let starting = state.contains(InstanceState::STARTING);
    let stopping = state.contains(InstanceState::STOPPING);
    let restarting = state.contains(InstanceState::RESTARTING);
    let active = state.contains(InstanceState::ACTIVE);
    let id = ws.resource(collective).id.clone();

    debug!(
        collective = %id,
        starting,
        stopping,
        restarting,
        active,
        "building collective pseudo-actions"
    );

    let mut start = Action::pseudo(collective, &id, Task::Start);
    if !starting {
        start.flags.insert(ActionFlags::OPTIONAL);
    }

    let mut started = Action::pseudo(collective, &id, Task::Started);
    started.flags.remove(ActionFlags::RUNNABLE);
    if !starting {
        started.flags.insert(ActionFlags::OPTIONAL);
    }
    if active || starting {
        started.flags.insert(ActionFlags::RUNNABLE);
    }
    started.priority = Score::PlusInf;

    let mut stop = Action::pseudo(collective, &id, Task::Stop);
    if !stopping {
        stop.flags.insert(ActionFlags::OPTIONAL);
    }
    if !restarting {
        // A pure stop with no start behind it can take migration
        // shortcuts.
        stop.flags.insert(ActionFlags::MIGRATE_RUNNABLE);
    }

    let mut stopped = Action::pseudo(collective, &id, Task::Stopped);
    if !stopping {
        stopped.flags.insert(ActionFlags::OPTIONAL);
    }
    stopped.priority = Score::PlusInf;

    let start = ws.add_action(start);
    let started = ws.add_action(started);
    let stop = ws.add_action(stop);
    let stopped = ws.add_action(stopped);

    ws.order_actions(start, started, OrderingFlags::OPTIONAL);
    ws.order_actions(stop, stopped, OrderingFlags::OPTIONAL);

    let (start_notify, stop_notify) = if with_notify {
        let start_pair = notify_pair(ws, collective, Task::Start, start, started, !starting);
        let stop_pair = notify_pair(ws, collective, Task::Stop, stop, stopped, !stopping);
        // Once a stop's post notifications are confirmed, a following
        // start may begin notifying.
        ws.order_actions(stop_pair.post_done, start_pair.pre, OrderingFlags::OPTIONAL);
        (Some(start_pair), Some(stop_pair))
    } else {
        (None, None)
    };

    CollectiveActions {
        start,
        started,
        stop,
        stopped,
        start_notify,
        stop_notify,
    }
}

/// Build the pre/post notification pseudo-actions around one verb and
/// wire them to it.
fn notify_pair(
    ws: &mut WorkingSet,
    collective: RscIx,
    verb: Task,
    action: ActionIx,
    done: ActionIx,
    optional: bool,
) -> NotifyPair {
    let id = ws.resource(collective).id.clone();
    let mut build = |uuid: String, task: Task| {
        let mut notify = Action::pseudo(collective, &id, task);
        notify.uuid = uuid;
        if optional {
            notify.flags.insert(ActionFlags::OPTIONAL);
        }
        notify
    };

    let pre = build(format!("{id}_pre_notify_{verb}_0"), Task::Notify);
    let pre_done = build(format!("{id}_confirmed-pre_notify_{verb}_0"), Task::Notified);
    let post = build(format!("{id}_post_notify_{verb}_0"), Task::Notify);
    let post_done = build(format!("{id}_confirmed-post_notify_{verb}_0"), Task::Notified);

    let pre = ws.add_action(pre);
    let pre_done = ws.add_action(pre_done);
    let post = ws.add_action(post);
    let post_done = ws.add_action(post_done);

    ws.order_actions(pre, pre_done, OrderingFlags::OPTIONAL);
    ws.order_actions(pre_done, action, OrderingFlags::OPTIONAL);
    ws.order_actions(done, post, OrderingFlags::OPTIONAL);
    ws.order_actions(post, post_done, OrderingFlags::OPTIONAL);

    NotifyPair {
        pre,
        pre_done,
        post,
        post_done,
    }
}
