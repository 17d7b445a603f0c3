//! Actions and the ordering graph.
//!
//! An action is one step of the transition the scheduler is planning:
//! start this primitive here, stop that one there, or one of the pseudo
//! steps that only exist to order other actions. Actions are linked by
//! ordering edges carried on the `first` action's adjacency list.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::node::NodeId;
use crate::score::Score;
use crate::working_set::{ActionIx, RscIx};

/// The verb an action performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Monitor,
    Start,
    Started,
    Stop,
    Stopped,
    Promote,
    Promoted,
    Demote,
    Demoted,
    Notify,
    Notified,
    Shutdown,
    Fence,
}

impl Task {
    pub fn as_str(self) -> &'static str {
        match self {
            Task::Monitor => "monitor",
            Task::Start => "start",
            Task::Started => "started",
            Task::Stop => "stop",
            Task::Stopped => "stopped",
            Task::Promote => "promote",
            Task::Promoted => "promoted",
            Task::Demote => "demote",
            Task::Demoted => "demoted",
            Task::Notify => "notify",
            Task::Notified => "notified",
            Task::Shutdown => "shutdown",
            Task::Fence => "fence",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Per-action flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ActionFlags: u32 {
        /// May be skipped without breaking the transition.
        const OPTIONAL = 1 << 0;
        const RUNNABLE = 1 << 1;
        /// Exists only in the graph; never executes on a node.
        const PSEUDO = 1 << 2;
        /// A pure stop with no start behind it, permitting migration
        /// shortcuts.
        const MIGRATE_RUNNABLE = 1 << 3;
    }
}

bitflags! {
    /// Flags on an ordering between two actions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct OrderingFlags: u32 {
        const OPTIONAL = 1 << 0;
        /// An unrunnable `first` makes `then` unrunnable.
        const RUNNABLE_LEFT = 1 << 1;
        /// A required `first` makes `then` required.
        const IMPLIES_THEN = 1 << 2;
        /// A required `then` makes `first` required.
        const IMPLIES_FIRST = 1 << 3;
        /// Edge produced by interleaved child pairing.
        const INTERLEAVE = 1 << 4;
    }
}

bitflags! {
    /// Which side of an ordering a propagation step changed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct UpdatedFlags: u32 {
        const FIRST = 1 << 0;
        const THEN = 1 << 1;
    }
}

/// The uuid under which an action is registered, e.g. `db_start_0`.
pub fn action_uuid(rsc_id: &str, task: Task) -> String {
    format!("{rsc_id}_{task}_0")
}

/// An ordering edge from the owning action to `then`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingEdge {
    pub then: ActionIx,
    pub flags: OrderingFlags,
}

/// One step of the transition being planned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub uuid: String,
    pub resource: Option<RscIx>,
    pub task: Task,
    pub node: Option<NodeId>,
    pub flags: ActionFlags,
    pub priority: Score,
    /// Ordering edges from this action to later ones.
    pub ordered_after: Vec<OrderingEdge>,
}

impl Action {
    /// A concrete action for a resource, runnable by default.
    pub fn new(resource: RscIx, rsc_id: &str, task: Task, node: Option<NodeId>) -> Self {
        Self {
            uuid: action_uuid(rsc_id, task),
            resource: Some(resource),
            task,
            node,
            flags: ActionFlags::RUNNABLE,
            priority: Score::ZERO,
            ordered_after: Vec::new(),
        }
    }

    /// A pseudo-action: graph-only, runnable, never executed on a node.
    pub fn pseudo(resource: RscIx, rsc_id: &str, task: Task) -> Self {
        let mut action = Self::new(resource, rsc_id, task, None);
        action.flags = ActionFlags::PSEUDO | ActionFlags::RUNNABLE;
        action
    }

    pub fn is(&self, flags: ActionFlags) -> bool {
        self.flags.contains(flags)
    }
}

/// A user-supplied ordering between two actions, before propagation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingConstraint {
    pub first: ActionIx,
    pub then: ActionIx,
    pub node: Option<NodeId>,
    pub flags: OrderingFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_format() {
        assert_eq!(action_uuid("db", Task::Start), "db_start_0");
        assert_eq!(action_uuid("web-clone", Task::Stopped), "web-clone_stopped_0");
    }

    #[test]
    fn pseudo_actions_are_runnable() {
        let action = Action::pseudo(RscIx(0), "web-clone", Task::Started);
        assert!(action.is(ActionFlags::PSEUDO));
        assert!(action.is(ActionFlags::RUNNABLE));
        assert!(!action.is(ActionFlags::OPTIONAL));
    }
}
