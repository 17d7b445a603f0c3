//! quorumgrid action orchestration.
//!
//! Turns placement decisions into an ordered action graph: summarize
//! what a collective's instances are doing, build the collective's
//! pseudo-actions, and propagate user-supplied orderings through the
//! graph, pairing interleaved collectives child by child.
//!
//! # Components
//!
//! - **`state`** — collective state summary over child actions
//! - **`pseudo`** — start/started/stop/stopped pseudo-action builder
//! - **`compat`** — child-compatibility search for interleaving
//! - **`update`** — ordering propagation and summary action flags

pub mod compat;
pub mod pseudo;
pub mod state;
pub mod update;

pub use compat::{find_compatible_child, find_compatible_child_on, instance_location};
pub use pseudo::{CollectiveActions, NotifyPair, create_collective_actions};
pub use state::{InstanceState, check_instance_state};
pub use update::{
    apply_orderings, collective_action_flags, summary_action_flags, update_ordering,
    update_primitive_ordering,
};
