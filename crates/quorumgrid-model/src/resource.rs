//! The resource tree: primitives, groups, clones, and bundles.

use std::collections::{BTreeMap, BTreeSet};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::node::{NodeEntry, NodeId};
use crate::working_set::{ActionIx, ColocIx, RscIx};

bitflags! {
    /// Per-resource scheduling flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ResourceFlags: u32 {
        /// Present in status but no longer configured.
        const ORPHAN = 1 << 0;
        /// Placement not yet decided this round. Clearing this is the
        /// only way to mark a resource placed.
        const PROVISIONAL = 1 << 1;
        /// Placement in progress. Encountering it again means a
        /// dependency cycle.
        const ALLOCATING = 1 << 2;
        const MANAGED = 1 << 3;
        const FAILED = 1 << 4;
        /// Blocked from further activation.
        const BLOCKED = 1 << 5;
    }
}

/// What kind of resource a tree node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Primitive,
    Group,
    Clone,
    Bundle,
}

impl Variant {
    /// Clones and bundles run as multiple interchangeable instances.
    pub fn is_collective(self) -> bool {
        matches!(self, Variant::Clone | Variant::Bundle)
    }
}

/// Resource role, current or targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Unknown,
    Stopped,
    Started,
    Unpromoted,
    Promoted,
}

/// Meta-attribute keys understood by the core.
pub mod meta {
    pub const INTERLEAVE: &str = "interleave";
    pub const CLONE_MAX: &str = "clone-max";
    pub const CLONE_NODE_MAX: &str = "clone-node-max";
}

/// One node of the resource tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub variant: Variant,
    pub flags: ResourceFlags,
    /// Candidate nodes, keyed by node id so iteration is always sorted.
    pub allowed: BTreeMap<NodeId, NodeEntry>,
    pub parent: Option<RscIx>,
    pub children: Vec<RscIx>,
    /// Outgoing colocations ("this with other").
    pub colocations: Vec<ColocIx>,
    /// Incoming colocations ("other with this").
    pub colocations_in: Vec<ColocIx>,
    /// Nodes where the resource is currently active.
    pub running_on: BTreeSet<NodeId>,
    /// Node chosen by this round's placement, if any.
    pub assigned_to: Option<NodeId>,
    pub role: Role,
    pub next_role: Role,
    pub meta: BTreeMap<String, String>,
    /// For bundle replicas, the resource hosted inside the container.
    pub contained: Option<RscIx>,
    /// Actions created for this resource, in creation order.
    pub actions: Vec<ActionIx>,
}

impl Resource {
    pub fn new(id: impl Into<String>, variant: Variant) -> Self {
        Self {
            id: id.into(),
            variant,
            flags: Self::default_flags(),
            allowed: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
            colocations: Vec::new(),
            colocations_in: Vec::new(),
            running_on: BTreeSet::new(),
            assigned_to: None,
            role: Role::Unknown,
            next_role: Role::Unknown,
            meta: BTreeMap::new(),
            contained: None,
            actions: Vec::new(),
        }
    }

    fn default_flags() -> ResourceFlags {
        ResourceFlags::PROVISIONAL | ResourceFlags::MANAGED
    }

    pub fn is(&self, flags: ResourceFlags) -> bool {
        self.flags.contains(flags)
    }

    /// Active anywhere in the current cluster state.
    pub fn is_active(&self) -> bool {
        !self.running_on.is_empty()
    }

    /// Current node; lexicographically first when active on several.
    pub fn current_node(&self) -> Option<&NodeId> {
        self.running_on.iter().next()
    }

    /// A meta attribute read as a boolean. Absent keys are false.
    pub fn meta_bool(&self, key: &str) -> bool {
        matches!(
            self.meta.get(key).map(String::as_str),
            Some("true" | "yes" | "on" | "1")
        )
    }

    pub fn meta_u32(&self, key: &str) -> Option<u32> {
        self.meta.get(key)?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_resource_is_provisional_and_managed() {
        let rsc = Resource::new("db", Variant::Primitive);
        assert!(rsc.is(ResourceFlags::PROVISIONAL));
        assert!(rsc.is(ResourceFlags::MANAGED));
        assert!(!rsc.is(ResourceFlags::FAILED));
    }

    #[test]
    fn meta_bool_spellings() {
        let mut rsc = Resource::new("c", Variant::Clone);
        assert!(!rsc.meta_bool(meta::INTERLEAVE));
        rsc.meta
            .insert(meta::INTERLEAVE.to_string(), "true".to_string());
        assert!(rsc.meta_bool(meta::INTERLEAVE));
        rsc.meta
            .insert(meta::INTERLEAVE.to_string(), "false".to_string());
        assert!(!rsc.meta_bool(meta::INTERLEAVE));
    }

    #[test]
    fn current_node_is_sorted_first() {
        let mut rsc = Resource::new("db", Variant::Primitive);
        rsc.running_on.insert("b".to_string());
        rsc.running_on.insert("a".to_string());
        assert_eq!(rsc.current_node().map(String::as_str), Some("a"));
    }
}
