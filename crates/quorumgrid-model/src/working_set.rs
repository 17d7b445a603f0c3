//! The arena-backed working set: one scheduling round's entire state.
//!
//! Resources, nodes, colocations, and actions reference each other
//! cyclically in this domain, so everything lives in flat arenas and
//! every cross-reference is a typed index. A round owns its working set
//! exclusively; cancellation is dropping it.
//!
//! Indices are only ever minted by the `add_*` methods of the owning
//! working set, so the accessors index directly — handing an index from
//! one working set to another is a caller bug and fails fast.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::{Action, OrderingConstraint, OrderingEdge, OrderingFlags, Task};
use crate::colocation::Colocation;
use crate::error::{ModelError, ModelResult};
use crate::node::{ClusterNode, NodeEntry, NodeId};
use crate::resource::{Resource, ResourceFlags};
use crate::score::Score;

/// Index of a [`ClusterNode`] in its working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIx(pub usize);

/// Index of a [`Resource`] in its working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RscIx(pub usize);

/// Index of an [`Action`] in its working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionIx(pub usize);

/// Index of a [`Colocation`] in its working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColocIx(pub usize);

/// An explicit location record: a score pinned onto a resource's allowed
/// nodes, with the reason it happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanRecord {
    pub resource: RscIx,
    /// `None` means every allowed node.
    pub node: Option<NodeId>,
    pub score: Score,
    pub reason: String,
}

/// A materialized snapshot of the cluster for one scheduling round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkingSet {
    nodes: Vec<ClusterNode>,
    resources: Vec<Resource>,
    colocations: Vec<Colocation>,
    actions: Vec<Action>,
    /// User-supplied orderings, in document order.
    pub orderings: Vec<OrderingConstraint>,
    /// Location records accumulated this round.
    pub bans: Vec<BanRecord>,
    node_lookup: BTreeMap<NodeId, NodeIx>,
    resource_lookup: BTreeMap<String, RscIx>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Arena construction ────────────────────────────────────────────

    pub fn add_node(&mut self, node: ClusterNode) -> NodeIx {
        let ix = NodeIx(self.nodes.len());
        self.node_lookup.insert(node.id.clone(), ix);
        self.nodes.push(node);
        ix
    }

    pub fn add_resource(&mut self, resource: Resource) -> RscIx {
        let ix = RscIx(self.resources.len());
        self.resource_lookup.insert(resource.id.clone(), ix);
        self.resources.push(resource);
        ix
    }

    /// Register a colocation and wire it onto both endpoints.
    pub fn add_colocation(&mut self, colocation: Colocation) -> ColocIx {
        let ix = ColocIx(self.colocations.len());
        self.resources[colocation.dependent.0].colocations.push(ix);
        self.resources[colocation.primary.0].colocations_in.push(ix);
        self.colocations.push(colocation);
        ix
    }

    /// Register an action and wire it onto its resource.
    pub fn add_action(&mut self, action: Action) -> ActionIx {
        let ix = ActionIx(self.actions.len());
        if let Some(rsc) = action.resource {
            self.resources[rsc.0].actions.push(ix);
        }
        self.actions.push(action);
        ix
    }

    pub fn add_ordering(&mut self, ordering: OrderingConstraint) {
        self.orderings.push(ordering);
    }

    /// Make `child` a member of `parent`.
    pub fn set_parent(&mut self, child: RscIx, parent: RscIx) {
        self.resources[child.0].parent = Some(parent);
        self.resources[parent.0].children.push(child);
    }

    /// Add `node` to `resource`'s candidate table with the given weight.
    pub fn allow_node(&mut self, resource: RscIx, node: NodeIx, weight: Score) {
        let id = self.nodes[node.0].id.clone();
        self.resources[resource.0]
            .allowed
            .insert(id, NodeEntry::new(node, weight));
    }

    // ── Accessors ─────────────────────────────────────────────────────

    pub fn node(&self, ix: NodeIx) -> &ClusterNode {
        &self.nodes[ix.0]
    }

    pub fn node_mut(&mut self, ix: NodeIx) -> &mut ClusterNode {
        &mut self.nodes[ix.0]
    }

    pub fn resource(&self, ix: RscIx) -> &Resource {
        &self.resources[ix.0]
    }

    pub fn resource_mut(&mut self, ix: RscIx) -> &mut Resource {
        &mut self.resources[ix.0]
    }

    pub fn colocation(&self, ix: ColocIx) -> &Colocation {
        &self.colocations[ix.0]
    }

    pub fn action(&self, ix: ActionIx) -> &Action {
        &self.actions[ix.0]
    }

    pub fn action_mut(&mut self, ix: ActionIx) -> &mut Action {
        &mut self.actions[ix.0]
    }

    pub fn node_ix(&self, id: &str) -> Option<NodeIx> {
        self.node_lookup.get(id).copied()
    }

    pub fn resource_ix(&self, id: &str) -> Option<RscIx> {
        self.resource_lookup.get(id).copied()
    }

    pub fn require_node(&self, id: &str) -> ModelResult<NodeIx> {
        self.node_ix(id)
            .ok_or_else(|| ModelError::UnknownNode(id.to_string()))
    }

    pub fn require_resource(&self, id: &str) -> ModelResult<RscIx> {
        self.resource_ix(id)
            .ok_or_else(|| ModelError::UnknownResource(id.to_string()))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All actions with their indices, in creation order.
    pub fn actions(&self) -> impl Iterator<Item = (ActionIx, &Action)> {
        self.actions
            .iter()
            .enumerate()
            .map(|(i, action)| (ActionIx(i), action))
    }

    /// The instances of a collective. For bundles these are the replica
    /// containers.
    pub fn instances(&self, collective: RscIx) -> &[RscIx] {
        &self.resources[collective.0].children
    }

    // ── Tree walks ────────────────────────────────────────────────────

    /// The outermost ancestor of `resource` (itself if unparented).
    pub fn top_ancestor(&self, resource: RscIx) -> RscIx {
        let mut current = resource;
        while let Some(parent) = self.resources[current.0].parent {
            current = parent;
        }
        current
    }

    /// The outermost ancestor's view of `node`, which enforces per-host
    /// caps across all instances of a collective.
    pub fn top_allowed(&self, resource: RscIx, node: &str) -> Option<&NodeEntry> {
        let top = self.top_ancestor(resource);
        self.resources[top.0].allowed.get(node)
    }

    pub fn top_allowed_mut(&mut self, resource: RscIx, node: &str) -> Option<&mut NodeEntry> {
        let top = self.top_ancestor(resource);
        self.resources[top.0].allowed.get_mut(node)
    }

    // ── Graph mutation ────────────────────────────────────────────────

    /// Order `first` before `then`. Adding an edge that already exists
    /// merges the flags instead of duplicating it. Returns whether the
    /// graph changed.
    pub fn order_actions(&mut self, first: ActionIx, then: ActionIx, flags: OrderingFlags) -> bool {
        let edges = &mut self.actions[first.0].ordered_after;
        if let Some(edge) = edges.iter_mut().find(|e| e.then == then) {
            let merged = edge.flags | flags;
            if merged == edge.flags {
                return false;
            }
            edge.flags = merged;
            return true;
        }
        edges.push(OrderingEdge { then, flags });
        debug!(
            first = %self.actions[first.0].uuid,
            then = %self.actions[then.0].uuid,
            ?flags,
            "ordered actions"
        );
        true
    }

    /// The first action of `resource` matching `task` (and `node`, when
    /// given), in creation order.
    pub fn find_first_action(
        &self,
        resource: RscIx,
        task: Task,
        node: Option<&NodeId>,
    ) -> Option<ActionIx> {
        self.resources[resource.0]
            .actions
            .iter()
            .copied()
            .find(|&ix| {
                let action = &self.actions[ix.0];
                action.task == task
                    && node.is_none_or(|wanted| action.node.as_ref() == Some(wanted))
            })
    }

    /// Whether a colocation edge has influence on a particular child:
    /// either the edge asks for it explicitly, or the child is managed
    /// and not blocked.
    pub fn colocation_influences(&self, colocation: ColocIx, child: RscIx) -> bool {
        if self.colocations[colocation.0].influence {
            return true;
        }
        let child = &self.resources[child.0];
        child.is(ResourceFlags::MANAGED) && !child.is(ResourceFlags::BLOCKED)
    }

    /// Pin `score` onto a resource's allowed nodes (all of them, or just
    /// `node`) and keep an explicit record of it.
    pub fn ban(&mut self, resource: RscIx, node: Option<&NodeId>, score: Score, reason: &str) {
        {
            let allowed = &mut self.resources[resource.0].allowed;
            match node {
                Some(id) => {
                    if let Some(entry) = allowed.get_mut(id) {
                        entry.weight = score;
                    }
                }
                None => {
                    for entry in allowed.values_mut() {
                        entry.weight = score;
                    }
                }
            }
        }
        debug!(
            resource = %self.resources[resource.0].id,
            node = node.map(String::as_str).unwrap_or("<all>"),
            %score,
            reason,
            "pinned location score"
        );
        self.bans.push(BanRecord {
            resource,
            node: node.cloned(),
            score,
            reason: reason.to_string(),
        });
    }

    /// Undo a placement decision: restore `PROVISIONAL` and drop the
    /// chosen node, recursively for members.
    pub fn unassign(&mut self, resource: RscIx) {
        let children = self.resources[resource.0].children.clone();
        let rsc = &mut self.resources[resource.0];
        rsc.flags.insert(ResourceFlags::PROVISIONAL);
        rsc.assigned_to = None;
        for child in children {
            self.unassign(child);
        }
    }
}
