//! Cluster nodes and per-resource candidate views.
//!
//! A [`ClusterNode`] is the global membership record. Each resource keeps
//! its own [`NodeEntry`] view of a node with a private weight and instance
//! count; the outermost ancestor's view (the "top-allowed" entry) is what
//! enforces per-host caps across all instances of a collective.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::score::Score;
use crate::working_set::NodeIx;

/// Unique identifier for a node in the cluster.
pub type NodeId = String;

/// A cluster member as the working set sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterNode {
    pub id: NodeId,
    pub online: bool,
    pub standby: bool,
    pub maintenance: bool,
    pub unclean: bool,
    pub shutdown: bool,
}

impl ClusterNode {
    /// A healthy online member with no special states.
    pub fn online(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            online: true,
            standby: false,
            maintenance: false,
            unclean: false,
            shutdown: false,
        }
    }

    /// Whether this node can receive instances.
    ///
    /// Standby nodes qualify only when `allow_standby` is set, and never
    /// under `strict`.
    pub fn available(&self, strict: bool, allow_standby: bool) -> bool {
        if !self.online || self.unclean || self.shutdown || self.maintenance {
            return false;
        }
        if self.standby && (strict || !allow_standby) {
            return false;
        }
        true
    }
}

/// A resource's private view of a candidate node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    /// The global node this entry refers to.
    pub node: NodeIx,
    /// Placement preference for this resource on this node.
    pub weight: Score,
    /// Instances placed here during the current pass.
    pub count: u32,
}

impl NodeEntry {
    pub fn new(node: NodeIx, weight: Score) -> Self {
        Self {
            node,
            weight,
            count: 0,
        }
    }
}

/// Standard candidate order: weight descending, then node id ascending.
///
/// Every tie-break in the core goes through this comparator so that
/// re-running a round on the same input picks the same nodes.
pub fn cmp_candidates(a: (&NodeId, &NodeEntry), b: (&NodeId, &NodeEntry)) -> Ordering {
    b.1.weight.cmp(&a.1.weight).then_with(|| a.0.cmp(b.0))
}

/// The candidates of an allowed-node table in standard order.
pub fn sorted_candidates(allowed: &BTreeMap<NodeId, NodeEntry>) -> Vec<(&NodeId, &NodeEntry)> {
    let mut candidates: Vec<_> = allowed.iter().collect();
    candidates.sort_by(|a, b| cmp_candidates(*a, *b));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_gates() {
        let mut node = ClusterNode::online("a");
        assert!(node.available(false, false));
        assert!(node.available(true, false));

        node.standby = true;
        assert!(!node.available(false, false));
        assert!(node.available(false, true));
        assert!(!node.available(true, true));

        node.standby = false;
        node.unclean = true;
        assert!(!node.available(false, true));
    }

    #[test]
    fn candidate_order_is_weight_then_id() {
        let mut allowed = BTreeMap::new();
        allowed.insert("b".to_string(), NodeEntry::new(NodeIx(1), Score::Finite(5)));
        allowed.insert("a".to_string(), NodeEntry::new(NodeIx(0), Score::Finite(5)));
        allowed.insert("c".to_string(), NodeEntry::new(NodeIx(2), Score::Finite(9)));

        let order: Vec<&str> = sorted_candidates(&allowed)
            .into_iter()
            .map(|(id, _)| id.as_str())
            .collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }
}
