//! quorumgrid working-set model.
//!
//! The shared vocabulary of the placement and ordering engines: one
//! scheduling round's snapshot of the cluster, held in flat arenas with
//! typed indices. This crate holds data and graph primitives only; the
//! placement algorithm lives in `quorumgrid-placement` and action
//! orchestration in `quorumgrid-ordering`.
//!
//! # Components
//!
//! - **`score`** — saturating score arithmetic with ±INFINITY sentinels
//! - **`node`** — cluster nodes and per-resource candidate views
//! - **`resource`** — the resource tree (primitive, group, clone, bundle)
//! - **`colocation`** — colocation edges and their influence predicate
//! - **`action`** — actions, flags, and the ordering graph
//! - **`working_set`** — the arena snapshot tying everything together
//! - **`rules`** — the seam to the external rule evaluator

pub mod action;
pub mod colocation;
pub mod error;
pub mod node;
pub mod resource;
pub mod rules;
pub mod score;
pub mod working_set;

pub use action::{
    Action, ActionFlags, OrderingConstraint, OrderingEdge, OrderingFlags, Task, UpdatedFlags,
    action_uuid,
};
pub use colocation::Colocation;
pub use error::{ModelError, ModelResult};
pub use node::{ClusterNode, NodeEntry, NodeId, cmp_candidates, sorted_candidates};
pub use resource::{Resource, ResourceFlags, Role, Variant, meta};
pub use rules::{RuleBlock, RuleEvaluator, RuleInput, sort_rule_blocks};
pub use score::Score;
pub use working_set::{ActionIx, BanRecord, ColocIx, NodeIx, RscIx, WorkingSet};
