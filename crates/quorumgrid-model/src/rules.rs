//! The seam to the external rule evaluator.
//!
//! The core never evaluates time, role, or node-attribute predicates
//! itself. Callers hand rule blocks to an implementation of
//! [`RuleEvaluator`] together with a [`RuleInput`] describing what is
//! being matched. Unset fields are `None`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::score::Score;

/// Everything a rule predicate may match against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleInput {
    /// Evaluation time, epoch seconds.
    pub now: Option<u64>,
    pub node_attrs: Option<BTreeMap<String, String>>,
    pub rsc_standard: Option<String>,
    pub rsc_provider: Option<String>,
    pub rsc_agent: Option<String>,
    pub rsc_params: Option<BTreeMap<String, String>>,
    pub rsc_meta: Option<BTreeMap<String, String>>,
    pub rsc_id: Option<String>,
    pub rsc_id_submatches: Option<Vec<String>>,
    pub op_name: Option<String>,
    pub op_interval_ms: Option<u64>,
}

/// One name/value pair block guarded by a rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleBlock {
    pub id: String,
    pub score: Score,
    pub values: BTreeMap<String, String>,
}

/// Evaluates rule predicates. Implemented outside the core.
pub trait RuleEvaluator {
    /// Whether `block` applies under `input`.
    fn evaluate(&self, block: &RuleBlock, input: &RuleInput) -> bool;
}

/// Sort rule blocks into evaluation order: an explicit first-id match
/// leads, then score descending, then document order (the sort is
/// stable).
pub fn sort_rule_blocks(blocks: &mut [RuleBlock], first_id: Option<&str>) {
    blocks.sort_by(|a, b| {
        let a_first = first_id.is_some_and(|id| a.id == id);
        let b_first = first_id.is_some_and(|id| b.id == id);
        b_first
            .cmp(&a_first)
            .then_with(|| b.score.cmp(&a.score))
    });
}
