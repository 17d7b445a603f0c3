//! Colocation constraints between resources.

use serde::{Deserialize, Serialize};

use crate::score::Score;
use crate::working_set::RscIx;

/// A directed colocation edge: `dependent` wants to run with `primary`.
///
/// A `PlusInf` score makes the colocation mandatory, `MinusInf` forbids
/// sharing a node, and finite scores are soft preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Colocation {
    pub id: String,
    pub dependent: RscIx,
    pub primary: RscIx,
    pub score: Score,
    /// Whether the dependent may influence the primary's placement even
    /// when the dependent is unmanaged.
    pub influence: bool,
}

impl Colocation {
    pub fn new(id: impl Into<String>, dependent: RscIx, primary: RscIx, score: Score) -> Self {
        Self {
            id: id.into(),
            dependent,
            primary,
            score,
            influence: false,
        }
    }

    pub fn with_influence(mut self, influence: bool) -> Self {
        self.influence = influence;
        self
    }
}
