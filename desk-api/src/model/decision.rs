use super::instruction::{TradeInstruction, TradePlan};
use serde::{Deserialize, Serialize};

/// Risk-checked outcome of a [`TradePlan`].
///
/// `instructions` holds only the accepted instructions, as rewritten by the
/// rule chain, in the order they appeared in the plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub rationale: String,
    pub instructions: Vec<TradeInstruction>,
    /// The unfiltered plan, kept for the audit trail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_plan: Option<TradePlan>,
}

impl Decision {
    pub fn is_hold(&self) -> bool {
        self.instructions.is_empty()
    }
}
