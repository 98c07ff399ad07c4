use super::instruction::{TradeAction, TradeInstruction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of settling one accepted instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionStatus {
    /// Settled against the virtual account.
    Filled,
    /// Settlement refused (insufficient balance or position).
    Failed,
}

/// Represents the settlement of one instruction against the virtual account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeExecution {
    /// The instruction this execution settles.
    pub instruction_id: Uuid,
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: Decimal,
    /// Settlement price. Zero for failed executions.
    pub price: Decimal,
    /// Fee charged. Zero for failed executions.
    pub fee: Decimal,
    pub status: ExecutionStatus,
    /// Rejection reason when `status` is `Failed`.
    pub error_message: Option<String>,
    /// Timestamp of the settlement (unix millis).
    pub executed_at: i64,
}

impl TradeExecution {
    pub fn filled(instruction: &TradeInstruction, price: Decimal, fee: Decimal) -> Self {
        Self {
            instruction_id: instruction.instruction_id,
            symbol: instruction.symbol.clone(),
            action: instruction.action,
            quantity: instruction.quantity,
            price,
            fee,
            status: ExecutionStatus::Filled,
            error_message: None,
            executed_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn failed(instruction: &TradeInstruction, message: impl Into<String>) -> Self {
        Self {
            instruction_id: instruction.instruction_id,
            symbol: instruction.symbol.clone(),
            action: instruction.action,
            quantity: instruction.quantity,
            price: Decimal::ZERO,
            fee: Decimal::ZERO,
            status: ExecutionStatus::Failed,
            error_message: Some(message.into()),
            executed_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn is_filled(&self) -> bool {
        self.status == ExecutionStatus::Filled
    }
}
