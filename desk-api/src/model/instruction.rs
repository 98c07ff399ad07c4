//! Trade instructions and the plans that carry them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single proposed trade.
///
/// Rule filters rewrite `quantity`, `rationale` and (for forced liquidations)
/// `action` in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeInstruction {
    /// Assigned on arrival when the advisory source does not provide one.
    #[serde(default = "Uuid::new_v4")]
    pub instruction_id: Uuid,
    pub action: TradeAction,
    pub symbol: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub rationale: String,
    /// Free-form data from the advisory source (confidence, requested target,
    /// original action, ...).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, serde_json::Value>,
}

impl TradeInstruction {
    pub fn new(
        action: TradeAction,
        symbol: impl Into<String>,
        quantity: Decimal,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            instruction_id: Uuid::new_v4(),
            action,
            symbol: symbol.into(),
            quantity,
            rationale: rationale.into(),
            meta: HashMap::new(),
        }
    }

    pub fn buy(symbol: impl Into<String>, quantity: Decimal) -> Self {
        Self::new(TradeAction::Buy, symbol, quantity, "")
    }

    pub fn sell(symbol: impl Into<String>, quantity: Decimal) -> Self {
        Self::new(TradeAction::Sell, symbol, quantity, "")
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// Appends a rule annotation to the rationale.
    pub fn annotate(&mut self, note: &str) {
        self.rationale.push_str(note);
    }
}

/// Raw proposal from the advisory source, not yet risk-checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub rationale: String,
    #[serde(default)]
    pub instructions: Vec<TradeInstruction>,
}

impl TradePlan {
    pub fn new(rationale: impl Into<String>, instructions: Vec<TradeInstruction>) -> Self {
        Self {
            rationale: rationale.into(),
            instructions,
        }
    }

    /// Plan with no instructions, used when the advisory source fails.
    pub fn hold(reason: impl Into<String>) -> Self {
        Self {
            rationale: reason.into(),
            instructions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_instruction_serialization() {
        let ins = TradeInstruction::new(TradeAction::Buy, "BTC", dec!(0.02), "breakout")
            .with_meta("confidence", serde_json::json!(0.8));
        let json = serde_json::to_string(&ins).unwrap();
        assert!(json.contains("\"action\":\"BUY\""));
        assert!(json.contains("\"quantity\":\"0.02\""));

        let back: TradeInstruction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ins);
    }

    #[test]
    fn test_missing_instruction_id_is_generated() {
        let json = r#"{ "action": "SELL", "symbol": "ETHUSDT", "quantity": "1" }"#;
        let ins: TradeInstruction = serde_json::from_str(json).unwrap();
        assert_eq!(ins.action, TradeAction::Sell);
        assert!(!ins.instruction_id.is_nil());
        assert!(ins.rationale.is_empty());
    }

    #[test]
    fn test_annotate_appends() {
        let mut ins = TradeInstruction::new(TradeAction::Sell, "BTC", dec!(1), "take profit");
        ins.annotate(" [clamped]");
        assert_eq!(ins.rationale, "take profit [clamped]");
    }

    #[test]
    fn test_hold_plan_is_empty() {
        let plan = TradePlan::hold("advisor unreachable");
        assert!(plan.is_empty());
        assert_eq!(plan.rationale, "advisor unreachable");
    }
}
