//! Virtual account model.
//!
//! An [`Account`] holds the available cash balance of one strategy and its
//! open [`Position`]s. It is loaded once per cycle, mutated in place by the
//! settlement ledger and saved back once the cycle ends.

use super::identity::StrategyId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An open holding in one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Signed quantity. Positive is long, negative is short exposure.
    pub quantity: Decimal,
    /// Volume-weighted average entry cost, buy fees included.
    /// Meaningless once `quantity` reaches zero.
    pub avg_price: Decimal,
}

impl Position {
    pub fn new(symbol: impl Into<String>, quantity: Decimal, avg_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            avg_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    strategy_id: StrategyId,
    currency: String,
    balance: Decimal,
    #[serde(default)]
    frozen: Decimal,
    #[serde(default)]
    positions: HashMap<String, Position>,
}

impl Account {
    pub fn new(strategy_id: StrategyId, currency: impl Into<String>, balance: Decimal) -> Self {
        Self {
            strategy_id,
            currency: currency.into(),
            balance,
            frozen: Decimal::ZERO,
            positions: HashMap::new(),
        }
    }

    /// Builder-style helper used when seeding accounts.
    pub fn with_position(mut self, position: Position) -> Self {
        self.positions.insert(position.symbol.clone(), position);
        self
    }

    pub fn strategy_id(&self) -> &StrategyId {
        &self.strategy_id
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn frozen(&self) -> Decimal {
        self.frozen
    }

    pub fn deposit(&mut self, amount: Decimal) {
        self.balance += amount;
    }

    /// Unchecked withdrawal. Callers enforce solvency before withdrawing.
    pub fn withdraw(&mut self, amount: Decimal) {
        self.balance -= amount;
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// Quantity held in `symbol`, zero when there is no position.
    pub fn position_quantity(&self, symbol: &str) -> Decimal {
        self.positions
            .get(symbol)
            .map(|p| p.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn positions(&self) -> &HashMap<String, Position> {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut HashMap<String, Position> {
        &mut self.positions
    }
}
