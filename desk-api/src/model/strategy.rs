use super::identity::StrategyId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_currency() -> String {
    "USDT".to_string()
}

/// Static description of a strategy handed to the advisory source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyProfile {
    id: StrategyId,
    #[serde(default)]
    name: String,
    /// Symbols the strategy trades. The first one is the primary symbol.
    symbols: Vec<String>,
    #[serde(default = "default_currency")]
    currency: String,
    /// Balance a brand new virtual account starts with.
    #[serde(default)]
    initial_capital: Decimal,
    /// Free-form guidance forwarded to the advisory source.
    #[serde(default)]
    prompt: String,
}

impl StrategyProfile {
    pub fn new(id: StrategyId, symbols: Vec<String>, initial_capital: Decimal) -> Self {
        Self {
            name: id.to_string(),
            id,
            symbols,
            currency: default_currency(),
            initial_capital,
            prompt: String::new(),
        }
    }

    pub fn id(&self) -> &StrategyId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn primary_symbol(&self) -> Option<&str> {
        self.symbols.first().map(String::as_str)
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn initial_capital(&self) -> Decimal {
        self.initial_capital
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}
