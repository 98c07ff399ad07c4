//! Market Data models.
//!
//! Includes `MarketSnapshot` for a single symbol and `MarketData`, the set of
//! snapshots a cycle is evaluated against.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Latest quote of one symbol, with an optional indicator payload the
/// pipeline never interprets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    /// Last traded price. Always positive.
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<serde_json::Value>,
    /// Unix millis.
    pub timestamp: i64,
}

impl MarketSnapshot {
    pub fn new(symbol: impl Into<String>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            indicators: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_indicators(mut self, indicators: serde_json::Value) -> Self {
        self.indicators = Some(indicators);
        self
    }
}

/// Snapshots for every symbol of a strategy, one of which is the primary.
///
/// Rule filters price every instruction at the primary snapshot. Settlement
/// uses the instruction symbol's own snapshot and falls back to the primary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketData {
    primary: MarketSnapshot,
    #[serde(default)]
    others: HashMap<String, MarketSnapshot>,
}

impl MarketData {
    pub fn new(primary: MarketSnapshot) -> Self {
        Self {
            primary,
            others: HashMap::new(),
        }
    }

    pub fn with(mut self, snapshot: MarketSnapshot) -> Self {
        self.insert(snapshot);
        self
    }

    /// Adds or replaces a snapshot. A snapshot for the primary symbol
    /// replaces the primary.
    pub fn insert(&mut self, snapshot: MarketSnapshot) {
        if snapshot.symbol == self.primary.symbol {
            self.primary = snapshot;
        } else {
            self.others.insert(snapshot.symbol.clone(), snapshot);
        }
    }

    pub fn primary(&self) -> &MarketSnapshot {
        &self.primary
    }

    pub fn get(&self, symbol: &str) -> Option<&MarketSnapshot> {
        if symbol == self.primary.symbol {
            Some(&self.primary)
        } else {
            self.others.get(symbol)
        }
    }

    /// Price of `symbol`, or the primary price when the symbol has no quote.
    pub fn price_for(&self, symbol: &str) -> Decimal {
        self.get(symbol)
            .map(|s| s.price)
            .unwrap_or(self.primary.price)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MarketSnapshot> {
        std::iter::once(&self.primary).chain(self.others.values())
    }
}
