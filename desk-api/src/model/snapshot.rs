//! Audit records written at the end of a trading cycle.

use super::account::Account;
use super::decision::Decision;
use super::execution::TradeExecution;
use super::identity::StrategyId;
use super::market_data::{MarketData, MarketSnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    /// `(mark - entry) * quantity`, marked at the symbol's quote (or the
    /// primary quote when the symbol has none).
    pub unrealized_pnl: Decimal,
}

/// State of an account after settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub total_balance: Decimal,
    pub available_balance: Decimal,
    pub positions: Vec<PositionSnapshot>,
    /// Unix millis.
    pub timestamp: i64,
}

impl PortfolioSnapshot {
    pub fn capture(account: &Account, market: &MarketData) -> Self {
        let mut positions: Vec<PositionSnapshot> = account
            .positions()
            .values()
            .map(|p| {
                let mark = market.price_for(&p.symbol);
                PositionSnapshot {
                    symbol: p.symbol.clone(),
                    quantity: p.quantity,
                    entry_price: p.avg_price,
                    unrealized_pnl: (mark - p.avg_price) * p.quantity,
                }
            })
            .collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        Self {
            total_balance: account.balance() + account.frozen(),
            available_balance: account.balance(),
            positions,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        self.positions.iter().map(|p| p.unrealized_pnl).sum()
    }
}

/// Full audit record of one cycle: what the market looked like, what was
/// decided, what settled, and the resulting portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingCycle {
    pub cycle_id: Uuid,
    pub strategy_id: StrategyId,
    pub market_snapshot: MarketSnapshot,
    pub decision: Decision,
    pub executions: Vec<TradeExecution>,
    pub portfolio_snapshot: PortfolioSnapshot,
    /// Unix millis.
    pub started_at: i64,
    pub finished_at: i64,
}
