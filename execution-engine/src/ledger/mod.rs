//! Settlement of accepted instructions against a virtual account.
//!
//! Both operations validate everything before touching the account: on
//! error the account is exactly as it was.

use crate::error::SettlementError;
use crate::math;
use crate::models::{LedgerEntry, Transaction};
use desk::{Account, Position, StrategyId, TradeAction};
use rust_decimal::Decimal;

/// Effect of one settled trade on an account.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub strategy_id: StrategyId,
    pub currency: String,
    pub action: TradeAction,
    pub symbol: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub fee: Decimal,
    /// Signed change of the cash balance.
    pub cash_delta: Decimal,
    /// Signed change of the position cost basis, fees excluded.
    pub cost_delta: Decimal,
    /// `revenue - quantity * avg_price` on a SELL, zero on a BUY.
    pub realized_pnl: Decimal,
}

impl Settlement {
    /// Double-entry view of the settlement. Zero legs are omitted.
    pub fn to_transaction(&self) -> Transaction {
        let id = self.strategy_id.as_str();
        let legs = [
            (format!("Assets:{}:Cash", id), self.cash_delta),
            (
                format!("Assets:{}:Positions:{}", id, self.symbol),
                self.cost_delta,
            ),
            (format!("Expenses:{}:Fees", id), self.fee),
            (format!("Income:{}:RealizedPnl", id), -self.realized_pnl),
        ];
        let entries = legs
            .into_iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(account, amount)| LedgerEntry::new(account, amount, self.currency.clone()))
            .collect();

        Transaction::new(
            format!(
                "{} {} {} @ {}",
                self.action, self.quantity, self.symbol, self.price
            ),
            entries,
        )
    }
}

pub struct Ledger;

impl Ledger {
    /// Debits `quantity * price + fee` and folds cost and fee into the
    /// position's average price (8 dp, half-up).
    pub fn buy(
        account: &mut Account,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
        fee: Decimal,
    ) -> Result<Settlement, SettlementError> {
        if quantity <= Decimal::ZERO {
            return Err(SettlementError::NonPositiveQuantity(quantity));
        }

        let cost = math::mul(quantity, price, "trade cost")?;
        let total = math::add(cost, fee, "trade cost")?;
        if account.balance() < total {
            return Err(SettlementError::InsufficientBalance {
                required: total,
                available: account.balance(),
            });
        }

        let (held, avg_price) = account
            .position(symbol)
            .map(|p| (p.quantity, p.avg_price))
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));
        let held_cost = math::mul(held, avg_price, "cost basis")?;
        let new_quantity = math::add(held, quantity, "position quantity")?;
        let new_cost = math::add(held_cost, total, "cost basis")?;
        let new_avg = math::div_half_up(new_cost, new_quantity, 8, "average price")?;

        account.withdraw(total);
        account
            .positions_mut()
            .insert(symbol.to_string(), Position::new(symbol, new_quantity, new_avg));

        Ok(Settlement {
            strategy_id: account.strategy_id().clone(),
            currency: account.currency().to_string(),
            action: TradeAction::Buy,
            symbol: symbol.to_string(),
            quantity,
            price,
            fee,
            cash_delta: -total,
            cost_delta: cost,
            realized_pnl: Decimal::ZERO,
        })
    }

    /// Credits `quantity * price - fee` and reduces the position, removing
    /// it once it reaches exactly zero. The average price is unchanged.
    pub fn sell(
        account: &mut Account,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
        fee: Decimal,
    ) -> Result<Settlement, SettlementError> {
        if quantity <= Decimal::ZERO {
            return Err(SettlementError::NonPositiveQuantity(quantity));
        }

        let (held, avg_price) = match account.position(symbol) {
            Some(p) if p.quantity >= quantity => (p.quantity, p.avg_price),
            other => {
                return Err(SettlementError::InsufficientPosition {
                    symbol: symbol.to_string(),
                    requested: quantity,
                    held: other.map(|p| p.quantity).unwrap_or(Decimal::ZERO),
                })
            }
        };

        let revenue = math::mul(quantity, price, "sale revenue")?;
        let proceeds = math::sub(revenue, fee, "sale proceeds")?;
        let released_cost = math::mul(quantity, avg_price, "released cost")?;
        let realized_pnl = math::sub(revenue, released_cost, "realized pnl")?;
        let remaining = math::sub(held, quantity, "position quantity")?;

        account.deposit(proceeds);
        if remaining.is_zero() {
            account.positions_mut().remove(symbol);
        } else if let Some(position) = account.positions_mut().get_mut(symbol) {
            position.quantity = remaining;
        }

        Ok(Settlement {
            strategy_id: account.strategy_id().clone(),
            currency: account.currency().to_string(),
            action: TradeAction::Sell,
            symbol: symbol.to_string(),
            quantity,
            price,
            fee,
            cash_delta: proceeds,
            cost_delta: -released_cost,
            realized_pnl,
        })
    }
}
