use super::{FilterOutcome, RuleFilter, RunningContext};
use crate::error::FilterError;
use crate::math;
use crate::models::StopLossConfig;
use desk::{TradeAction, TradeInstruction};
use log::warn;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Liquidates the real account position when its unrealized return crosses
/// the stop-loss (or, if enabled, the stop-profit) threshold.
///
/// Whatever the instruction asked for, a triggered stop rewrites it into a
/// SELL of the full position and accepts it without further checks.
pub struct StopLossFilter {
    config: StopLossConfig,
}

impl StopLossFilter {
    pub fn new(config: StopLossConfig) -> Self {
        Self { config }
    }

    fn liquidate(instruction: &mut TradeInstruction, quantity: Decimal, rationale: String) {
        instruction.action = TradeAction::Sell;
        instruction.quantity = quantity;
        instruction.rationale = rationale;
    }
}

/// `pnl * 100` with exactly two decimals.
fn as_percent(pnl: Decimal) -> Result<Decimal, FilterError> {
    let mut percent = math::round_half_up(math::mul(pnl, dec!(100), "pnl percent")?, 2);
    percent.rescale(2);
    Ok(percent)
}

impl RuleFilter for StopLossFilter {
    fn name(&self) -> &str {
        "StopLoss"
    }

    fn check(
        &self,
        instruction: &mut TradeInstruction,
        ctx: &mut RunningContext,
    ) -> Result<FilterOutcome, FilterError> {
        let position = match ctx.account().position(&instruction.symbol) {
            Some(p) if !p.quantity.is_zero() => p,
            _ => return Ok(FilterOutcome::Continue),
        };

        let price = ctx.market_price();
        let move_from_entry = math::sub(price, position.avg_price, "pnl")?;
        let pnl = math::div_half_up(move_from_entry, position.avg_price, 6, "pnl")?;

        if pnl < self.config.stop_loss_threshold {
            let rationale = format!(
                "STOP LOSS TRIGGERED - Forced liquidation at {}% loss",
                as_percent(pnl)?
            );
            warn!(
                "{} {}: {} -> SELL {}",
                instruction.symbol, rationale, instruction.action, position.quantity
            );
            Self::liquidate(instruction, position.quantity, rationale);
            return Ok(FilterOutcome::ForceAccept);
        }

        if self.config.enable_stop_profit && pnl > self.config.stop_profit_threshold {
            let rationale = format!(
                "STOP PROFIT TRIGGERED - Profit taking at {}% gain",
                as_percent(pnl)?
            );
            warn!(
                "{} {}: {} -> SELL {}",
                instruction.symbol, rationale, instruction.action, position.quantity
            );
            Self::liquidate(instruction, position.quantity, rationale);
            return Ok(FilterOutcome::ForceAccept);
        }

        Ok(FilterOutcome::Continue)
    }
}
