use super::{FilterOutcome, RuleFilter, RunningContext};
use crate::error::FilterError;
use crate::math;
use desk::{TradeAction, TradeInstruction};
use log::info;
use rust_decimal::Decimal;

/// Prevents selling more than the running position holds. SELLs beyond the
/// position are clamped to it; SELLs with nothing left to sell are rejected.
pub struct PositionCheckFilter;

impl RuleFilter for PositionCheckFilter {
    fn name(&self) -> &str {
        "PositionCheck"
    }

    fn check(
        &self,
        instruction: &mut TradeInstruction,
        ctx: &mut RunningContext,
    ) -> Result<FilterOutcome, FilterError> {
        if instruction.action != TradeAction::Sell {
            return Ok(FilterOutcome::Continue);
        }

        let available = ctx.running_position(&instruction.symbol);
        if available < instruction.quantity {
            if available <= Decimal::ZERO {
                return Ok(FilterOutcome::Reject(format!(
                    "No {} position to sell (requested {})",
                    instruction.symbol, instruction.quantity
                )));
            }
            info!(
                "Clamping SELL {} from {} to available {}",
                instruction.symbol, instruction.quantity, available
            );
            instruction.quantity = available;
            instruction.annotate(" [Rule: Clamped to available position]");
        }

        let remaining = math::sub(available, instruction.quantity, "remaining position")?;
        ctx.set_running_position(&instruction.symbol, remaining);
        Ok(FilterOutcome::Continue)
    }
}
