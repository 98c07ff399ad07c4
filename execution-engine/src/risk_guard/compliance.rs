use super::{FilterOutcome, RuleFilter, RunningContext};
use crate::error::FilterError;
use crate::math;
use crate::models::ComplianceConfig;
use desk::TradeInstruction;
use log::info;
use rust_decimal::Decimal;

/// Enforces venue constraints: order size bounds, lot size and minimum
/// notional. Runs for every action, HOLD included.
pub struct ComplianceFilter {
    config: ComplianceConfig,
}

impl ComplianceFilter {
    pub fn new(config: ComplianceConfig) -> Self {
        Self { config }
    }
}

impl RuleFilter for ComplianceFilter {
    fn name(&self) -> &str {
        "Compliance"
    }

    fn check(
        &self,
        instruction: &mut TradeInstruction,
        ctx: &mut RunningContext,
    ) -> Result<FilterOutcome, FilterError> {
        if instruction.quantity > self.config.max_order_qty {
            return Ok(FilterOutcome::Reject(format!(
                "Quantity {} exceeds max order size {}",
                instruction.quantity, self.config.max_order_qty
            )));
        }

        if self.config.quantity_step > Decimal::ZERO {
            let aligned = math::align_to_step(instruction.quantity, self.config.quantity_step)?;
            if aligned != instruction.quantity {
                info!(
                    "Aligned {} quantity {} -> {} (step {})",
                    instruction.symbol, instruction.quantity, aligned, self.config.quantity_step
                );
                instruction.quantity = aligned;
            }
        }

        if instruction.quantity < self.config.min_trade_qty {
            return Ok(FilterOutcome::Reject(format!(
                "Quantity {} below minimum {}",
                instruction.quantity, self.config.min_trade_qty
            )));
        }

        let notional = math::mul(instruction.quantity, ctx.market_price(), "notional")?;
        if notional < self.config.min_notional {
            return Ok(FilterOutcome::Reject(format!(
                "Notional {} below minimum {}",
                notional, self.config.min_notional
            )));
        }

        Ok(FilterOutcome::Continue)
    }
}
