use super::{FilterOutcome, RuleFilter, RunningContext};
use crate::error::FilterError;
use crate::math;
use crate::models::LeverageConfig;
use desk::{TradeAction, TradeInstruction};
use log::info;
use rust_decimal::Decimal;

/// Caps projected exposure at `max_leverage` times the real account balance.
///
/// Every running position is valued at the primary price, so a plan mixing
/// symbols is only approximated.
pub struct LeverageFilter {
    config: LeverageConfig,
}

impl LeverageFilter {
    pub fn new(config: LeverageConfig) -> Self {
        Self { config }
    }
}

impl RuleFilter for LeverageFilter {
    fn name(&self) -> &str {
        "Leverage"
    }

    fn check(
        &self,
        instruction: &mut TradeInstruction,
        ctx: &mut RunningContext,
    ) -> Result<FilterOutcome, FilterError> {
        if instruction.action != TradeAction::Buy {
            return Ok(FilterOutcome::Continue);
        }

        let equity = ctx.account().balance();
        if equity <= Decimal::ZERO {
            return Ok(FilterOutcome::Reject(format!(
                "Account equity {} is not positive",
                equity
            )));
        }

        let price = ctx.market_price();
        let mut current_exposure = Decimal::ZERO;
        for (_, qty) in ctx.running_positions() {
            let value = math::mul(qty, price, "position value")?;
            current_exposure = math::add(current_exposure, value, "position value")?;
        }

        let order_value = math::mul(instruction.quantity, price, "order value")?;
        let projected = math::add(current_exposure, order_value, "projected exposure")?;
        let leverage = math::div_half_up(projected, equity, 4, "leverage")?;

        if leverage > self.config.max_leverage {
            let max_exposure = math::mul(equity, self.config.max_leverage, "max exposure")?;
            let headroom = math::sub(max_exposure, current_exposure, "leverage headroom")?;
            if headroom <= Decimal::ZERO {
                return Ok(FilterOutcome::Reject(format!(
                    "Leverage {} exceeds {} with no headroom left",
                    leverage, self.config.max_leverage
                )));
            }

            let max_qty = math::div_down(headroom, price, 8, "leverage clamp")?;
            info!(
                "Clamping BUY {} from {} to {} (leverage {} > {})",
                instruction.symbol, instruction.quantity, max_qty, leverage, self.config.max_leverage
            );
            instruction.quantity = max_qty;
            instruction.annotate(" [Rule: Clamped due to leverage limit]");
        }

        Ok(FilterOutcome::Continue)
    }
}
