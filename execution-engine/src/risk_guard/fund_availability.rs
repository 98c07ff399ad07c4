use super::{FilterOutcome, RuleFilter, RunningContext};
use crate::error::FilterError;
use crate::math;
use crate::models::FundsConfig;
use desk::{TradeAction, TradeInstruction};
use log::info;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Makes sure a BUY is payable from the running balance at a price padded
/// for slippage, keeping a buffer for fees.
///
/// A short running position (negative quantity) is a reduction: buying it
/// back is allowed up to twice its size plus what the balance affords.
pub struct FundAvailabilityFilter {
    config: FundsConfig,
}

impl FundAvailabilityFilter {
    pub fn new(config: FundsConfig) -> Self {
        Self { config }
    }

    fn effective_price(&self, price: Decimal) -> Result<Decimal, FilterError> {
        let slippage = math::div_half_up(self.config.slippage_bps, dec!(10000), 6, "slippage")?;
        Ok(math::mul(price, Decimal::ONE + slippage, "effective price")?)
    }
}

impl RuleFilter for FundAvailabilityFilter {
    fn name(&self) -> &str {
        "FundAvailability"
    }

    fn check(
        &self,
        instruction: &mut TradeInstruction,
        ctx: &mut RunningContext,
    ) -> Result<FilterOutcome, FilterError> {
        if instruction.action != TradeAction::Buy {
            return Ok(FilterOutcome::Continue);
        }

        let price = ctx.market_price();
        if price <= Decimal::ZERO {
            return Err(FilterError::InvalidInput(format!("market price {}", price)));
        }
        let effective_price = self.effective_price(price)?;
        let balance = ctx.running_balance();
        let current = ctx.running_position(&instruction.symbol);

        let spendable = math::mul(balance, self.config.fee_buffer, "spendable balance")?;
        let affordable = math::div_down(spendable, effective_price, 8, "affordable quantity")?;
        let max_qty = if current < Decimal::ZERO {
            let cover = math::mul(current.abs(), dec!(2), "short cover")?;
            math::add(cover, affordable, "short cover")?
        } else {
            affordable
        };

        let required = math::mul(instruction.quantity, effective_price, "required funds")?;
        if balance < required || instruction.quantity > max_qty {
            if max_qty <= Decimal::ZERO {
                return Ok(FilterOutcome::Reject(format!(
                    "Insufficient funds: balance {} cannot cover {} {} at {}",
                    balance, instruction.quantity, instruction.symbol, effective_price
                )));
            }
            info!(
                "Clamping BUY {} from {} to {} (balance {}, effective price {})",
                instruction.symbol, instruction.quantity, max_qty, balance, effective_price
            );
            instruction.quantity = max_qty;
            instruction.annotate(" [Rule: Clamped due to insufficient funds with slippage buffer]");
        }

        let spent = math::mul(instruction.quantity, effective_price, "spent funds")?;
        let new_balance = math::sub(balance, spent, "running balance")?;
        let new_position = math::add(current, instruction.quantity, "running position")?;
        ctx.set_running_balance(new_balance);
        ctx.set_running_position(&instruction.symbol, new_position);
        Ok(FilterOutcome::Continue)
    }
}
