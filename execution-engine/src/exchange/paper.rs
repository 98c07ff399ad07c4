use super::{Exchange, Fill};
use crate::error::ArithmeticError;
use crate::math;
use desk::TradeInstruction;
use rust_decimal::Decimal;

/// Fills at the market price and charges `fee_rate` of the notional.
pub struct PaperExchange {
    fee_rate: Decimal, // e.g. 0.001 for 10 bps
}

impl PaperExchange {
    pub fn new(fee_rate: Decimal) -> Self {
        Self { fee_rate }
    }
}

impl Exchange for PaperExchange {
    fn quote_fill(
        &self,
        instruction: &TradeInstruction,
        market_price: Decimal,
    ) -> Result<Fill, ArithmeticError> {
        let notional = math::mul(instruction.quantity, market_price, "fill notional")?;
        let fee = math::mul(notional, self.fee_rate, "fill fee")?;

        // Perfect fill at market price, no slippage.
        Ok(Fill {
            price: market_price,
            fee,
        })
    }
}
