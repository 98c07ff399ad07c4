use crate::error::ArithmeticError;
use desk::TradeInstruction;
use rust_decimal::Decimal;

pub mod paper;

/// Price and fee an accepted instruction settles at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub price: Decimal,
    pub fee: Decimal,
}

/// Interface for pricing fills against a market (real or paper).
pub trait Exchange: Send + Sync {
    /// Quotes the fill of `instruction` given the current `market_price`.
    fn quote_fill(
        &self,
        instruction: &TradeInstruction,
        market_price: Decimal,
    ) -> Result<Fill, ArithmeticError>;
}
