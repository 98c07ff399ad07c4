use crate::model::{
    account::Account, instruction::TradePlan, market_data::MarketData,
    strategy::StrategyProfile,
};

pub trait AdvisorySource: Send + Sync {
    /// Called once per cycle to obtain the raw trade proposal.
    ///
    /// # Arguments
    ///
    /// * `account` - The virtual account as loaded at cycle start.
    /// * `market` - The latest snapshots for the strategy symbols.
    /// * `strategy` - The strategy being cycled.
    ///
    /// # Returns
    ///
    /// * `TradePlan` - The proposal, not yet risk-checked. Callers substitute
    ///   a HOLD plan when this fails.
    fn propose_plan(
        &self,
        account: &Account,
        market: &MarketData,
        strategy: &StrategyProfile,
    ) -> anyhow::Result<TradePlan>;
}
