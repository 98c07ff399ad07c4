use crate::model::{account::Account, identity::StrategyId, snapshot::TradingCycle};

/// Persistence of virtual accounts.
///
/// Callers guarantee at most one in-flight settlement per account, so
/// implementations only need to make a single `save` atomic.
pub trait AccountStore: Send + Sync {
    /// Loads the account of `strategy_id`, denominated in `currency`.
    fn load(&self, strategy_id: &StrategyId, currency: &str) -> anyhow::Result<Account>;

    /// Persists the account after settlement.
    fn save(&self, account: &Account) -> anyhow::Result<()>;
}

/// Audit trail of completed cycles.
///
/// Failing to audit never fails the cycle; callers log the error and move on.
pub trait CycleStore: Send + Sync {
    fn save(&self, cycle: &TradingCycle) -> anyhow::Result<()>;
}
