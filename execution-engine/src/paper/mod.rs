//! In-process collaborators for paper trading and tests.

use crate::models::Quote;
use anyhow::{anyhow, bail, Context, Result};
use desk::{
    Account, AccountStore, AdvisorySource, CycleStore, MarketData, MarketDataSource,
    MarketSnapshot, StrategyId, StrategyProfile, TradePlan, TradingCycle,
};
use log::debug;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, RwLock};

pub mod file_store;

pub use file_store::JsonFileStore;

/// Replays queued plans per strategy. Holds once a queue runs dry.
#[derive(Default)]
pub struct ScriptedAdvisor {
    plans: Mutex<HashMap<StrategyId, VecDeque<TradePlan>>>,
}

impl ScriptedAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a JSON object mapping strategy ids to arrays of plans.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open plan script {}", path.display()))?;
        let script: HashMap<StrategyId, Vec<TradePlan>> =
            serde_json::from_reader(std::io::BufReader::new(file))
                .with_context(|| format!("Failed to parse plan script {}", path.display()))?;

        let plans = script
            .into_iter()
            .map(|(id, plans)| (id, plans.into_iter().collect()))
            .collect();
        Ok(Self {
            plans: Mutex::new(plans),
        })
    }

    pub fn with_plans(self, strategy_id: StrategyId, plans: Vec<TradePlan>) -> Self {
        if let Ok(mut queues) = self.plans.lock() {
            queues.entry(strategy_id).or_default().extend(plans);
        }
        self
    }

    pub fn remaining(&self, strategy_id: &StrategyId) -> usize {
        self.plans
            .lock()
            .map(|queues| queues.get(strategy_id).map_or(0, VecDeque::len))
            .unwrap_or(0)
    }
}

impl AdvisorySource for ScriptedAdvisor {
    fn propose_plan(
        &self,
        _account: &Account,
        _market: &MarketData,
        strategy: &StrategyProfile,
    ) -> Result<TradePlan> {
        let mut queues = self
            .plans
            .lock()
            .map_err(|_| anyhow!("plan queue lock poisoned"))?;
        let plan = queues
            .get_mut(strategy.id())
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| TradePlan::hold("No scripted plan left"));
        Ok(plan)
    }
}

/// Fixed price table.
#[derive(Default)]
pub struct StaticMarketData {
    prices: RwLock<HashMap<String, Decimal>>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_quotes(quotes: &[Quote]) -> Self {
        let prices = quotes
            .iter()
            .map(|q| (q.symbol.clone(), q.price))
            .collect();
        Self {
            prices: RwLock::new(prices),
        }
    }

    pub fn set_price(&self, symbol: &str, price: Decimal) -> Result<()> {
        self.prices
            .write()
            .map_err(|_| anyhow!("price table lock poisoned"))?
            .insert(symbol.to_string(), price);
        Ok(())
    }
}

impl MarketDataSource for StaticMarketData {
    fn latest_prices(&self, symbols: &[String]) -> Result<MarketData> {
        let prices = self
            .prices
            .read()
            .map_err(|_| anyhow!("price table lock poisoned"))?;

        let Some((primary, others)) = symbols.split_first() else {
            bail!("No symbols requested");
        };
        let Some(price) = prices.get(primary) else {
            bail!("No price for primary symbol {}", primary);
        };

        let mut market = MarketData::new(MarketSnapshot::new(primary.clone(), *price));
        for symbol in others {
            match prices.get(symbol) {
                Some(price) => market.insert(MarketSnapshot::new(symbol.clone(), *price)),
                None => debug!("No price for {}, settling it at the primary price", symbol),
            }
        }
        Ok(market)
    }
}

/// Account table behind a `Mutex`. Unknown strategies with a seed get a
/// fresh account holding their initial capital.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<HashMap<StrategyId, Account>>,
    seeds: HashMap<StrategyId, Decimal>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(strategies: &[StrategyProfile]) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            seeds: strategies
                .iter()
                .map(|s| (s.id().clone(), s.initial_capital()))
                .collect(),
        }
    }

    pub fn with_account(self, account: Account) -> Self {
        if let Ok(mut accounts) = self.accounts.lock() {
            accounts.insert(account.strategy_id().clone(), account);
        }
        self
    }

    pub fn get(&self, strategy_id: &StrategyId) -> Option<Account> {
        self.accounts
            .lock()
            .ok()
            .and_then(|accounts| accounts.get(strategy_id).cloned())
    }
}

impl AccountStore for MemoryAccountStore {
    fn load(&self, strategy_id: &StrategyId, currency: &str) -> Result<Account> {
        let mut accounts = self
            .accounts
            .lock()
            .map_err(|_| anyhow!("account table lock poisoned"))?;
        if let Some(account) = accounts.get(strategy_id) {
            return Ok(account.clone());
        }

        let capital = self
            .seeds
            .get(strategy_id)
            .ok_or_else(|| anyhow!("Unknown account {}", strategy_id))?;
        let account = Account::new(strategy_id.clone(), currency, *capital);
        accounts.insert(strategy_id.clone(), account.clone());
        Ok(account)
    }

    fn save(&self, account: &Account) -> Result<()> {
        self.accounts
            .lock()
            .map_err(|_| anyhow!("account table lock poisoned"))?
            .insert(account.strategy_id().clone(), account.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCycleStore {
    cycles: Mutex<Vec<TradingCycle>>,
}

impl MemoryCycleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cycles(&self) -> Vec<TradingCycle> {
        self.cycles
            .lock()
            .map(|cycles| cycles.clone())
            .unwrap_or_default()
    }
}

impl CycleStore for MemoryCycleStore {
    fn save(&self, cycle: &TradingCycle) -> Result<()> {
        self.cycles
            .lock()
            .map_err(|_| anyhow!("cycle log lock poisoned"))?
            .push(cycle.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use desk::TradeInstruction;
    use rust_decimal_macros::dec;

    fn profile(id: &str, symbols: &[&str]) -> StrategyProfile {
        StrategyProfile::new(
            StrategyId::new(id),
            symbols.iter().map(|s| s.to_string()).collect(),
            dec!(10000),
        )
    }

    #[test]
    fn test_scripted_advisor_replays_then_holds() {
        let strategy = profile("s1", &["BTCUSDT"]);
        let advisor = ScriptedAdvisor::new().with_plans(
            strategy.id().clone(),
            vec![TradePlan::new(
                "enter",
                vec![TradeInstruction::buy("BTCUSDT", dec!(0.01))],
            )],
        );
        let account = Account::new(strategy.id().clone(), "USDT", dec!(10000));
        let market = MarketData::new(MarketSnapshot::new("BTCUSDT", dec!(90000)));

        let first = advisor.propose_plan(&account, &market, &strategy).unwrap();
        assert_eq!(first.rationale, "enter");
        assert_eq!(advisor.remaining(strategy.id()), 0);

        let second = advisor.propose_plan(&account, &market, &strategy).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_static_market_data_primary_and_fallback() {
        let feed = StaticMarketData::new();
        feed.set_price("BTCUSDT", dec!(90000)).unwrap();
        feed.set_price("ETHUSDT", dec!(3000)).unwrap();

        let symbols = vec!["BTCUSDT".to_string(), "ETHUSDT".to_string(), "SOLUSDT".to_string()];
        let market = feed.latest_prices(&symbols).unwrap();

        assert_eq!(market.primary().symbol, "BTCUSDT");
        assert_eq!(market.price_for("ETHUSDT"), dec!(3000));
        assert_eq!(market.price_for("SOLUSDT"), dec!(90000));

        assert!(feed.latest_prices(&["DOGEUSDT".to_string()]).is_err());
        assert!(feed.latest_prices(&[]).is_err());
    }

    #[test]
    fn test_memory_store_seeds_and_persists() {
        let strategy = profile("s1", &["BTCUSDT"]);
        let store = MemoryAccountStore::seeded(std::slice::from_ref(&strategy));

        let mut account = store.load(strategy.id(), "USDT").unwrap();
        assert_eq!(account.balance(), dec!(10000));

        account.withdraw(dec!(100));
        store.save(&account).unwrap();
        assert_eq!(store.load(strategy.id(), "USDT").unwrap().balance(), dec!(9900));

        assert!(store.load(&StrategyId::new("unknown"), "USDT").is_err());
    }
}
