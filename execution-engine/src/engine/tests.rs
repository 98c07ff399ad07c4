use super::*;
use crate::error::FilterError;
use crate::exchange::paper::PaperExchange;
use crate::paper::{MemoryAccountStore, MemoryCycleStore, ScriptedAdvisor, StaticMarketData};
use crate::risk_guard::{FilterOutcome, RuleFilter, RunningContext};
use anyhow::anyhow;
use desk::{
    AccountStore, AdvisorySource, CycleStore, ExecutionStatus, MarketSnapshot, Position,
    StrategyId, StrategyProfile,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn create_test_engine() -> Engine {
    Engine::from_config(&EngineConfig::default())
}

/// Settles whatever it is given: no rules at all.
fn create_unguarded_engine() -> Engine {
    Engine::new(RuleChain::empty(), Box::new(PaperExchange::new(dec!(0.001))))
}

fn account(balance: Decimal) -> Account {
    Account::new(StrategyId::new("test"), "USDT", balance)
}

fn btc_market(price: Decimal) -> MarketData {
    MarketData::new(MarketSnapshot::new("BTCUSDT", price))
}

#[test]
fn test_buy_settles_with_fee() {
    let engine = create_test_engine();
    let mut account = account(dec!(10000));
    let plan = TradePlan::new("enter", vec![TradeInstruction::buy("BTCUSDT", dec!(0.02))]);

    let (decision, executions) = engine.run_pipeline(&plan, &mut account, &btc_market(dec!(90000)));

    assert_eq!(decision.instructions.len(), 1);
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].status, ExecutionStatus::Filled);
    assert_eq!(executions[0].fee, dec!(1.8));
    assert_eq!(account.balance(), dec!(8198.2));
    assert_eq!(account.position_quantity("BTCUSDT"), dec!(0.02));
}

#[test]
fn test_oversized_sell_is_clamped_and_settled() {
    let engine = create_test_engine();
    let mut account = account(dec!(0)).with_position(Position::new("BTCUSDT", dec!(0.5), dec!(88000)));
    let plan = TradePlan::new("exit", vec![TradeInstruction::sell("BTCUSDT", dec!(1.0))]);

    let (decision, executions) = engine.run_pipeline(&plan, &mut account, &btc_market(dec!(90000)));

    assert_eq!(decision.instructions[0].quantity, dec!(0.5));
    assert!(decision.instructions[0]
        .rationale
        .ends_with("[Rule: Clamped to available position]"));
    assert_eq!(executions[0].status, ExecutionStatus::Filled);
    assert!(account.position("BTCUSDT").is_none());
    // 45000 - 45 fee
    assert_eq!(account.balance(), dec!(44955));
}

#[test]
fn test_buy_clamped_by_slippage_buffer() {
    let engine = create_test_engine();
    let mut account = account(dec!(500));
    let plan = TradePlan::new("enter", vec![TradeInstruction::buy("BTCUSDT", dec!(0.01))]);

    let (decision, executions) = engine.run_pipeline(&plan, &mut account, &btc_market(dec!(90000)));

    assert_eq!(decision.instructions[0].quantity, dec!(0.00553615));
    assert_eq!(executions[0].status, ExecutionStatus::Filled);
    assert!(account.balance() >= Decimal::ZERO);
}

#[test]
fn test_buy_clamped_by_leverage() {
    let engine = create_test_engine();
    let mut account = account(dec!(1000)).with_position(Position::new("BTCUSDT", dec!(0.05), dec!(90000)));
    let plan = TradePlan::new("add", vec![TradeInstruction::buy("BTCUSDT", dec!(0.01))]);

    let (decision, executions) = engine.run_pipeline(&plan, &mut account, &btc_market(dec!(90000)));

    let accepted = &decision.instructions[0];
    assert!(accepted.rationale.ends_with("[Rule: Clamped due to leverage limit]"));
    assert_eq!(accepted.quantity, dec!(0.00555555));
    assert_eq!(executions[0].status, ExecutionStatus::Filled);
}

#[test]
fn test_rejected_instruction_does_not_affect_batch() {
    init_logger();
    let engine = create_test_engine();
    let mut account = account(dec!(10000));
    let plan = TradePlan::new(
        "rotate",
        vec![
            TradeInstruction::sell("ETHUSDT", dec!(1)),
            TradeInstruction::buy("BTCUSDT", dec!(0.02)),
        ],
    );

    let (decision, executions) = engine.run_pipeline(&plan, &mut account, &btc_market(dec!(90000)));

    assert_eq!(decision.instructions.len(), 1);
    assert_eq!(decision.instructions[0].symbol, "BTCUSDT");
    assert_eq!(executions.len(), 1);
    assert_eq!(account.balance(), dec!(8198.2));
}

#[test]
fn test_stop_loss_turns_buy_into_liquidation() {
    init_logger();
    let engine = create_test_engine();
    let mut account = account(dec!(100000)).with_position(Position::new("BTCUSDT", dec!(0.2), dec!(100000)));
    let plan = TradePlan::new("average down", vec![TradeInstruction::buy("BTCUSDT", dec!(0.01))]);

    let (decision, executions) = engine.run_pipeline(&plan, &mut account, &btc_market(dec!(90000)));

    assert_eq!(decision.instructions[0].action, TradeAction::Sell);
    assert_eq!(decision.instructions[0].quantity, dec!(0.2));
    assert_eq!(executions[0].action, TradeAction::Sell);
    assert!(account.position("BTCUSDT").is_none());
    // 100000 + 18000 - 18
    assert_eq!(account.balance(), dec!(117982));
}

#[test]
fn test_hold_produces_no_execution() {
    struct PassAll;
    impl RuleFilter for PassAll {
        fn name(&self) -> &str {
            "PassAll"
        }
        fn check(
            &self,
            _: &mut TradeInstruction,
            _: &mut RunningContext,
        ) -> Result<FilterOutcome, FilterError> {
            Ok(FilterOutcome::Continue)
        }
    }
    let mut chain = RuleChain::empty();
    chain.add_filter(Box::new(PassAll));
    let engine = Engine::new(chain, Box::new(PaperExchange::new(dec!(0.001))));
    let mut account = account(dec!(1000));
    let plan = TradePlan::new(
        "wait",
        vec![TradeInstruction::new(TradeAction::Hold, "BTCUSDT", Decimal::ZERO, "wait")],
    );

    let (decision, executions) = engine.run_pipeline(&plan, &mut account, &btc_market(dec!(90000)));

    assert_eq!(decision.instructions.len(), 1);
    assert!(executions.is_empty());
    assert_eq!(account.balance(), dec!(1000));
}

#[test]
fn test_settlement_failure_keeps_earlier_fills() {
    init_logger();
    let engine = create_unguarded_engine();
    let mut account = account(dec!(2000));
    let plan = TradePlan::new(
        "greedy",
        vec![
            TradeInstruction::buy("BTCUSDT", dec!(0.02)),
            TradeInstruction::buy("BTCUSDT", dec!(0.02)),
        ],
    );

    let (_, executions) = engine.run_pipeline(&plan, &mut account, &btc_market(dec!(90000)));

    assert_eq!(executions[0].status, ExecutionStatus::Filled);
    assert_eq!(executions[1].status, ExecutionStatus::Failed);
    assert!(executions[1]
        .error_message
        .as_deref()
        .is_some_and(|m| m.starts_with("Insufficient balance")));
    assert_eq!(account.balance(), dec!(198.2));
    assert_eq!(account.position_quantity("BTCUSDT"), dec!(0.02));
}

#[test]
fn test_settles_at_symbol_price_with_primary_fallback() {
    let engine = create_unguarded_engine();
    let mut account = account(dec!(100000));
    let market = btc_market(dec!(90000)).with(MarketSnapshot::new("ETHUSDT", dec!(3000)));
    let plan = TradePlan::new(
        "spread",
        vec![
            TradeInstruction::buy("ETHUSDT", dec!(1)),
            TradeInstruction::buy("SOLUSDT", dec!(0.1)),
        ],
    );

    let (_, executions) = engine.run_pipeline(&plan, &mut account, &market);

    assert_eq!(executions[0].price, dec!(3000));
    assert_eq!(executions[1].price, dec!(90000));
}

#[test]
fn test_journal_records_balanced_transactions() {
    let dir = std::env::temp_dir().join(format!("desk-engine-journal-{}", uuid::Uuid::new_v4()));
    let path = dir.join("journal.csv");
    let engine = create_test_engine().with_journal(TransactionLogger::new(path.clone()));
    let mut account = account(dec!(10000));
    let plan = TradePlan::new("enter", vec![TradeInstruction::buy("BTCUSDT", dec!(0.02))]);

    engine.run_pipeline(&plan, &mut account, &btc_market(dec!(90000)));

    let content = std::fs::read_to_string(&path).unwrap();
    let total: Decimal = content
        .lines()
        .map(|line| line.split(',').nth(3).unwrap().parse::<Decimal>().unwrap())
        .sum();
    assert_eq!(content.lines().count(), 3);
    assert!(total.is_zero());

    std::fs::remove_dir_all(&dir).unwrap();
}

// --- Cycle orchestration ---

struct FailingAdvisor;
impl AdvisorySource for FailingAdvisor {
    fn propose_plan(
        &self,
        _: &Account,
        _: &MarketData,
        _: &StrategyProfile,
    ) -> anyhow::Result<TradePlan> {
        Err(anyhow!("model timeout"))
    }
}

struct FailingCycleStore;
impl CycleStore for FailingCycleStore {
    fn save(&self, _: &desk::TradingCycle) -> anyhow::Result<()> {
        Err(anyhow!("disk full"))
    }
}

fn strategy(id: &str) -> StrategyProfile {
    StrategyProfile::new(StrategyId::new(id), vec!["BTCUSDT".into()], dec!(10000))
}

fn market_data() -> Arc<StaticMarketData> {
    let feed = StaticMarketData::new();
    feed.set_price("BTCUSDT", dec!(90000)).unwrap();
    Arc::new(feed)
}

#[test]
fn test_cycle_settles_and_records() {
    let s1 = strategy("s1");
    let accounts = Arc::new(MemoryAccountStore::seeded(std::slice::from_ref(&s1)));
    let cycles = Arc::new(MemoryCycleStore::new());
    let advisor = ScriptedAdvisor::new().with_plans(
        s1.id().clone(),
        vec![TradePlan::new(
            "enter",
            vec![
                TradeInstruction::buy("BTCUSDT", dec!(0.02)),
                TradeInstruction::sell("ETHUSDT", dec!(1)),
            ],
        )],
    );
    let orchestrator = CycleOrchestrator::new(
        Arc::new(create_test_engine()),
        Arc::new(advisor),
        market_data(),
        accounts.clone(),
        cycles.clone(),
    );

    let report = orchestrator.run_cycle(&s1).unwrap();

    assert_eq!(report.proposed, 2);
    assert_eq!(report.accepted(), 1);
    assert_eq!(report.rejected(), 1);
    assert_eq!(report.filled(), 1);
    assert_eq!(report.failed(), 0);
    assert_eq!(report.cycle.portfolio_snapshot.available_balance, dec!(8198.2));
    assert_eq!(accounts.get(s1.id()).unwrap().balance(), dec!(8198.2));
    assert_eq!(cycles.cycles().len(), 1);
    assert_eq!(cycles.cycles()[0].cycle_id, report.cycle.cycle_id);
}

#[test]
fn test_cycle_holds_when_advisor_fails() {
    init_logger();
    let s1 = strategy("s1");
    let accounts = Arc::new(MemoryAccountStore::seeded(std::slice::from_ref(&s1)));
    let orchestrator = CycleOrchestrator::new(
        Arc::new(create_test_engine()),
        Arc::new(FailingAdvisor),
        market_data(),
        accounts.clone(),
        Arc::new(MemoryCycleStore::new()),
    );

    let report = orchestrator.run_cycle(&s1).unwrap();

    assert!(report.cycle.decision.is_hold());
    assert!(report.cycle.decision.rationale.contains("model timeout"));
    assert!(report.cycle.executions.is_empty());
    assert_eq!(accounts.get(s1.id()).unwrap().balance(), dec!(10000));
}

#[test]
fn test_cycle_survives_cycle_store_failure() {
    init_logger();
    let s1 = strategy("s1");
    let orchestrator = CycleOrchestrator::new(
        Arc::new(create_test_engine()),
        Arc::new(ScriptedAdvisor::new()),
        market_data(),
        Arc::new(MemoryAccountStore::seeded(std::slice::from_ref(&s1))),
        Arc::new(FailingCycleStore),
    );

    assert!(orchestrator.run_cycle(&s1).is_ok());
}

#[test]
fn test_cycle_aborts_without_market_data() {
    let s1 = StrategyProfile::new(StrategyId::new("s1"), vec!["DOGEUSDT".into()], dec!(10000));
    let accounts = Arc::new(MemoryAccountStore::seeded(std::slice::from_ref(&s1)));
    let orchestrator = CycleOrchestrator::new(
        Arc::new(create_test_engine()),
        Arc::new(ScriptedAdvisor::new()),
        market_data(),
        accounts.clone(),
        Arc::new(MemoryCycleStore::new()),
    );

    let err = orchestrator.run_cycle(&s1).unwrap_err();
    assert!(err.to_string().contains("Failed to fetch market data for s1"));
}

#[tokio::test]
async fn test_run_cycles_in_parallel_keeps_accounts_apart() {
    let strategies = vec![strategy("a"), strategy("b")];
    let accounts = Arc::new(MemoryAccountStore::seeded(&strategies));
    let advisor = ScriptedAdvisor::new()
        .with_plans(
            StrategyId::new("a"),
            vec![TradePlan::new("a", vec![TradeInstruction::buy("BTCUSDT", dec!(0.02))])],
        )
        .with_plans(
            StrategyId::new("b"),
            vec![TradePlan::new("b", vec![TradeInstruction::buy("BTCUSDT", dec!(0.01))])],
        );
    let orchestrator = CycleOrchestrator::new(
        Arc::new(create_test_engine()),
        Arc::new(advisor),
        market_data(),
        accounts.clone(),
        Arc::new(MemoryCycleStore::new()),
    );

    let results = orchestrator.run_cycles(&strategies).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, StrategyId::new("a"));
    assert!(results.iter().all(|(_, r)| r.is_ok()));
    assert_eq!(accounts.get(&StrategyId::new("a")).unwrap().balance(), dec!(8198.2));
    // 10000 - 900 - 0.9
    assert_eq!(accounts.get(&StrategyId::new("b")).unwrap().balance(), dec!(9099.1));
    assert_eq!(
        AccountStore::load(accounts.as_ref(), &StrategyId::new("b"), "USDT")
            .unwrap()
            .position_quantity("BTCUSDT"),
        dec!(0.01)
    );
}

/// Proposes one BUY after a delay, so overlapping cycles of one account
/// would both load the seeded balance.
struct SlowBuyer;
impl AdvisorySource for SlowBuyer {
    fn propose_plan(
        &self,
        _: &Account,
        _: &MarketData,
        _: &StrategyProfile,
    ) -> anyhow::Result<TradePlan> {
        std::thread::sleep(std::time::Duration::from_millis(200));
        Ok(TradePlan::new("enter", vec![TradeInstruction::buy("BTCUSDT", dec!(0.02))]))
    }
}

#[tokio::test]
async fn test_run_cycles_runs_duplicate_strategy_once() {
    init_logger();
    let strategies = vec![strategy("dup"), strategy("dup")];
    let accounts = Arc::new(MemoryAccountStore::seeded(&strategies[..1]));
    let cycles = Arc::new(MemoryCycleStore::new());
    let orchestrator = CycleOrchestrator::new(
        Arc::new(create_test_engine()),
        Arc::new(SlowBuyer),
        market_data(),
        accounts.clone(),
        cycles.clone(),
    );

    let results = orchestrator.run_cycles(&strategies).await;

    assert_eq!(results.len(), 2);
    let first = results[0].1.as_ref().unwrap();
    assert_eq!(first.filled(), 1);
    let err = results[1].1.as_ref().unwrap_err();
    assert!(err.to_string().contains("Duplicate strategy id dup"));

    let filled: usize = results
        .iter()
        .filter_map(|(_, r)| r.as_ref().ok())
        .map(CycleReport::filled)
        .sum();
    let account = accounts.get(&StrategyId::new("dup")).unwrap();
    assert_eq!(filled, 1);
    assert_eq!(account.balance(), dec!(8198.2));
    assert_eq!(account.position_quantity("BTCUSDT"), dec!(0.02));
    assert_eq!(cycles.cycles().len(), 1);
}
