use super::Engine;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use desk::{
    AccountStore, AdvisorySource, CycleStore, MarketDataSource, PortfolioSnapshot, StrategyId,
    StrategyProfile, TradePlan, TradingCycle,
};
use log::{error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of one cycle, as persisted plus how much of the plan survived.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: TradingCycle,
    /// Number of instructions the advisory source proposed.
    pub proposed: usize,
}

impl CycleReport {
    pub fn accepted(&self) -> usize {
        self.cycle.decision.instructions.len()
    }

    pub fn rejected(&self) -> usize {
        self.proposed.saturating_sub(self.accepted())
    }

    pub fn filled(&self) -> usize {
        self.cycle.executions.iter().filter(|e| e.is_filled()).count()
    }

    pub fn failed(&self) -> usize {
        self.cycle.executions.len() - self.filled()
    }
}

/// Drives one trading cycle per strategy: load, quote, advise, filter,
/// settle, persist.
#[derive(Clone)]
pub struct CycleOrchestrator {
    engine: Arc<Engine>,
    advisor: Arc<dyn AdvisorySource>,
    market_data: Arc<dyn MarketDataSource>,
    accounts: Arc<dyn AccountStore>,
    cycles: Arc<dyn CycleStore>,
}

impl CycleOrchestrator {
    pub fn new(
        engine: Arc<Engine>,
        advisor: Arc<dyn AdvisorySource>,
        market_data: Arc<dyn MarketDataSource>,
        accounts: Arc<dyn AccountStore>,
        cycles: Arc<dyn CycleStore>,
    ) -> Self {
        Self {
            engine,
            advisor,
            market_data,
            accounts,
            cycles,
        }
    }

    /// Runs one cycle for `strategy`.
    ///
    /// Failing to load the account, quote the market or save the account
    /// aborts the cycle. A failing advisory source degrades to HOLD and a
    /// failing cycle store is only logged.
    pub fn run_cycle(&self, strategy: &StrategyProfile) -> Result<CycleReport> {
        let id = strategy.id();
        let started_at = Utc::now().timestamp_millis();

        let mut account = self
            .accounts
            .load(id, strategy.currency())
            .with_context(|| format!("Failed to load account of {}", id))?;
        let market = self
            .market_data
            .latest_prices(strategy.symbols())
            .with_context(|| format!("Failed to fetch market data for {}", id))?;

        let plan = match self.advisor.propose_plan(&account, &market, strategy) {
            Ok(plan) => plan,
            Err(e) => {
                warn!("Advisory source failed for {}: {:#}. Holding.", id, e);
                TradePlan::hold(format!("Advisory source unavailable: {}", e))
            }
        };
        info!(
            "Cycle for {}: {} instructions proposed ({})",
            id,
            plan.instructions.len(),
            plan.rationale
        );

        let (decision, executions) = self.engine.run_pipeline(&plan, &mut account, &market);

        self.accounts
            .save(&account)
            .with_context(|| format!("Failed to save account of {}", id))?;

        let cycle = TradingCycle {
            cycle_id: Uuid::new_v4(),
            strategy_id: id.clone(),
            market_snapshot: market.primary().clone(),
            decision,
            executions,
            portfolio_snapshot: PortfolioSnapshot::capture(&account, &market),
            started_at,
            finished_at: Utc::now().timestamp_millis(),
        };

        if let Err(e) = self.cycles.save(&cycle) {
            error!("Failed to record cycle {} of {}: {:#}", cycle.cycle_id, id, e);
        }

        let report = CycleReport {
            cycle,
            proposed: plan.instructions.len(),
        };
        info!(
            "Cycle {} of {} done: {} accepted, {} rejected, {} filled, {} failed, balance {}, unrealized pnl {}",
            report.cycle.cycle_id,
            id,
            report.accepted(),
            report.rejected(),
            report.filled(),
            report.failed(),
            report.cycle.portfolio_snapshot.available_balance,
            report.cycle.portfolio_snapshot.unrealized_pnl()
        );
        Ok(report)
    }

    /// Runs one cycle per strategy, each on its own blocking task.
    /// Results come back in the order of `strategies`.
    ///
    /// A strategy id listed more than once only runs for its first entry;
    /// later entries report an error. An account has at most one cycle in
    /// flight.
    pub async fn run_cycles(
        &self,
        strategies: &[StrategyProfile],
    ) -> Vec<(StrategyId, Result<CycleReport>)> {
        let mut seen = HashSet::new();
        let tasks: Vec<_> = strategies
            .iter()
            .map(|strategy| {
                let id = strategy.id().clone();
                if !seen.insert(id.clone()) {
                    warn!("Strategy {} listed more than once, skipping duplicate", id);
                    return (id, None);
                }
                let orchestrator = self.clone();
                let strategy = strategy.clone();
                let handle =
                    tokio::task::spawn_blocking(move || orchestrator.run_cycle(&strategy));
                (id, Some(handle))
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for (id, handle) in tasks {
            let result = match handle {
                None => Err(anyhow!("Duplicate strategy id {}: cycle already running", id)),
                Some(handle) => match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(anyhow!("Cycle task of {} failed: {}", id, e)),
                },
            };
            results.push((id, result));
        }
        results
    }
}
