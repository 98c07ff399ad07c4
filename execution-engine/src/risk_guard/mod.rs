use crate::error::FilterError;
use crate::models::EngineConfig;
use desk::{Account, Decision, MarketData, MarketSnapshot, TradeInstruction, TradePlan};
use log::{debug, error, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

pub mod compliance;
pub mod fund_availability;
pub mod leverage;
pub mod position_check;
pub mod stop_loss;

use compliance::ComplianceFilter;
use fund_availability::FundAvailabilityFilter;
use leverage::LeverageFilter;
use position_check::PositionCheckFilter;
use stop_loss::StopLossFilter;

/// Verdict of one filter on one instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// Hand the (possibly rewritten) instruction to the next filter.
    Continue,
    /// Drop the instruction.
    Reject(String),
    /// Accept the instruction as rewritten, skipping the remaining filters.
    ForceAccept,
}

/// State threaded through every instruction of one plan.
///
/// Starts from the real account: the running balance is the account balance
/// and the running positions are the account quantities. Filters consume
/// from it as instructions are accepted so that later instructions of the
/// same plan see the effect of earlier ones.
pub struct RunningContext<'a> {
    account: &'a Account,
    market: &'a MarketSnapshot,
    running_balance: Decimal,
    running_positions: HashMap<String, Decimal>,
}

impl<'a> RunningContext<'a> {
    pub fn new(account: &'a Account, market: &'a MarketSnapshot) -> Self {
        let running_positions = account
            .positions()
            .iter()
            .map(|(symbol, p)| (symbol.clone(), p.quantity))
            .collect();
        Self {
            account,
            market,
            running_balance: account.balance(),
            running_positions,
        }
    }

    /// The real account, as loaded at cycle start.
    pub fn account(&self) -> &'a Account {
        self.account
    }

    /// Price every filter evaluates against.
    pub fn market_price(&self) -> Decimal {
        self.market.price
    }

    pub fn running_balance(&self) -> Decimal {
        self.running_balance
    }

    pub fn set_running_balance(&mut self, balance: Decimal) {
        self.running_balance = balance;
    }

    pub fn running_position(&self, symbol: &str) -> Decimal {
        self.running_positions
            .get(symbol)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn set_running_position(&mut self, symbol: &str, quantity: Decimal) {
        self.running_positions.insert(symbol.to_string(), quantity);
    }

    pub fn running_positions(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.running_positions
            .iter()
            .map(|(symbol, qty)| (symbol.as_str(), *qty))
    }
}

pub trait RuleFilter: Send + Sync {
    fn name(&self) -> &str;

    /// Evaluates one instruction, possibly rewriting it and consuming from
    /// the running context. A filter that rejects must leave `ctx` untouched.
    fn check(
        &self,
        instruction: &mut TradeInstruction,
        ctx: &mut RunningContext,
    ) -> Result<FilterOutcome, FilterError>;
}

/// Ordered chain of rule filters.
pub struct RuleChain {
    filters: Vec<Box<dyn RuleFilter>>,
}

impl RuleChain {
    /// Builds the chain in its fixed order:
    /// Compliance, PositionCheck, Leverage, FundAvailability, StopLoss.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            filters: vec![
                Box::new(ComplianceFilter::new(config.compliance.clone())),
                Box::new(PositionCheckFilter),
                Box::new(LeverageFilter::new(config.leverage.clone())),
                Box::new(FundAvailabilityFilter::new(config.funds.clone())),
                Box::new(StopLossFilter::new(config.stop_loss.clone())),
            ],
        }
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn add_filter(&mut self, filter: Box<dyn RuleFilter>) {
        self.filters.push(filter);
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Runs `instruction` through the chain. Returns true when accepted.
    ///
    /// A filter error or panic rejects this instruction only.
    pub fn evaluate(&self, instruction: &mut TradeInstruction, ctx: &mut RunningContext) -> bool {
        for filter in &self.filters {
            let result = panic::catch_unwind(AssertUnwindSafe(|| filter.check(instruction, ctx)));
            match result {
                Ok(Ok(FilterOutcome::Continue)) => {
                    debug!(
                        "Instruction {} passed {}",
                        instruction.instruction_id,
                        filter.name()
                    );
                }
                Ok(Ok(FilterOutcome::Reject(reason))) => {
                    warn!(
                        "Instruction {} ({} {} {}) rejected by {}: {}",
                        instruction.instruction_id,
                        instruction.action,
                        instruction.quantity,
                        instruction.symbol,
                        filter.name(),
                        reason
                    );
                    return false;
                }
                Ok(Ok(FilterOutcome::ForceAccept)) => {
                    warn!(
                        "Instruction {} force-accepted by {}: {}",
                        instruction.instruction_id,
                        filter.name(),
                        instruction.rationale
                    );
                    return true;
                }
                Ok(Err(e)) => {
                    error!(
                        "Filter {} failed on instruction {}: {}",
                        filter.name(),
                        instruction.instruction_id,
                        e
                    );
                    return false;
                }
                Err(_) => {
                    error!(
                        "Filter {} panicked on instruction {}",
                        filter.name(),
                        instruction.instruction_id
                    );
                    return false;
                }
            }
        }
        true
    }

    /// Evaluates every instruction of `plan` in order against a fresh
    /// running context seeded from `account`, priced at the primary snapshot.
    pub fn filter(&self, plan: &TradePlan, account: &Account, market: &MarketData) -> Decision {
        let mut ctx = RunningContext::new(account, market.primary());
        let mut accepted = Vec::with_capacity(plan.instructions.len());

        for instruction in &plan.instructions {
            let mut candidate = instruction.clone();
            if self.evaluate(&mut candidate, &mut ctx) {
                accepted.push(candidate);
            }
        }

        debug!(
            "Plan filtered for {}: {}/{} instructions accepted",
            account.strategy_id(),
            accepted.len(),
            plan.instructions.len()
        );

        Decision {
            rationale: plan.rationale.clone(),
            instructions: accepted,
            raw_plan: Some(plan.clone()),
        }
    }
}
