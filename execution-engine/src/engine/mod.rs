use crate::error::SettlementError;
use crate::exchange::paper::PaperExchange;
use crate::exchange::Exchange;
use crate::ledger::{Ledger, Settlement};
use crate::models::{EngineConfig, TransactionLogger};
use crate::risk_guard::RuleChain;
use desk::{Account, Decision, MarketData, TradeAction, TradeExecution, TradeInstruction, TradePlan};
use log::{error, info, warn};
use rust_decimal::Decimal;
use std::sync::Mutex;

type SettleFn =
    fn(&mut Account, &str, Decimal, Decimal, Decimal) -> Result<Settlement, SettlementError>;

pub mod orchestrator;

pub use orchestrator::{CycleOrchestrator, CycleReport};

/// Risk filtering followed by settlement, for one account at a time.
pub struct Engine {
    rule_chain: RuleChain,
    exchange: Box<dyn Exchange>,
    journal: Option<Mutex<TransactionLogger>>,
}

impl Engine {
    pub fn new(rule_chain: RuleChain, exchange: Box<dyn Exchange>) -> Self {
        Self {
            rule_chain,
            exchange,
            journal: None,
        }
    }

    /// Standard rule chain, paper fills at the configured fee rate, and the
    /// CSV journal when `runner.journal_path` is set.
    pub fn from_config(config: &EngineConfig) -> Self {
        let engine = Self::new(
            RuleChain::new(config),
            Box::new(PaperExchange::new(config.fees.fee_rate)),
        );
        match &config.runner.journal_path {
            Some(path) => engine.with_journal(TransactionLogger::new(path.clone())),
            None => engine,
        }
    }

    pub fn with_journal(mut self, logger: TransactionLogger) -> Self {
        self.journal = Some(Mutex::new(logger));
        self
    }

    pub fn rule_chain(&self) -> &RuleChain {
        &self.rule_chain
    }

    /// Filters `plan` through the rule chain, then settles every accepted
    /// instruction in order against `account`.
    ///
    /// HOLD instructions produce no execution. A settlement failure yields a
    /// FAILED execution and never rolls back earlier settlements.
    pub fn run_pipeline(
        &self,
        plan: &TradePlan,
        account: &mut Account,
        market: &MarketData,
    ) -> (Decision, Vec<TradeExecution>) {
        let decision = self.rule_chain.filter(plan, account, market);

        let executions: Vec<TradeExecution> = decision
            .instructions
            .iter()
            .filter_map(|instruction| self.settle(instruction, account, market))
            .collect();

        if !executions.is_empty() {
            let filled = executions.iter().filter(|e| e.is_filled()).count();
            info!(
                "Settled {}/{} instructions for {}",
                filled,
                executions.len(),
                account.strategy_id()
            );
        }

        (decision, executions)
    }

    fn settle(
        &self,
        instruction: &TradeInstruction,
        account: &mut Account,
        market: &MarketData,
    ) -> Option<TradeExecution> {
        let settle: SettleFn = match instruction.action {
            TradeAction::Buy => Ledger::buy,
            TradeAction::Sell => Ledger::sell,
            TradeAction::Hold => return None,
        };

        let market_price = market.price_for(&instruction.symbol);
        let fill = match self.exchange.quote_fill(instruction, market_price) {
            Ok(fill) => fill,
            Err(e) => {
                error!("Failed to price {}: {}", instruction.instruction_id, e);
                return Some(TradeExecution::failed(instruction, e.to_string()));
            }
        };

        let result = settle(
            account,
            &instruction.symbol,
            instruction.quantity,
            fill.price,
            fill.fee,
        );

        match result {
            Ok(settlement) => {
                info!(
                    "{} {} {} @ {} (fee {}) for {}",
                    instruction.action,
                    instruction.quantity,
                    instruction.symbol,
                    fill.price,
                    fill.fee,
                    account.strategy_id()
                );
                self.record(&settlement);
                Some(TradeExecution::filled(instruction, fill.price, fill.fee))
            }
            Err(e) => {
                warn!(
                    "Settlement of {} {} {} failed for {}: {}",
                    instruction.action,
                    instruction.quantity,
                    instruction.symbol,
                    account.strategy_id(),
                    e
                );
                Some(TradeExecution::failed(instruction, e.to_string()))
            }
        }
    }

    fn record(&self, settlement: &Settlement) {
        let Some(journal) = &self.journal else {
            return;
        };

        let tx = settlement.to_transaction();
        if !tx.is_balanced() {
            warn!("Journal transaction {} is not balanced", tx.id);
        }
        match journal.lock() {
            Ok(mut logger) => {
                if let Err(e) = logger.log(&tx) {
                    warn!("Failed to log transaction: {}", e);
                }
            }
            Err(_) => warn!("Journal lock poisoned, dropping transaction {}", tx.id),
        }
    }
}

#[cfg(test)]
mod tests;
