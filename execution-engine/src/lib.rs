//! # Execution Engine
//!
//! Risk-control rule chain and virtual account settlement.
//!
//! An advisory source proposes a `TradePlan`; the `RuleChain` rewrites or
//! drops each instruction; the `Ledger` settles what survives against the
//! strategy's virtual account. `CycleOrchestrator` wires the collaborators
//! together for one cycle per strategy.

pub mod engine;
pub mod error;
pub mod exchange;
pub mod io;
pub mod ledger;
pub mod math;
pub mod models;
pub mod paper;
pub mod risk_guard;
