//! # Desk
//!
//! Shared model of the virtual trading desk and the contracts of the
//! collaborators around the risk pipeline.
//!
//! ## Modules
//! - `model`: Accounts, market snapshots, instructions, decisions, executions
//!   and cycle audit records.
//! - `traits`: Advisory source, market data and persistence boundaries.

pub mod model;
pub mod traits;

pub use model::account::{Account, Position};
pub use model::decision::Decision;
pub use model::execution::{ExecutionStatus, TradeExecution};
pub use model::identity::StrategyId;
pub use model::instruction::{TradeAction, TradeInstruction, TradePlan};
pub use model::market_data::{MarketData, MarketSnapshot};
pub use model::snapshot::{PortfolioSnapshot, PositionSnapshot, TradingCycle};
pub use model::strategy::StrategyProfile;
pub use traits::advisor::AdvisorySource;
pub use traits::data_feed::MarketDataSource;
pub use traits::store::{AccountStore, CycleStore};
