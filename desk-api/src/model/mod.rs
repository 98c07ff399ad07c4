pub mod account;
pub mod decision;
pub mod execution;
pub mod identity;
pub mod instruction;
pub mod market_data;
pub mod snapshot;
pub mod strategy;
