//! Defines the `MarketDataSource` trait for market data retrieval.
//!
//! This module specifies the contract that all price adapters must implement.
//! It allows the cycle orchestrator to abstract over different data sources
//! (exchange REST snapshots, recorded fixtures, static paper prices) while
//! receiving a consistent `MarketData` set.

use crate::model::market_data::MarketData;

/// A trait for components that quote the latest prices.
///
/// # Examples
///
/// ```
/// use desk::traits::data_feed::MarketDataSource;
/// use desk::model::market_data::{MarketData, MarketSnapshot};
/// use rust_decimal::Decimal;
///
/// struct FixedFeed;
///
/// impl MarketDataSource for FixedFeed {
///     fn latest_prices(&self, symbols: &[String]) -> anyhow::Result<MarketData> {
///         let primary = symbols.first().ok_or_else(|| anyhow::anyhow!("no symbols"))?;
///         Ok(MarketData::new(MarketSnapshot::new(primary.clone(), Decimal::ONE_HUNDRED)))
///     }
/// }
/// ```
pub trait MarketDataSource: Send + Sync {
    /// Retrieves the latest snapshot of every requested symbol.
    ///
    /// The first symbol becomes the primary snapshot of the returned set.
    /// Implementations fail when the primary symbol cannot be quoted.
    fn latest_prices(&self, symbols: &[String]) -> anyhow::Result<MarketData>;
}
