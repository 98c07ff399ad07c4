use crate::error::ConfigError;
use desk::StrategyProfile;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Trading-venue constraints checked before anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    /// Smallest accepted `quantity * price`.
    pub min_notional: Decimal,
    /// Lot size quantities are aligned down to. Zero disables alignment.
    pub quantity_step: Decimal,
    pub min_trade_qty: Decimal,
    pub max_order_qty: Decimal,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            min_notional: dec!(10),
            quantity_step: dec!(0.00001),
            min_trade_qty: dec!(0.00001),
            max_order_qty: dec!(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeverageConfig {
    /// Projected exposure over account equity above which BUYs are clamped.
    pub max_leverage: Decimal,
}

impl Default for LeverageConfig {
    fn default() -> Self {
        Self {
            max_leverage: dec!(5.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundsConfig {
    /// Adverse price move reserved on every BUY, in basis points.
    pub slippage_bps: Decimal,
    /// Share of the running balance a BUY may spend (0.999 keeps 0.1% for fees).
    pub fee_buffer: Decimal,
}

impl Default for FundsConfig {
    fn default() -> Self {
        Self {
            slippage_bps: dec!(25),
            fee_buffer: dec!(0.999),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopLossConfig {
    /// Unrealized return below which the position is liquidated (-0.05 = -5%).
    pub stop_loss_threshold: Decimal,
    pub stop_profit_threshold: Decimal,
    pub enable_stop_profit: bool,
}

impl Default for StopLossConfig {
    fn default() -> Self {
        Self {
            stop_loss_threshold: dec!(-0.05),
            stop_profit_threshold: dec!(0.20),
            enable_stop_profit: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Share of the notional charged per fill (0.001 = 10 bps).
    pub fee_rate: Decimal,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            fee_rate: dec!(0.001),
        }
    }
}

/// Static price of one symbol for the paper market data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Decimal,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_cycles() -> u64 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings of the paper runner binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub strategies: Vec<StrategyProfile>,
    #[serde(default)]
    pub quotes: Vec<Quote>,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Number of cycles per strategy. Zero runs until interrupted.
    #[serde(default = "default_cycles")]
    pub cycles: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory of the JSON file store. In-memory stores when unset.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    /// CSV journal of filled executions. No journal when unset.
    #[serde(default)]
    pub journal_path: Option<PathBuf>,
    /// JSON file of scripted plans keyed by strategy id.
    #[serde(default)]
    pub plans_path: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            strategies: Vec::new(),
            quotes: Vec::new(),
            interval_secs: default_interval_secs(),
            cycles: default_cycles(),
            log_level: default_log_level(),
            state_dir: None,
            journal_path: None,
            plans_path: None,
        }
    }
}

/// Every tunable of the rule chain, the Ledger and the runner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub compliance: ComplianceConfig,
    pub leverage: LeverageConfig,
    pub funds: FundsConfig,
    pub stop_loss: StopLossConfig,
    pub fees: FeeConfig,
    pub runner: RunnerConfig,
}

impl EngineConfig {
    /// Loads the configuration from an optional TOML file, then applies
    /// `DESK__SECTION__KEY` environment overrides, then validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("DESK")
                .prefix_separator("__")
                .separator("__"),
        );

        let loaded: EngineConfig = builder.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.compliance;
        if c.min_notional < Decimal::ZERO {
            return Err(ConfigError::invalid("compliance.min_notional", "must not be negative"));
        }
        if c.quantity_step < Decimal::ZERO {
            return Err(ConfigError::invalid("compliance.quantity_step", "must not be negative"));
        }
        if c.min_trade_qty < Decimal::ZERO {
            return Err(ConfigError::invalid("compliance.min_trade_qty", "must not be negative"));
        }
        if c.max_order_qty <= Decimal::ZERO {
            return Err(ConfigError::invalid("compliance.max_order_qty", "must be positive"));
        }
        if c.min_trade_qty > c.max_order_qty {
            return Err(ConfigError::invalid(
                "compliance.min_trade_qty",
                format!("{} exceeds max_order_qty {}", c.min_trade_qty, c.max_order_qty),
            ));
        }

        if self.leverage.max_leverage <= Decimal::ZERO {
            return Err(ConfigError::invalid("leverage.max_leverage", "must be positive"));
        }

        if self.funds.slippage_bps < Decimal::ZERO {
            return Err(ConfigError::invalid("funds.slippage_bps", "must not be negative"));
        }
        if self.funds.fee_buffer <= Decimal::ZERO || self.funds.fee_buffer > Decimal::ONE {
            return Err(ConfigError::invalid("funds.fee_buffer", "must be in (0, 1]"));
        }

        if self.stop_loss.stop_loss_threshold >= Decimal::ZERO {
            return Err(ConfigError::invalid("stop_loss.stop_loss_threshold", "must be negative"));
        }
        if self.stop_loss.stop_profit_threshold <= Decimal::ZERO {
            return Err(ConfigError::invalid("stop_loss.stop_profit_threshold", "must be positive"));
        }

        if self.fees.fee_rate < Decimal::ZERO || self.fees.fee_rate >= Decimal::ONE {
            return Err(ConfigError::invalid("fees.fee_rate", "must be in [0, 1)"));
        }

        if self.runner.interval_secs == 0 {
            return Err(ConfigError::invalid("runner.interval_secs", "must be positive"));
        }
        let mut seen = HashSet::new();
        for strategy in &self.runner.strategies {
            if !strategy.id().is_path_safe() {
                return Err(ConfigError::invalid(
                    "runner.strategies",
                    format!("strategy id {:?} must be a plain file name", strategy.id().as_str()),
                ));
            }
            if !seen.insert(strategy.id()) {
                return Err(ConfigError::invalid(
                    "runner.strategies",
                    format!("duplicate strategy id {}", strategy.id()),
                ));
            }
            if strategy.primary_symbol().is_none() {
                return Err(ConfigError::invalid(
                    "runner.strategies",
                    format!("strategy {} has no symbols", strategy.id()),
                ));
            }
        }
        for quote in &self.runner.quotes {
            if quote.price <= Decimal::ZERO {
                return Err(ConfigError::invalid(
                    "runner.quotes",
                    format!("price of {} must be positive", quote.symbol),
                ));
            }
        }

        Ok(())
    }
}
