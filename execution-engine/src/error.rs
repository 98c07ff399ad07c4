use rust_decimal::Decimal;
use thiserror::Error;

/// Failure of a single checked decimal operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("division by zero while computing {0}")]
    DivisionByZero(&'static str),

    #[error("decimal overflow while computing {0}")]
    Overflow(&'static str),
}

/// Unexpected failure inside a rule filter. The chain drops the instruction.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    /// Input the filter cannot reason about, e.g. a non-positive price.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Reason a Ledger operation refused to touch the account.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettlementError {
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    #[error("Insufficient position in {symbol}: requested {requested}, held {held}")]
    InsufficientPosition {
        symbol: String,
        requested: Decimal,
        held: Decimal,
    },

    #[error("Quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

/// Invalid engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
