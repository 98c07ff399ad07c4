//! Identity of a strategy account in the system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a strategy and of the virtual account it trades.
/// e.g. "btc-momentum", "paper-test-1"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyId(String);

impl StrategyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id can name a file inside a directory: non-empty, no
    /// path separators, no `..`.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self.0 != "."
            && !self.0.contains("..")
            && !self.0.contains(['/', '\\'])
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StrategyId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
