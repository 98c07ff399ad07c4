//! Double-entry journal of settled executions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Colon separated account path, e.g. `Assets:momentum:Cash`.
    pub account: String,
    pub amount: Decimal,
    pub currency: String,
}

impl LedgerEntry {
    pub fn new(account: impl Into<String>, amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            amount,
            currency: currency.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub timestamp: i64,
    pub description: String,
    pub entries: Vec<LedgerEntry>,
}

impl Transaction {
    pub fn new(description: String, entries: Vec<LedgerEntry>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            description,
            entries,
        }
    }

    /// True when the entries sum to exactly zero.
    pub fn is_balanced(&self) -> bool {
        self.entries
            .iter()
            .map(|e| e.amount)
            .sum::<Decimal>()
            .is_zero()
    }
}

/// Appends transactions to a CSV file, one line per entry.
pub struct TransactionLogger {
    file_path: PathBuf,
}

impl TransactionLogger {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn log(&mut self, transaction: &Transaction) -> std::io::Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        // date,description,account,amount,currency,tx_id
        let date = chrono::DateTime::from_timestamp_millis(transaction.timestamp)
            .unwrap_or_default()
            .to_rfc3339();

        for entry in &transaction.entries {
            writeln!(
                file,
                "{},{},{},{},{},{}",
                date,
                transaction.description,
                entry.account,
                entry.amount,
                entry.currency,
                transaction.id
            )?;
        }

        Ok(())
    }
}
