use anyhow::{anyhow, Context, Result};
use desk::{Account, AccountStore, CycleStore, StrategyId, StrategyProfile, TradingCycle};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Writes `state` as pretty JSON to a temporary sibling file, syncs it,
/// then renames it over `path`.
fn save_state<T: Serialize>(path: &Path, state: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create parent directory")?;
    }

    let json = serde_json::to_string_pretty(state).context("Failed to serialize state")?;

    let temp_path = path.with_extension("json.tmp");
    let mut temp_file = std::fs::File::create(&temp_path).context("Failed to create temp file")?;
    temp_file
        .write_all(json.as_bytes())
        .context("Failed to write to temp file")?;
    temp_file.sync_all().context("Failed to sync temp file")?;

    std::fs::rename(&temp_path, path).context("Failed to rename temp file to target")?;
    Ok(())
}

fn load_state<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = std::fs::File::open(path).context("Failed to open state file")?;
    let reader = std::io::BufReader::new(file);
    let state = serde_json::from_reader(reader).context("Failed to deserialize state")?;
    Ok(state)
}

/// File-backed stores rooted at one directory:
///
/// ```text
/// <root>/accounts/<strategy-id>.json   one file per account
/// <root>/cycles.jsonl                  one TradingCycle per line
/// ```
pub struct JsonFileStore {
    root: PathBuf,
    seeds: HashMap<StrategyId, Decimal>,
    cycle_log: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            seeds: HashMap::new(),
            cycle_log: Mutex::new(()),
        }
    }

    /// Accounts of `strategies` that have no file yet start from their
    /// initial capital.
    pub fn with_seeds(mut self, strategies: &[StrategyProfile]) -> Self {
        self.seeds = strategies
            .iter()
            .map(|s| (s.id().clone(), s.initial_capital()))
            .collect();
        self
    }

    /// Fails for ids that would resolve outside `<root>/accounts`.
    pub fn account_path(&self, strategy_id: &StrategyId) -> Result<PathBuf> {
        if !strategy_id.is_path_safe() {
            return Err(anyhow!("Strategy id {:?} is not a valid file name", strategy_id.as_str()));
        }
        Ok(self
            .root
            .join("accounts")
            .join(format!("{}.json", strategy_id)))
    }

    pub fn cycle_log_path(&self) -> PathBuf {
        self.root.join("cycles.jsonl")
    }

    /// Every recorded cycle, oldest first.
    pub fn load_cycles(&self) -> Result<Vec<TradingCycle>> {
        let path = self.cycle_log_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&path).context("Failed to open cycle log")?;
        std::io::BufReader::new(file)
            .lines()
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
            .map(|line| {
                let line = line.context("Failed to read cycle log")?;
                serde_json::from_str(&line).context("Failed to deserialize cycle")
            })
            .collect()
    }
}

impl AccountStore for JsonFileStore {
    fn load(&self, strategy_id: &StrategyId, currency: &str) -> Result<Account> {
        let path = self.account_path(strategy_id)?;
        if path.exists() {
            return load_state(&path)
                .with_context(|| format!("Failed to load account file {}", path.display()));
        }

        let capital = self
            .seeds
            .get(strategy_id)
            .ok_or_else(|| anyhow!("Unknown account {} (no {})", strategy_id, path.display()))?;
        Ok(Account::new(strategy_id.clone(), currency, *capital))
    }

    fn save(&self, account: &Account) -> Result<()> {
        save_state(&self.account_path(account.strategy_id())?, account)
    }
}

impl CycleStore for JsonFileStore {
    fn save(&self, cycle: &TradingCycle) -> Result<()> {
        let line = serde_json::to_string(cycle).context("Failed to serialize cycle")?;

        let _guard = self
            .cycle_log
            .lock()
            .map_err(|_| anyhow!("cycle log lock poisoned"))?;
        std::fs::create_dir_all(&self.root).context("Failed to create state directory")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.cycle_log_path())
            .context("Failed to open cycle log")?;
        writeln!(file, "{}", line).context("Failed to append cycle")?;
        Ok(())
    }
}
