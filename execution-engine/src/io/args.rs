use crate::models::EngineConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// TOML configuration file. Without one, defaults plus DESK__*
    /// environment overrides apply.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Cycles per strategy. 0 runs until interrupted.
    #[arg(long)]
    pub cycles: Option<u64>,

    /// Seconds between two cycles of the same strategy.
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Directory of the JSON account and cycle files.
    /// Accounts live in memory when unset.
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// CSV file the double-entry journal is appended to.
    #[arg(long)]
    pub journal: Option<PathBuf>,

    /// JSON file of scripted plans, keyed by strategy id.
    #[arg(long)]
    pub plans: Option<PathBuf>,
}

impl Args {
    /// Command line flags win over the configuration file and environment.
    pub fn apply(&self, config: &mut EngineConfig) {
        let runner = &mut config.runner;
        if let Some(cycles) = self.cycles {
            runner.cycles = cycles;
        }
        if let Some(interval) = self.interval_secs {
            runner.interval_secs = interval;
        }
        if let Some(dir) = &self.state_dir {
            runner.state_dir = Some(dir.clone());
        }
        if let Some(journal) = &self.journal {
            runner.journal_path = Some(journal.clone());
        }
        if let Some(plans) = &self.plans {
            runner.plans_path = Some(plans.clone());
        }
    }
}
