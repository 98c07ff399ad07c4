use anyhow::{bail, Context, Result};
use clap::Parser;
use desk::{AccountStore, CycleStore};
use env_logger::Env;
use execution_engine::engine::{CycleOrchestrator, Engine};
use execution_engine::io::args::Args;
use execution_engine::models::EngineConfig;
use execution_engine::paper::{
    JsonFileStore, MemoryAccountStore, MemoryCycleStore, ScriptedAdvisor, StaticMarketData,
};
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config =
        EngineConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    env_logger::Builder::from_env(Env::default().default_filter_or(config.runner.log_level.as_str()))
        .init();

    let runner = &config.runner;
    if runner.strategies.is_empty() {
        bail!("No strategies configured (runner.strategies)");
    }

    // 1. Collaborators
    let advisor = match &runner.plans_path {
        Some(path) => ScriptedAdvisor::from_json_file(path)?,
        None => ScriptedAdvisor::new(),
    };
    let market = Arc::new(StaticMarketData::from_quotes(&runner.quotes));
    let (accounts, cycles) = match &runner.state_dir {
        Some(dir) => {
            info!("Persisting state under {}", dir.display());
            let store = Arc::new(JsonFileStore::new(dir).with_seeds(&runner.strategies));
            (
                store.clone() as Arc<dyn AccountStore>,
                store as Arc<dyn CycleStore>,
            )
        }
        None => (
            Arc::new(MemoryAccountStore::seeded(&runner.strategies)) as Arc<dyn AccountStore>,
            Arc::new(MemoryCycleStore::new()) as Arc<dyn CycleStore>,
        ),
    };

    // 2. Engine
    let engine = Arc::new(Engine::from_config(&config));
    info!("Rule chain: {}", engine.rule_chain().filter_names().join(" -> "));
    let orchestrator =
        CycleOrchestrator::new(engine, Arc::new(advisor), market, accounts, cycles);

    // 3. Run
    info!(
        "Running {} strategies every {}s ({} cycles)",
        runner.strategies.len(),
        runner.interval_secs,
        if runner.cycles == 0 {
            "unbounded".to_string()
        } else {
            runner.cycles.to_string()
        }
    );
    let mut ticker = tokio::time::interval(Duration::from_secs(runner.interval_secs));
    let mut completed: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                break;
            }
        }

        for (id, result) in orchestrator.run_cycles(&runner.strategies).await {
            if let Err(e) = result {
                error!("Cycle of {} failed: {:#}", id, e);
            }
        }

        completed += 1;
        if runner.cycles != 0 && completed >= runner.cycles {
            break;
        }
    }

    info!("Runner finished after {} cycles", completed);
    Ok(())
}
