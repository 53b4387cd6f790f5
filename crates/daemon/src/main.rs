// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! thd: gate worker daemon
//!
//! Claims jobs from the spool queue and runs each through fetch, validation
//! and log analysis until stopped.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use th_daemon::{env, logging, shutdown_signal, startup, Config};
use th_engine::JobOutcome;

#[derive(Parser)]
#[command(name = "thd", version, about = "Gate worker daemon")]
struct Cli {
    /// Config file (default: $TH_CONFIG, then <config_dir>/turbo-hipster/config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Handle a single job, then exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = env::config_path(cli.config)?;
    let config = Config::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let _log_guard = logging::init(config.log_dir.as_deref())?;

    let max_jobs = cli.once.then_some(1);
    let daemon = startup(&config, &env::hostname(), max_jobs)?;

    let handle = daemon.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        handle.stop();
    });

    let reports = daemon.run().await;
    let excepted = reports.iter().filter(|r| r.outcome == JobOutcome::Excepted).count();
    tracing::info!(jobs = reports.len(), excepted, "daemon exiting");
    Ok(())
}
