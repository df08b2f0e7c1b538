// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `butlerd`: one butler process. Loads a config document, runs the
//! phased startup sequence (§4.10), then blocks serving its tool
//! endpoint and background loops until a shutdown signal arrives.

use std::path::PathBuf;

use butler_daemon::orchestrator::Daemon;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "butlerd", version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH")))]
struct Cli {
    /// Path to this butler's config document.
    #[arg(long, env = "BUTLER_CONFIG")]
    config: PathBuf,

    /// Load and validate the config, print the result, and exit without
    /// starting the daemon.
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let cli = Cli::parse();

    let config = match butler_config::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, path = %cli.config.display(), "failed to load config");
            return Err(err.into());
        }
    };

    if cli.check_config {
        println!("config OK: butler {:?} on port {}", config.name, config.port);
        return Ok(());
    }

    let daemon = match Daemon::start(config).await {
        Ok(daemon) => daemon,
        Err(err) => {
            tracing::error!(error = %err, "butler failed to start");
            return Err(err.into());
        }
    };

    wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received, draining");
    daemon.shutdown().await;

    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let sigterm = signal(SignalKind::terminate());
    let sigint = signal(SignalKind::interrupt());
    let (Ok(mut sigterm), Ok(mut sigint)) = (sigterm, sigint) else {
        // Signal handler installation only fails if another handler for
        // the same signal exists in-process; fall back to ctrl-c.
        let _ = tokio::signal::ctrl_c().await;
        return;
    };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
        _ = sigint.recv() => tracing::info!("received SIGINT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("received ctrl-c");
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}
