// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `butler`: the operator CLI against a running butler's tool endpoint.
//! A thin HTTP client — every subcommand is one JSON-RPC `tools/call`
//! against the core tool set `butler-endpoint` already registers.

mod client;
mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};

use client::ButlerClient;
use commands::remind::RemindArgs;
use commands::schedule::ScheduleCommand;
use commands::sessions::SessionsCommand;
use commands::state::StateCommand;
use output::OutputFormat;

const DEFAULT_ENDPOINT: &str = "http://localhost:40210";

#[derive(Debug, Parser)]
#[command(name = "butler", version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH")))]
struct Cli {
    /// Base URL of the target butler's tool endpoint.
    #[arg(long, env = "BUTLER_ENDPOINT", default_value = DEFAULT_ENDPOINT, global = true)]
    endpoint: String,

    /// Output rendering.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reports the target butler's name and liveness.
    Status,
    /// Reads, writes, and lists versioned state entries.
    State {
        #[command(subcommand)]
        command: StateCommand,
    },
    /// Lists, creates, updates, and deletes scheduled tasks.
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommand,
    },
    /// Lists and inspects LLM sessions and their token/cost aggregates.
    Sessions {
        #[command(subcommand)]
        command: SessionsCommand,
    },
    /// The N most token-expensive sessions.
    TopSessions {
        #[arg(long, default_value_t = 10)]
        n: u64,
    },
    /// Schedules a one-shot reminder.
    Remind(RemindArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = ButlerClient::new(cli.endpoint);

    match cli.command {
        Command::Status => commands::status::handle(&client, cli.format).await,
        Command::State { command } => commands::state::handle(&client, command, cli.format).await,
        Command::Schedule { command } => commands::schedule::handle(&client, command, cli.format).await,
        Command::Sessions { command } => commands::sessions::handle(&client, command, cli.format).await,
        Command::TopSessions { n } => commands::top_sessions::handle(&client, n, cli.format).await,
        Command::Remind(args) => commands::remind::handle(&client, args, cli.format).await,
    }
}
