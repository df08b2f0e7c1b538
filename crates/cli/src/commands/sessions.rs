// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `butler sessions {list,show,summary,daily}`

use anyhow::Result;
use clap::Subcommand;

use crate::client::ButlerClient;
use crate::output::{self, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum SessionsCommand {
    /// Lists recent sessions, newest first.
    List {
        #[arg(long, default_value_t = 50)]
        limit: u64,
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// Shows one session by id.
    Show { session_id: String },
    /// Per-model token/cost aggregate since a given RFC3339 timestamp
    /// (defaults to the last 24 hours).
    Summary {
        #[arg(long)]
        since: Option<String>,
    },
    /// Daily per-model token/cost time series.
    Daily {
        #[arg(long, default_value_t = 14)]
        days: u64,
    },
}

pub async fn handle(client: &ButlerClient, command: SessionsCommand, format: OutputFormat) -> Result<()> {
    let value = match command {
        SessionsCommand::List { limit, offset } => {
            client.call_tool("sessions.list", serde_json::json!({ "limit": limit, "offset": offset })).await?
        }
        SessionsCommand::Show { session_id } => {
            client.call_tool("sessions.get", serde_json::json!({ "session_id": session_id })).await?
        }
        SessionsCommand::Summary { since } => client.call_tool("sessions.summary", serde_json::json!({ "since": since })).await?,
        SessionsCommand::Daily { days } => client.call_tool("sessions.daily", serde_json::json!({ "days": days })).await?,
    };
    output::print_value(format, &value);
    Ok(())
}
