// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `butler state {get,set,delete,list}`

use anyhow::Result;
use clap::Subcommand;

use crate::client::ButlerClient;
use crate::output::{self, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum StateCommand {
    /// Reads one entry by key.
    Get { key: String },
    /// Writes an entry, creating or versioning it. `value` is parsed as JSON.
    Set { key: String, value: String },
    /// Deletes an entry; deleting an absent key is not an error.
    Delete { key: String },
    /// Lists entries, optionally filtered by key prefix.
    List {
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        keys_only: bool,
    },
}

pub async fn handle(client: &ButlerClient, command: StateCommand, format: OutputFormat) -> Result<()> {
    let value = match command {
        StateCommand::Get { key } => client.call_tool("state.get", serde_json::json!({ "key": key })).await?,
        StateCommand::Set { key, value } => {
            let parsed: serde_json::Value = serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value.clone()));
            client.call_tool("state.set", serde_json::json!({ "key": key, "value": parsed })).await?
        }
        StateCommand::Delete { key } => client.call_tool("state.delete", serde_json::json!({ "key": key })).await?,
        StateCommand::List { prefix, keys_only } => {
            client.call_tool("state.list", serde_json::json!({ "prefix": prefix, "keys_only": keys_only })).await?
        }
    };
    output::print_value(format, &value);
    Ok(())
}
