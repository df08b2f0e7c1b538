// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `butler schedule {list,create,update,delete}`

use anyhow::Result;
use clap::Subcommand;

use crate::client::ButlerClient;
use crate::output::{self, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ScheduleCommand {
    /// Lists every scheduled task.
    List,
    /// Creates a db-sourced scheduled task. Exactly one of `--prompt` or
    /// `--job-name` is required.
    Create(ScheduleFields),
    /// Replaces a db-sourced scheduled task's definition by name.
    Update(ScheduleFields),
    /// Deletes a db-sourced scheduled task by name (toml-sourced tasks may
    /// only be disabled through config).
    Delete { name: String },
}

#[derive(Debug, clap::Args)]
pub struct ScheduleFields {
    pub name: String,
    #[arg(long)]
    pub cron: String,
    #[arg(long)]
    pub prompt: Option<String>,
    #[arg(long)]
    pub job_name: Option<String>,
    #[arg(long)]
    pub job_args: Option<String>,
    #[arg(long)]
    pub until_at: Option<String>,
    #[arg(long)]
    pub display_title: Option<String>,
}

fn fields_to_args(fields: ScheduleFields) -> serde_json::Value {
    let job_args = fields.job_args.and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok());
    serde_json::json!({
        "name": fields.name,
        "cron": fields.cron,
        "prompt": fields.prompt,
        "job_name": fields.job_name,
        "job_args": job_args,
        "until_at": fields.until_at,
        "display_title": fields.display_title,
    })
}

pub async fn handle(client: &ButlerClient, command: ScheduleCommand, format: OutputFormat) -> Result<()> {
    let value = match command {
        ScheduleCommand::List => client.call_tool("schedule.list", serde_json::Value::Null).await?,
        ScheduleCommand::Create(fields) => client.call_tool("schedule.create", fields_to_args(fields)).await?,
        ScheduleCommand::Update(fields) => client.call_tool("schedule.update", fields_to_args(fields)).await?,
        ScheduleCommand::Delete { name } => client.call_tool("schedule.delete", serde_json::json!({ "name": name })).await?,
    };
    output::print_value(format, &value);
    Ok(())
}
