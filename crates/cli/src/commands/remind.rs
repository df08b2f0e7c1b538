// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `butler remind`

use anyhow::Result;

use crate::client::ButlerClient;
use crate::output::{self, OutputFormat};

#[derive(Debug, clap::Args)]
pub struct RemindArgs {
    pub message: String,
    #[arg(long)]
    pub channel: String,
    #[arg(long, conflicts_with = "remind_at")]
    pub delay_minutes: Option<i64>,
    #[arg(long, conflicts_with = "delay_minutes")]
    pub remind_at: Option<String>,
}

pub async fn handle(client: &ButlerClient, args: RemindArgs, format: OutputFormat) -> Result<()> {
    let value = client
        .call_tool(
            "remind",
            serde_json::json!({
                "message": args.message,
                "channel": args.channel,
                "delay_minutes": args.delay_minutes,
                "remind_at": args.remind_at,
            }),
        )
        .await?;
    output::print_value(format, &value);
    Ok(())
}
