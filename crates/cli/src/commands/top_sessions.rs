// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `butler top-sessions`

use anyhow::Result;

use crate::client::ButlerClient;
use crate::output::{self, OutputFormat};

pub async fn handle(client: &ButlerClient, n: u64, format: OutputFormat) -> Result<()> {
    let value = client.call_tool("top-sessions", serde_json::json!({ "n": n })).await?;
    output::print_value(format, &value);
    Ok(())
}
