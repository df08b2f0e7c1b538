// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `butler status`

use anyhow::Result;

use crate::client::ButlerClient;
use crate::output::{self, OutputFormat};

pub async fn handle(client: &ButlerClient, format: OutputFormat) -> Result<()> {
    let value = client.call_tool("status", serde_json::Value::Null).await?;
    output::print_value(format, &value);
    Ok(())
}
