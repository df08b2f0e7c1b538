// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`ButlerClient`]: a thin JSON-RPC client against a running butler's
//! tool endpoint (the same streamable-HTTP `/mcp` surface `butler-router`
//! talks to for accept-phase routing), used by every `butler` subcommand.

use crate::error::ClientError;

pub struct ButlerClient {
    http: reqwest::Client,
    base_url: String,
}

impl ButlerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }

    /// Calls `tool_name` with `arguments`, returning the JSON value the
    /// tool handler produced. Tool-level errors (the handler returned
    /// `Err`, reported as `is_error: true`) and transport-level failures
    /// both surface as [`ClientError`].
    pub async fn call_tool(&self, tool_name: &str, arguments: serde_json::Value) -> Result<serde_json::Value, ClientError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": tool_name, "arguments": arguments },
        });

        let url = format!("{}/mcp", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("accept", "application/json, text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.clone(), source })?;

        if !response.status().is_success() {
            return Err(ClientError::HttpStatus { tool: tool_name.to_string(), status: response.status().as_u16() });
        }

        let envelope: serde_json::Value = response
            .json()
            .await
            .map_err(|source| ClientError::Transport { url, source })?;

        let result = envelope.get("result").ok_or_else(|| ClientError::MalformedResponse {
            tool: tool_name.to_string(),
            reason: "missing result field".to_string(),
        })?;

        if result.get("isError").and_then(|v| v.as_bool()).unwrap_or(false) {
            let reason = first_content_text(result).unwrap_or_else(|| "unknown tool error".to_string());
            return Err(ClientError::ToolError { tool: tool_name.to_string(), reason });
        }

        let text = first_content_text(result).ok_or_else(|| ClientError::MalformedResponse {
            tool: tool_name.to_string(),
            reason: "missing content[0].text".to_string(),
        })?;

        serde_json::from_str(&text)
            .map_err(|e| ClientError::MalformedResponse { tool: tool_name.to_string(), reason: e.to_string() })
    }
}

fn first_content_text(result: &serde_json::Value) -> Option<String> {
    result.get("content")?.as_array()?.first()?.get("text")?.as_str().map(str::to_string)
}
