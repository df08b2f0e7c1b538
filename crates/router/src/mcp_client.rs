// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A thin JSON-RPC client against another butler's tool endpoint (§6).
//! `butler-endpoint`'s `rmcp` server speaks MCP's streamable-HTTP
//! transport, which for a single `tools/call` request is plain JSON-RPC
//! 2.0 over one POST — no session negotiation or SSE stream needed for a
//! fire-and-forget accept-phase call.

use serde::Deserialize;

/// Calls `tool_name` on the butler whose tool endpoint is mounted at
/// `base_url` (e.g. `http://localhost:40210`), returning the JSON value the
/// tool handler produced. A tool-level error (the handler returned `Err`,
/// reported by the server as `is_error: true`) surfaces as `Err(String)`
/// with the tool's error text, same as a transport-level failure.
pub async fn call_tool(
    client: &reqwest::Client,
    base_url: &str,
    tool_name: &str,
    arguments: serde_json::Value,
) -> Result<serde_json::Value, String> {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": { "name": tool_name, "arguments": arguments },
    });

    let response = client
        .post(format!("{}/mcp", base_url.trim_end_matches('/')))
        .header("content-type", "application/json")
        .header("accept", "application/json, text/event-stream")
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(format!("{tool_name} call returned HTTP {}", response.status()));
    }

    let envelope: JsonRpcResponse = response.json().await.map_err(|e| e.to_string())?;
    if let Some(error) = envelope.error {
        return Err(error.message);
    }
    let result = envelope.result.ok_or_else(|| "tool response carried neither result nor error".to_string())?;
    if result.is_error.unwrap_or(false) {
        return Err(first_text(&result.content));
    }
    serde_json::from_str(&first_text(&result.content)).map_err(|e| e.to_string())
}

fn first_text(content: &[Content]) -> String {
    content.iter().find_map(|c| c.text.clone()).unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<CallToolResult>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CallToolResult {
    content: Vec<Content>,
    is_error: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Content {
    text: Option<String>,
}
