// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by [`crate::client::ButlerClient`]. Command handlers
//! convert these into `anyhow::Error` at the top of `main`; this crate is
//! the one place in the workspace where that's acceptable.

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("{tool} returned HTTP {status}")]
    HttpStatus { tool: String, status: u16 },

    #[error("{tool} call failed: {reason}")]
    ToolError { tool: String, reason: String },

    #[error("malformed response from {tool}: {reason}")]
    MalformedResponse { tool: String, reason: String },
}
