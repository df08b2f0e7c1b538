// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`ToolHandler`]: the uniform seam every core tool and every module tool
//! is dispatched through once the endpoint has resolved a tool name.

use async_trait::async_trait;
use butler_core::SessionId;

use crate::error::EndpointError;

/// Per-call context threaded through from the transport layer. `session_id`
/// is the query parameter an in-flight LLM invocation's tool calls carry,
/// correlating the call back to its session row.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub session_id: Option<SessionId>,
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn description(&self) -> &str;

    async fn call(&self, args: serde_json::Value, ctx: &ToolContext) -> Result<serde_json::Value, EndpointError>;
}

/// Wraps a plain async closure as a [`ToolHandler`] — most core tools are
/// a single storage or scheduler call with no state of their own.
pub struct FnTool<F> {
    description: &'static str,
    handler: F,
}

impl<F> FnTool<F> {
    pub fn new(description: &'static str, handler: F) -> Self {
        Self { description, handler }
    }
}

#[async_trait]
impl<F, Fut> ToolHandler for FnTool<F>
where
    F: Fn(serde_json::Value, ToolContext) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<serde_json::Value, EndpointError>> + Send,
{
    fn description(&self) -> &str {
        self.description
    }

    async fn call(&self, args: serde_json::Value, ctx: &ToolContext) -> Result<serde_json::Value, EndpointError> {
        (self.handler)(args, ctx.clone()).await
    }
}
