// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`ButlerToolServer`]: the rmcp [`ServerHandler`] wrapping a
//! [`ToolRegistry`] (§4.7, §6). One instance is shared across every
//! connected transport; tool calls carry an optional `session_id` argument
//! threaded into the [`ToolContext`] for correlation.

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
    ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData, ServerHandler};

use crate::registry::ToolRegistry;
use crate::tool::ToolContext;

pub struct ButlerToolServer {
    butler_name: String,
    registry: Arc<ToolRegistry>,
}

impl ButlerToolServer {
    pub fn new(butler_name: String, registry: Arc<ToolRegistry>) -> Self {
        Self { butler_name, registry }
    }
}

impl ServerHandler for ButlerToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation { name: format!("butler-{}", self.butler_name), version: env!("CARGO_PKG_VERSION").to_string() },
            instructions: Some("Core tool set plus this butler's module tools, namespaced `<module>.<tool>`.".to_string()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult { tools: self.tools(), next_cursor: None })
    }

    async fn call_tool(&self, request: CallToolRequestParam, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let session_id = session_id_from_context(&context);
        self.dispatch(&request.name, request.arguments, session_id).await
    }
}

impl ButlerToolServer {
    fn tools(&self) -> Vec<Tool> {
        self.registry
            .descriptions()
            .into_iter()
            .map(|(name, description)| Tool {
                name: name.into(),
                description: Some(description.into()),
                input_schema: Arc::new(serde_json::Map::new()),
                annotations: None,
            })
            .collect()
    }

    /// The part of [`ServerHandler::call_tool`] that doesn't need an rmcp
    /// [`RequestContext`] — split out so it's testable without one.
    async fn dispatch(
        &self,
        name: &str,
        arguments: Option<serde_json::Map<String, serde_json::Value>>,
        session_id: Option<butler_core::SessionId>,
    ) -> Result<CallToolResult, ErrorData> {
        let handler = self.registry.get(name).ok_or_else(|| ErrorData::invalid_params(format!("unknown tool {name:?}"), None))?;

        let args = arguments.map(serde_json::Value::Object).unwrap_or(serde_json::Value::Null);
        let ctx = ToolContext { session_id };

        match handler.call(args, &ctx).await {
            Ok(value) => {
                let text = serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string());
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(err) => Ok(CallToolResult::error(vec![Content::text(err.to_string())])),
        }
    }
}

/// The `session_id` query parameter (§4.7) arrives as extension state on
/// the transport; absent outside an in-flight LLM invocation.
fn session_id_from_context(context: &RequestContext<RoleServer>) -> Option<butler_core::SessionId> {
    context.extensions.get::<butler_core::SessionId>().copied()
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
