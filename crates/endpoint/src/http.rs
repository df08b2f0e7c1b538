// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mounts [`ButlerToolServer`] behind the streamable-HTTP transport (§6):
//! `POST/GET /mcp`, with the `session_id` query parameter (§4.7) captured
//! before the request reaches rmcp's own session machinery.

use std::sync::Arc;

use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::tower::{StreamableHttpServerConfig, StreamableHttpService};

use crate::registry::ToolRegistry;
use crate::server::ButlerToolServer;

/// Builds the axum [`Router`] mounting the tool catalog at `/mcp`. The
/// caller nests this under its own app router and owns the bind address.
pub fn tool_endpoint_router(butler_name: String, registry: Arc<ToolRegistry>) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(ButlerToolServer::new(butler_name.clone(), registry.clone())),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    );

    Router::new().nest_service("/mcp", service).layer(middleware::from_fn(stamp_session_id))
}

/// Parses `?session_id=...` off the raw query string and stashes it as an
/// extension so [`crate::server::ButlerToolServer::call_tool`] can thread
/// it into every tool call's [`crate::tool::ToolContext`].
async fn stamp_session_id(mut request: axum::extract::Request, next: Next) -> Response {
    if let Some(raw_id) = request.uri().query().and_then(find_session_id_param) {
        if let Ok(id) = butler_core::SessionId::parse_str(&raw_id) {
            request.extensions_mut().insert(id);
        }
    }
    next.run(request).await
}

fn find_session_id_param(query: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == "session_id").then(|| value.to_string())
    })
}
