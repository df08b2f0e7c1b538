// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`ChannelGateway`]: where the fixed `notify`/`get-attachment` core tools
//! (§4.7) land. Neither tool owns a channel itself — both forward to
//! whichever module the butler's config names as its messenger, keeping
//! channel-egress ownership (§4.4) with the module that actually holds the
//! credentials.

use async_trait::async_trait;

use crate::error::EndpointError;

#[async_trait]
pub trait ChannelGateway: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), EndpointError>;

    async fn get_attachment(&self, attachment_id: &str) -> Result<Vec<u8>, EndpointError>;
}

/// The default for a butler with no messenger module configured: both
/// calls fail clearly instead of silently no-opping.
pub struct NoMessengerGateway;

#[async_trait]
impl ChannelGateway for NoMessengerGateway {
    async fn notify(&self, _message: &str) -> Result<(), EndpointError> {
        Err(EndpointError::InvalidArguments {
            tool: "notify".to_string(),
            reason: "this butler has no messenger module configured".to_string(),
        })
    }

    async fn get_attachment(&self, _attachment_id: &str) -> Result<Vec<u8>, EndpointError> {
        Err(EndpointError::InvalidArguments {
            tool: "get-attachment".to_string(),
            reason: "this butler has no messenger module configured".to_string(),
        })
    }
}

/// Forwards to the fixed `notify`/`get_attachment` tool names on the named
/// messenger module — a module playing this role implements those two tool
/// names in addition to whatever channel-specific tools it registers.
pub struct ModuleChannelGateway {
    modules: std::sync::Arc<butler_modules::ModuleRegistry>,
    messenger_module: String,
}

impl ModuleChannelGateway {
    pub fn new(modules: std::sync::Arc<butler_modules::ModuleRegistry>, messenger_module: String) -> Self {
        Self { modules, messenger_module }
    }
}

#[async_trait]
impl ChannelGateway for ModuleChannelGateway {
    async fn notify(&self, message: &str) -> Result<(), EndpointError> {
        let module = self.modules.get(&self.messenger_module).ok_or_else(|| EndpointError::InvalidArguments {
            tool: "notify".to_string(),
            reason: format!("configured messenger module {:?} is not loaded", self.messenger_module),
        })?;
        module
            .call_tool("notify", serde_json::json!({ "message": message }))
            .await
            .map(|_| ())
            .map_err(|e| EndpointError::InvalidArguments { tool: "notify".to_string(), reason: e.to_string() })
    }

    async fn get_attachment(&self, attachment_id: &str) -> Result<Vec<u8>, EndpointError> {
        let module = self.modules.get(&self.messenger_module).ok_or_else(|| EndpointError::InvalidArguments {
            tool: "get-attachment".to_string(),
            reason: format!("configured messenger module {:?} is not loaded", self.messenger_module),
        })?;
        let result = module
            .call_tool("get_attachment", serde_json::json!({ "attachment_id": attachment_id }))
            .await
            .map_err(|e| EndpointError::InvalidArguments { tool: "get-attachment".to_string(), reason: e.to_string() })?;
        let encoded = result.get("base64").and_then(|v| v.as_str()).ok_or_else(|| EndpointError::InvalidArguments {
            tool: "get-attachment".to_string(),
            reason: "messenger module returned no base64 payload".to_string(),
        })?;
        base64_decode(encoded).map_err(|reason| EndpointError::InvalidArguments { tool: "get-attachment".to_string(), reason })
    }
}

fn base64_decode(s: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.decode(s).map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
