// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`RouteClient`]: the Switchboard-only component ("Router", §4.8/table
//! row I) that turns an inbound message into an accept-phase `route.execute`
//! call against the target butler's tool endpoint, and records the outcome
//! to `routing_log` for the dashboard.

use butler_core::message_inbox::TraceContext;
use butler_core::RequestId;
use butler_storage::{RegistryStore, RoutingLog};

use crate::error::RouterError;

pub struct RouteClient {
    http: reqwest::Client,
    registry: RegistryStore,
    routing_log: RoutingLog,
}

impl RouteClient {
    pub fn new(registry: RegistryStore, routing_log: RoutingLog) -> Self {
        Self { http: reqwest::Client::new(), registry, routing_log }
    }

    /// Looks up `target_butler`'s endpoint URL and performs the accept-phase
    /// `route.execute` call. Returns the target's acknowledged `request_id`
    /// (which may differ from `preferred_request_id` only when ingress
    /// deduplication short-circuited to a prior accept). Every call, success
    /// or failure, is recorded in `routing_log`.
    pub async fn route(
        &self,
        target_butler: &str,
        preferred_request_id: RequestId,
        prompt: &str,
        source_channel: &str,
        source_endpoint_identity: &str,
        sender_identity: &str,
        trace_context: &TraceContext,
        idempotency_key: Option<&str>,
    ) -> Result<RequestId, RouterError> {
        let entry = self
            .registry
            .find(target_butler)
            .await?
            .ok_or_else(|| RouterError::UnknownTarget(target_butler.to_string()))?;

        let args = serde_json::json!({
            "request_id": preferred_request_id.to_string(),
            "prompt": prompt,
            "source_channel": source_channel,
            "source_metadata": {
                "endpoint_identity": source_endpoint_identity,
                "sender_identity": sender_identity,
            },
            "trace_context": {
                "trace_id": trace_context.trace_id,
                "span_id": trace_context.span_id,
            },
            "idempotency_key": idempotency_key,
        });

        match crate::mcp_client::call_tool(&self.http, &entry.endpoint_url, "route.execute", args).await {
            Ok(value) => {
                let request_id = value
                    .get("request_id")
                    .and_then(|v| v.as_str())
                    .and_then(|s| RequestId::parse_str(s).ok())
                    .unwrap_or(preferred_request_id);
                self.routing_log.record(request_id, target_butler, "accepted", Some(value)).await?;
                Ok(request_id)
            }
            Err(reason) => {
                self.routing_log
                    .record(preferred_request_id, target_butler, "failed", Some(serde_json::json!({ "reason": reason })))
                    .await?;
                Err(RouterError::Accept { target: target_butler.to_string(), reason })
            }
        }
    }
}

#[cfg(test)]
#[path = "route_client_tests.rs"]
mod tests;
