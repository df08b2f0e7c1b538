// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness (§4.9): the client-side [`HeartbeatReporter`] every
//! non-Switchboard butler runs, and the Switchboard-side `/api/heartbeat`
//! handler that updates `last_seen_at` and applies
//! [`butler_core::ButlerRegistryEntry::heartbeat_transition`].

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use butler_storage::RegistryStore;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Reports this butler's liveness to the Switchboard on a fixed interval.
/// The first beat fires immediately at startup (within the spec's 5s
/// budget); connection failures log a warning and never stop the loop.
/// On shutdown the loop is cancelled before any module `on_shutdown` runs
/// and no final beat is sent.
pub struct HeartbeatReporter {
    http: reqwest::Client,
    switchboard_url: String,
    butler_name: String,
    interval: Duration,
}

impl HeartbeatReporter {
    pub fn new(switchboard_url: impl Into<String>, butler_name: impl Into<String>, interval: Duration) -> Self {
        Self { http: reqwest::Client::new(), switchboard_url: switchboard_url.into(), butler_name: butler_name.into(), interval }
    }

    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            self.beat_once().await;
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    async fn beat_once(&self) {
        let url = format!("{}/api/heartbeat", self.switchboard_url.trim_end_matches('/'));
        match self.http.post(&url).json(&serde_json::json!({ "butler_name": self.butler_name })).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(butler_name = %self.butler_name, "heartbeat accepted");
            }
            Ok(response) => {
                tracing::warn!(butler_name = %self.butler_name, status = %response.status(), "heartbeat rejected by switchboard");
            }
            Err(err) => {
                tracing::warn!(butler_name = %self.butler_name, error = %err, "heartbeat request failed");
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct HeartbeatRequest {
    butler_name: String,
}

#[derive(Debug, Serialize)]
struct HeartbeatResponse {
    butler_name: String,
    eligibility_state: String,
}

/// Builds the Switchboard's `POST /api/heartbeat` route (§6). Mounted
/// alongside the tool endpoint on the Switchboard's own daemon port.
pub fn heartbeat_router(registry: Arc<RegistryStore>) -> Router {
    Router::new().route("/api/heartbeat", post(handle_heartbeat)).with_state(registry)
}

async fn handle_heartbeat(State(registry): State<Arc<RegistryStore>>, Json(body): Json<HeartbeatRequest>) -> Response {
    let entry = match registry.find(&body.butler_name).await {
        Ok(Some(entry)) => entry,
        Ok(None) => return (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "unknown butler" }))).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "registry lookup failed while handling heartbeat");
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": err.to_string() }))).into_response();
        }
    };

    let transition = entry.heartbeat_transition();
    if let Err(err) = registry.record_heartbeat(&body.butler_name, transition).await {
        tracing::error!(error = %err, "failed to record heartbeat");
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": err.to_string() }))).into_response();
    }

    let eligibility_state = transition.map(|(to, _)| to).unwrap_or(entry.eligibility_state);
    (
        StatusCode::OK,
        Json(HeartbeatResponse { butler_name: body.butler_name, eligibility_state: eligibility_state.to_string() }),
    )
        .into_response()
}

#[cfg(test)]
#[path = "liveness_tests.rs"]
mod tests;
