// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`MessageInbox`] — the accept-phase handoff row stored per target
//! butler. A row in `accepted` or `dispatching` at startup must be
//! re-dispatched by the process-phase worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::RequestId;

/// Where the inbound message came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceChannel {
    Telegram,
    Email,
    Http,
}

crate::simple_display! {
    SourceChannel {
        Telegram => "telegram",
        Email => "email",
        Http => "http",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Accepted,
    Dispatching,
    InProgress,
    Parsed,
    Errored,
}

crate::simple_display! {
    LifecycleState {
        Accepted => "accepted",
        Dispatching => "dispatching",
        InProgress => "in_progress",
        Parsed => "parsed",
        Errored => "errored",
    }
}

impl LifecycleState {
    /// States that, if found at startup, mark the row as in need of
    /// crash-recovery re-dispatch.
    pub fn needs_recovery(self) -> bool {
        matches!(self, Self::Accepted | Self::Dispatching)
    }

    /// Whether `next` is a legal successor of `self` in the process-phase
    /// state machine `accepted -> dispatching -> in_progress -> {parsed, errored}`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Accepted, Self::Dispatching)
                | (Self::Dispatching, Self::InProgress)
                | (Self::Dispatching, Self::Errored)
                | (Self::InProgress, Self::Parsed)
                | (Self::InProgress, Self::Errored)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceContext {
    pub trace_id: String,
    pub span_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInbox {
    pub request_id: RequestId,
    pub source_channel: SourceChannel,
    pub source_endpoint_identity: String,
    pub sender_identity: String,
    pub prompt: String,
    pub trace_context: TraceContext,
    pub lifecycle_state: LifecycleState,
    pub classification: Option<serde_json::Value>,
    pub routing_results: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    /// Present when ingress deduplication is enabled; duplicates with the
    /// same key short-circuit to the prior result instead of re-accepting.
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("illegal inbox lifecycle transition {from} -> {to}")]
pub struct IllegalLifecycleTransition {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

#[cfg(test)]
#[path = "message_inbox_tests.rs"]
mod tests;
