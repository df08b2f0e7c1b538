// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Session`] — one row per LLM invocation. Append-only except for the
//! single completion write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::trigger_source::TriggerSource;

crate::define_id! {
    /// Identifies a session row.
    pub struct SessionId("sess", v4);
}

crate::define_id! {
    /// Correlates an accept-phase `route.execute` call to its eventual
    /// session; UUIDv7 so lexicographic order tracks creation order.
    pub struct RequestId("req", v7);
}

/// One structured tool invocation made during a session, as recorded in the
/// `tool_calls` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub arguments: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// A session row before its completion write has landed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub prompt: String,
    pub trigger_source: TriggerSource,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<String>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub success: Option<bool>,
    pub error: Option<String>,
    pub duration_ms: Option<u64>,
    pub trace_id: String,
    pub model: Option<String>,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub cost: Option<f64>,
    pub request_id: Option<RequestId>,
}

/// The single allowed completion write for a session row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCompletion {
    pub completed_at: DateTime<Utc>,
    pub result: Option<String>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub model: Option<String>,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub cost: Option<f64>,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("completed_at ({completed_at}) precedes started_at ({started_at})")]
    CompletedBeforeStarted { started_at: DateTime<Utc>, completed_at: DateTime<Utc> },
    #[error("a failed session must carry a non-empty error message")]
    FailureMissingError,
}

impl SessionCompletion {
    /// Enforces the spec invariant that `completed_at >= started_at` and
    /// that failed completions always carry a non-empty `error`.
    pub fn validate(&self, started_at: DateTime<Utc>) -> Result<(), SessionError> {
        if self.completed_at < started_at {
            return Err(SessionError::CompletedBeforeStarted { started_at, completed_at: self.completed_at });
        }
        if !self.success && self.error.as_deref().unwrap_or("").is_empty() {
            return Err(SessionError::FailureMissingError);
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct SessionBuilder => Session {
        computed { id: SessionId = SessionId::new() }
        into { prompt: String = "hello" }
        set { trigger_source: TriggerSource = TriggerSource::External }
        computed { started_at: DateTime<Utc> = Utc::now() }
        set { completed_at: Option<DateTime<Utc>> = None }
        set { result: Option<String> = None }
        set { tool_calls: Vec<ToolCallRecord> = Vec::new() }
        set { success: Option<bool> = None }
        set { error: Option<String> = None }
        set { duration_ms: Option<u64> = None }
        into { trace_id: String = "trace-test" }
        set { model: Option<String> = None }
        set { input_tokens: Option<u64> = None }
        set { output_tokens: Option<u64> = None }
        set { cost: Option<f64> = None }
        set { request_id: Option<RequestId> = None }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
