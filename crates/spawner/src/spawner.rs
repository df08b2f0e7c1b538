// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Spawner`]: ties the concurrency gate, environment isolation, and
//! session bracketing together around one [`RuntimeAdapter`] (§4.6).

use std::sync::Arc;
use std::time::Duration;

use butler_core::{RequestId, SessionCompletion, SessionId, TriggerSource};
use butler_storage::SessionLog;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::adapter::{InvocationRequest, McpConfig, RuntimeAdapter};
use crate::env::{CredentialResolver, EnvBuilder};
use crate::error::SpawnerError;
use crate::gate::SpawnGate;
use crate::memory::MemoryContext;

pub struct SpawnRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub trigger_source: TriggerSource,
    pub trace_id: String,
    pub request_id: Option<RequestId>,
}

#[derive(Debug, Clone)]
pub struct SpawnOutcome {
    pub session_id: SessionId,
    pub result: String,
}

pub struct Spawner {
    butler_name: String,
    gate: SpawnGate,
    adapter: Arc<dyn RuntimeAdapter>,
    session_log: SessionLog,
    env_builder: EnvBuilder,
    credential_resolver: Arc<dyn CredentialResolver>,
    tool_endpoint_base_url: String,
    memory: Option<Arc<dyn MemoryContext>>,
    cancel: CancellationToken,
}

impl Spawner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        butler_name: impl Into<String>,
        max_concurrent_sessions: u32,
        max_queued_sessions: u32,
        adapter: Arc<dyn RuntimeAdapter>,
        session_log: SessionLog,
        env_builder: EnvBuilder,
        credential_resolver: Arc<dyn CredentialResolver>,
        tool_endpoint_base_url: impl Into<String>,
        memory: Option<Arc<dyn MemoryContext>>,
    ) -> Self {
        Self {
            butler_name: butler_name.into(),
            gate: SpawnGate::new(max_concurrent_sessions, max_queued_sessions),
            adapter,
            session_log,
            env_builder,
            credential_resolver,
            tool_endpoint_base_url: tool_endpoint_base_url.into(),
            memory,
            cancel: CancellationToken::new(),
        }
    }

    /// Acquires a gate permit, brackets one runtime invocation with a
    /// session create/complete pair, and returns the adapter's result
    /// text. The gate permit and a fresh cancellation child token are
    /// both scoped to this call.
    pub async fn invoke(&self, request: SpawnRequest) -> Result<SpawnOutcome, SpawnerError> {
        let _permit = self.gate.acquire(&request.trigger_source).await?;

        let session_id = self
            .session_log
            .create(&request.prompt, &request.trigger_source, &request.trace_id, None, request.request_id)
            .await?;

        let span = tracing::info_span!("spawner.invoke", %session_id, trigger_source = %request.trigger_source);
        self.run_invocation(session_id, request).instrument(span).await
    }

    async fn run_invocation(&self, session_id: SessionId, request: SpawnRequest) -> Result<SpawnOutcome, SpawnerError> {
        let started = tokio::time::Instant::now();

        let memory_context = match &self.memory {
            Some(memory) => memory.fetch_memory_context(&request.prompt).await,
            None => None,
        };
        let system_prompt = match (request.system_prompt, memory_context) {
            (Some(base), Some(ctx)) => format!("{base}\n\n{ctx}"),
            (Some(base), None) => base,
            (None, Some(ctx)) => ctx,
            (None, None) => String::new(),
        };

        let env = self.env_builder.build(self.credential_resolver.as_ref());
        let mcp_config = McpConfig::new(&self.butler_name, &self.tool_endpoint_base_url, session_id);
        let invocation = InvocationRequest { prompt: request.prompt.clone(), system_prompt, env, mcp_config };

        let outcome = tokio::select! {
            result = self.adapter.invoke(invocation) => Some(result),
            _ = self.cancel.cancelled() => None,
        };

        self.adapter.reset().await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let Some(outcome) = outcome else {
            self.complete_cancelled(session_id, duration_ms).await?;
            return Err(SpawnerError::Cancelled);
        };

        match outcome {
            Ok(invocation_outcome) => {
                let completion = SessionCompletion {
                    completed_at: chrono::Utc::now(),
                    result: Some(invocation_outcome.result.clone()),
                    tool_calls: invocation_outcome.tool_calls,
                    success: true,
                    error: None,
                    duration_ms,
                    model: invocation_outcome.model,
                    input_tokens: invocation_outcome.input_tokens,
                    output_tokens: invocation_outcome.output_tokens,
                    cost: invocation_outcome.cost,
                };
                self.session_log.complete(session_id, completion).await?;

                if let Some(memory) = &self.memory {
                    memory.store_session_episode(session_id, &request.prompt, &invocation_outcome.result).await;
                }

                Ok(SpawnOutcome { session_id, result: invocation_outcome.result })
            }
            Err(adapter_error) => {
                let completion = SessionCompletion {
                    completed_at: chrono::Utc::now(),
                    result: None,
                    tool_calls: Vec::new(),
                    success: false,
                    error: Some(adapter_error.to_string()),
                    duration_ms,
                    model: None,
                    input_tokens: None,
                    output_tokens: None,
                    cost: None,
                };
                self.session_log.complete(session_id, completion).await?;
                Err(SpawnerError::RuntimeInvocation(adapter_error.to_string()))
            }
        }
    }

    async fn complete_cancelled(&self, session_id: SessionId, duration_ms: u64) -> Result<(), SpawnerError> {
        let completion = SessionCompletion {
            completed_at: chrono::Utc::now(),
            result: None,
            tool_calls: Vec::new(),
            success: false,
            error: Some("cancelled".to_string()),
            duration_ms,
            model: None,
            input_tokens: None,
            output_tokens: None,
            cost: None,
        };
        self.session_log.complete(session_id, completion).await?;
        Ok(())
    }

    /// Flips the gate closed; further `invoke` calls fail immediately.
    /// Idempotent.
    pub fn stop_accepting(&self) {
        self.gate.stop_accepting();
    }

    /// Waits for in-flight sessions to finish, polling at a fixed
    /// interval, up to `timeout`. Remaining sessions are cancelled at the
    /// deadline and complete with `success=false, error="cancelled"`.
    pub async fn drain(&self, timeout: Duration) {
        self.stop_accepting();
        let deadline = tokio::time::Instant::now() + timeout;
        while self.gate.in_flight_count() > 0 {
            if tokio::time::Instant::now() >= deadline {
                self.cancel.cancel();
                self.gate.close();
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

#[cfg(test)]
#[path = "spawner_tests.rs"]
mod tests;
