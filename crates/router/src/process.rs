// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`ProcessWorker`]: the target-local process phase of §4.8. Runs on
//! every butler (not just the Switchboard) — whichever butler a message
//! was routed to owns draining its own `message_inbox`. Grounded in the
//! teacher's file-backed queue polling loop
//! (`listener/queues/workers.rs`'s `WorkerRecord` claim-and-advance shape),
//! generalized here to Postgres rows claimed with `FOR UPDATE SKIP LOCKED`.

use std::sync::Arc;
use std::time::Duration;

use butler_core::message_inbox::{LifecycleState, MessageInbox};
use butler_core::TriggerSource;
use butler_spawner::{SpawnRequest, Spawner};
use butler_storage::MessageInboxStore;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

const DEFAULT_BATCH_SIZE: i64 = 10;

pub struct ProcessWorker {
    message_inbox: MessageInboxStore,
    spawner: Arc<Spawner>,
    poll_interval: Duration,
}

impl ProcessWorker {
    pub fn new(message_inbox: MessageInboxStore, spawner: Arc<Spawner>, poll_interval: Duration) -> Self {
        Self { message_inbox, spawner, poll_interval }
    }

    /// Startup crash recovery (§4.8): every row left in `accepted` or
    /// `dispatching` from a prior process gets a fresh root span
    /// (`route.process.recovery`) with the original `request_id` preserved.
    pub async fn recover_on_startup(&self) {
        let rows = match self.message_inbox.recoverable().await {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(error = %err, "failed to list recoverable inbox rows at startup");
                return;
            }
        };
        for row in rows {
            let request_id = row.request_id;
            let span = tracing::info_span!("route.process.recovery", %request_id);
            self.process_one(row).instrument(span).await;
        }
    }

    /// The steady-state polling loop: claims a batch of due rows, processes
    /// each to completion, sleeps, repeats. Cancelled between iterations;
    /// an in-progress iteration is allowed to finish.
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            let batch = match self.message_inbox.claim_batch(DEFAULT_BATCH_SIZE).await {
                Ok(batch) => batch,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to claim inbox rows for processing");
                    Vec::new()
                }
            };
            for row in batch {
                let request_id = row.request_id;
                let span = tracing::info_span!("route.process", %request_id);
                self.process_one(row).instrument(span).await;
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    async fn process_one(&self, row: MessageInbox) {
        let request_id = row.request_id;

        if row.lifecycle_state == LifecycleState::Accepted {
            if let Err(err) = self.message_inbox.transition(request_id, LifecycleState::Dispatching, None, None).await {
                tracing::warn!(error = %err, %request_id, "failed to transition inbox row to dispatching");
                return;
            }
        }
        if let Err(err) = self.message_inbox.transition(request_id, LifecycleState::InProgress, None, None).await {
            tracing::warn!(error = %err, %request_id, "failed to transition inbox row to in_progress");
            return;
        }

        let outcome = self
            .spawner
            .invoke(SpawnRequest {
                prompt: row.prompt,
                system_prompt: None,
                trigger_source: TriggerSource::Route,
                trace_id: row.trace_context.trace_id,
                request_id: Some(request_id),
            })
            .await;

        let (to, routing_results) = match outcome {
            Ok(outcome) => (LifecycleState::Parsed, Some(serde_json::json!({ "session_id": outcome.session_id.to_string() }))),
            Err(err) => (LifecycleState::Errored, Some(serde_json::json!({ "error": err.to_string() }))),
        };
        if let Err(err) = self.message_inbox.transition(request_id, to, None, routing_results).await {
            tracing::warn!(error = %err, %request_id, "failed to transition inbox row to its terminal state");
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
