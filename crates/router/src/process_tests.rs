// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use async_trait::async_trait;
use butler_core::message_inbox::{LifecycleState, MessageInbox, SourceChannel, TraceContext};
use butler_core::RequestId;
use butler_spawner::env::EmptyCredentialResolver;
use butler_spawner::{AdapterError, EnvBuilder, InvocationOutcome, InvocationRequest, McpConfig, RuntimeAdapter};
use butler_storage::{Db, SessionLog};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::*;

struct FakeAdapter {
    outcome: Result<InvocationOutcome, &'static str>,
}

impl FakeAdapter {
    fn ok() -> Self {
        Self { outcome: Ok(InvocationOutcome { result: "done".to_string(), ..Default::default() }) }
    }

    fn failing() -> Self {
        Self { outcome: Err("boom") }
    }
}

#[async_trait]
impl RuntimeAdapter for FakeAdapter {
    fn binary_name(&self) -> &'static str {
        "fake"
    }

    async fn build_config_file(&self, _mcp_config: &McpConfig) -> Result<std::path::PathBuf, AdapterError> {
        Ok(std::path::PathBuf::new())
    }

    async fn parse_system_prompt_file(&self, _path: &std::path::Path) -> Result<String, AdapterError> {
        Ok(String::new())
    }

    async fn invoke(&self, _request: InvocationRequest) -> Result<InvocationOutcome, AdapterError> {
        self.outcome.clone().map_err(|e| AdapterError::NonZeroExit { binary: "fake", status: 1, stderr: e.to_string() })
    }

    async fn reset(&self) {}
}

fn spawner_with(adapter: FakeAdapter, session_log: SessionLog) -> Spawner {
    Spawner::new(
        "concierge",
        4,
        4,
        std::sync::Arc::new(adapter),
        session_log,
        EnvBuilder::new(vec![], vec![], vec![]),
        std::sync::Arc::new(EmptyCredentialResolver),
        "http://localhost:9000/mcp",
        None,
    )
}

fn inbox_row(lifecycle_state: LifecycleState) -> MessageInbox {
    MessageInbox {
        request_id: RequestId::new(),
        source_channel: SourceChannel::Http,
        source_endpoint_identity: "switchboard".into(),
        sender_identity: "user-1".into(),
        prompt: "what's on my calendar today".into(),
        trace_context: TraceContext { trace_id: "trace-route-1".into(), span_id: None },
        lifecycle_state,
        classification: None,
        routing_results: None,
        created_at: Utc::now(),
        idempotency_key: None,
    }
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn process_one_drives_an_accepted_row_to_parsed_on_success(pool: sqlx::PgPool) {
    let db = Db::from_pool_for_test(pool);
    let inbox = MessageInboxStore::new(db.clone());
    let session_log = SessionLog::new(db);
    let spawner = std::sync::Arc::new(spawner_with(FakeAdapter::ok(), session_log));

    let row = inbox_row(LifecycleState::Accepted);
    let request_id = row.request_id;
    inbox.accept(&row).await.unwrap();

    let worker = ProcessWorker::new(inbox.clone(), spawner, Duration::from_millis(10));
    worker.process_one(row).await;

    let final_row = inbox.get(request_id).await.unwrap().unwrap();
    assert_eq!(final_row.lifecycle_state, LifecycleState::Parsed);
    assert!(final_row.routing_results.is_some());
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn process_one_marks_a_row_errored_when_the_adapter_fails(pool: sqlx::PgPool) {
    let db = Db::from_pool_for_test(pool);
    let inbox = MessageInboxStore::new(db.clone());
    let session_log = SessionLog::new(db);
    let spawner = std::sync::Arc::new(spawner_with(FakeAdapter::failing(), session_log));

    let row = inbox_row(LifecycleState::Accepted);
    let request_id = row.request_id;
    inbox.accept(&row).await.unwrap();

    let worker = ProcessWorker::new(inbox.clone(), spawner, Duration::from_millis(10));
    worker.process_one(row).await;

    let final_row = inbox.get(request_id).await.unwrap().unwrap();
    assert_eq!(final_row.lifecycle_state, LifecycleState::Errored);
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn process_one_resumes_a_dispatching_row_without_reinserting_the_transition(pool: sqlx::PgPool) {
    let db = Db::from_pool_for_test(pool);
    let inbox = MessageInboxStore::new(db.clone());
    let session_log = SessionLog::new(db);
    let spawner = std::sync::Arc::new(spawner_with(FakeAdapter::ok(), session_log));

    let mut row = inbox_row(LifecycleState::Accepted);
    let request_id = row.request_id;
    inbox.accept(&row).await.unwrap();
    inbox.transition(request_id, LifecycleState::Dispatching, None, None).await.unwrap();
    row.lifecycle_state = LifecycleState::Dispatching;

    let worker = ProcessWorker::new(inbox.clone(), spawner, Duration::from_millis(10));
    worker.process_one(row).await;

    let final_row = inbox.get(request_id).await.unwrap().unwrap();
    assert_eq!(final_row.lifecycle_state, LifecycleState::Parsed);
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn recover_on_startup_redispatches_every_accepted_or_dispatching_row(pool: sqlx::PgPool) {
    let db = Db::from_pool_for_test(pool);
    let inbox = MessageInboxStore::new(db.clone());
    let session_log = SessionLog::new(db);
    let spawner = std::sync::Arc::new(spawner_with(FakeAdapter::ok(), session_log));

    let accepted = inbox_row(LifecycleState::Accepted);
    let accepted_id = accepted.request_id;
    inbox.accept(&accepted).await.unwrap();

    let worker = ProcessWorker::new(inbox.clone(), spawner, Duration::from_millis(10));
    worker.recover_on_startup().await;

    let final_row = inbox.get(accepted_id).await.unwrap().unwrap();
    assert_eq!(final_row.lifecycle_state, LifecycleState::Parsed);
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn run_stops_promptly_once_cancelled(pool: sqlx::PgPool) {
    let db = Db::from_pool_for_test(pool);
    let inbox = MessageInboxStore::new(db.clone());
    let session_log = SessionLog::new(db);
    let spawner = std::sync::Arc::new(spawner_with(FakeAdapter::ok(), session_log));

    let worker = ProcessWorker::new(inbox, spawner, Duration::from_secs(30));
    let cancel = CancellationToken::new();
    let cancel_for_run = cancel.clone();

    let handle = tokio::spawn(async move { worker.run(cancel_for_run).await });
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
}
