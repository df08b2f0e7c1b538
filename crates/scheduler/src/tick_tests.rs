// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use butler_core::{DispatchPayload, ScheduledTask, TriggerSource};
use butler_storage::Db;

use super::*;

struct AlwaysOkPrompt {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl PromptDispatcher for AlwaysOkPrompt {
    async fn dispatch_prompt(&self, _prompt: &str, _trigger_source: TriggerSource) -> Result<serde_json::Value, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::json!({ "ok": true }))
    }
}

struct AlwaysErrJob;

#[async_trait]
impl JobDispatcher for AlwaysErrJob {
    async fn dispatch_job(
        &self,
        _job_name: &str,
        _job_args: serde_json::Value,
        _trigger_source: TriggerSource,
    ) -> Result<serde_json::Value, String> {
        Err("boom".to_string())
    }
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn fires_due_prompt_task_and_advances_schedule(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    let now = chrono::Utc::now();
    let mut task = ScheduledTask::builder()
        .name("daily")
        .cron("0 9 * * *")
        .stagger_key("daily")
        .payload(DispatchPayload::Prompt { prompt: "hello".into() })
        .build();
    task.next_run_at = Some(now);
    store.create(&task).await.unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let handler = TickHandler::new(
        store.clone(),
        Arc::new(AlwaysOkPrompt { calls: calls.clone() }),
        Arc::new(AlwaysErrJob),
    );

    let outcomes = handler.tick(now).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].success);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let reloaded = store.find_by_name("daily").await.unwrap().unwrap();
    assert!(reloaded.next_run_at.unwrap() > now);
    assert_eq!(reloaded.last_run_at, Some(now));
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn dispatch_failure_still_advances_schedule(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    let now = chrono::Utc::now();
    let mut task = ScheduledTask::builder()
        .name("failing")
        .cron("*/5 * * * *")
        .stagger_key("failing")
        .payload(DispatchPayload::Job { job_name: "noop".into(), job_args: serde_json::Value::Null })
        .build();
    task.next_run_at = Some(now);
    store.create(&task).await.unwrap();

    let handler = TickHandler::new(
        store.clone(),
        Arc::new(AlwaysOkPrompt { calls: Arc::new(AtomicUsize::new(0)) }),
        Arc::new(AlwaysErrJob),
    );

    let outcomes = handler.tick(now).await.unwrap();
    assert!(!outcomes[0].success);

    let reloaded = store.find_by_name("failing").await.unwrap().unwrap();
    assert!(reloaded.next_run_at.is_some());
    assert_eq!(reloaded.last_result, Some(serde_json::json!({ "error": "boom" })));
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn auto_disables_once_next_run_at_crosses_until_at(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    let now = chrono::Utc::now();
    let mut task = ScheduledTask::builder()
        .name("one-shot")
        .cron("*/1 * * * *")
        .stagger_key("one-shot")
        .payload(DispatchPayload::Job { job_name: "noop".into(), job_args: serde_json::Value::Null })
        .build();
    task.next_run_at = Some(now);
    task.until_at = Some(now);
    store.create(&task).await.unwrap();

    let handler = TickHandler::new(
        store.clone(),
        Arc::new(AlwaysOkPrompt { calls: Arc::new(AtomicUsize::new(0)) }),
        Arc::new(AlwaysErrJob),
    );

    handler.tick(now).await.unwrap();

    let reloaded = store.find_by_name("one-shot").await.unwrap().unwrap();
    assert!(!reloaded.enabled);
    assert!(reloaded.next_run_at.is_none());
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn due_tasks_dispatch_serially_in_next_run_at_order(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    let now = chrono::Utc::now();
    for (name, offset) in [("second", 5), ("first", 1)] {
        let mut task = ScheduledTask::builder()
            .name(name)
            .cron("0 9 * * *")
            .stagger_key(name)
            .payload(DispatchPayload::Prompt { prompt: "x".into() })
            .build();
        task.next_run_at = Some(now - chrono::Duration::seconds(offset));
        store.create(&task).await.unwrap();
    }

    let handler = TickHandler::new(
        store.clone(),
        Arc::new(AlwaysOkPrompt { calls: Arc::new(AtomicUsize::new(0)) }),
        Arc::new(AlwaysErrJob),
    );
    let outcomes = handler.tick(now).await.unwrap();
    assert_eq!(outcomes[0].task_name, "first");
    assert_eq!(outcomes[1].task_name, "second");
}
