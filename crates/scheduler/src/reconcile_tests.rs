// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use butler_core::{DispatchMode, ScheduleEntryConfig, ScheduleSource};
use butler_storage::Db;

use super::*;

fn entry(name: &str, cron: &str, prompt: &str) -> ScheduleEntryConfig {
    ScheduleEntryConfig {
        name: name.to_string(),
        cron: cron.to_string(),
        dispatch_mode: DispatchMode::Prompt,
        prompt: Some(prompt.to_string()),
        job_name: None,
        job_args: None,
        stagger_key: None,
        until_at: None,
        timezone: None,
        start_at: None,
        end_at: None,
        display_title: None,
    }
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn inserts_new_entries_as_toml_sourced(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    reconcile(&store, &[entry("daily", "0 9 * * *", "hello")], Utc::now()).await.unwrap();

    let task = store.find_by_name("daily").await.unwrap().unwrap();
    assert_eq!(task.source, ScheduleSource::Toml);
    assert!(task.next_run_at.is_some());
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn updates_changed_prompt_and_recomputes_next_run_at(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    let now = Utc::now();
    reconcile(&store, &[entry("daily", "0 9 * * *", "hello")], now).await.unwrap();
    let first = store.find_by_name("daily").await.unwrap().unwrap();

    reconcile(&store, &[entry("daily", "0 9 * * *", "goodbye")], now).await.unwrap();
    let second = store.find_by_name("daily").await.unwrap().unwrap();

    assert_eq!(second.payload, DispatchPayload::Prompt { prompt: "goodbye".to_string() });
    assert_eq!(second.next_run_at, first.next_run_at);
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn entries_missing_from_config_are_disabled_not_deleted(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    reconcile(&store, &[entry("daily", "0 9 * * *", "hello")], Utc::now()).await.unwrap();
    reconcile(&store, &[], Utc::now()).await.unwrap();

    let task = store.find_by_name("daily").await.unwrap().unwrap();
    assert!(!task.enabled);
    assert!(task.next_run_at.is_none());
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn reappearing_entry_resumes_enabled(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    reconcile(&store, &[entry("daily", "0 9 * * *", "hello")], Utc::now()).await.unwrap();
    reconcile(&store, &[], Utc::now()).await.unwrap();
    reconcile(&store, &[entry("daily", "0 9 * * *", "hello")], Utc::now()).await.unwrap();

    let task = store.find_by_name("daily").await.unwrap().unwrap();
    assert!(task.enabled);
    assert!(task.next_run_at.is_some());
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn unchanged_entry_leaves_row_untouched(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    let now = Utc::now();
    reconcile(&store, &[entry("daily", "0 9 * * *", "hello")], now).await.unwrap();
    let first = store.find_by_name("daily").await.unwrap().unwrap();

    reconcile(&store, &[entry("daily", "0 9 * * *", "hello")], now + chrono::Duration::hours(1)).await.unwrap();
    let second = store.find_by_name("daily").await.unwrap().unwrap();

    assert_eq!(first.next_run_at, second.next_run_at);
}
