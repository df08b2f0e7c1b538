// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use butler_core::ScheduledTask;

fn task(name: &str) -> ScheduledTask {
    ScheduledTask::builder().name(name).stagger_key(name).build()
}

#[sqlx::test(migrator = "crate::db::MIGRATOR")]
async fn create_rejects_duplicate_names(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    store.create(&task("daily")).await.unwrap();
    let err = store.create(&task("daily")).await.unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));
}

#[sqlx::test(migrator = "crate::db::MIGRATOR")]
async fn delete_rejects_toml_sourced_rows(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    store.create(&task("daily")).await.unwrap();
    let err = store.delete("daily").await.unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));
}

#[sqlx::test(migrator = "crate::db::MIGRATOR")]
async fn delete_allows_db_sourced_rows(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    let mut reminder = task("remind-once");
    reminder.source = butler_core::ScheduleSource::Db;
    store.create(&reminder).await.unwrap();
    store.delete("remind-once").await.unwrap();
    assert!(store.find_by_name("remind-once").await.unwrap().is_none());
}

#[sqlx::test(migrator = "crate::db::MIGRATOR")]
async fn missing_toml_rows_are_disabled_not_deleted(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    store.create(&task("daily")).await.unwrap();
    store.disable_missing_toml_rows(&[]).await.unwrap();
    let row = store.find_by_name("daily").await.unwrap().unwrap();
    assert!(!row.enabled);
    assert!(row.next_run_at.is_none());
}

#[sqlx::test(migrator = "crate::db::MIGRATOR")]
async fn due_only_returns_enabled_rows_at_or_before_now(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    let now = Utc::now();
    let mut due_task = task("due-now");
    due_task.next_run_at = Some(now - chrono::Duration::seconds(1));
    store.create(&due_task).await.unwrap();

    let mut future_task = task("not-yet");
    future_task.next_run_at = Some(now + chrono::Duration::hours(1));
    store.create(&future_task).await.unwrap();

    let due = store.due(now).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].name, "due-now");
}

