// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use butler_storage::Db;

use super::*;

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn rejects_both_delay_and_remind_at(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    let now = Utc::now();
    let err = remind(&store, "hi", "telegram", Some(5), Some(now), now).await.unwrap_err();
    assert!(matches!(err, SchedulerError::Task(ScheduledTaskError::AmbiguousReminderTiming)));
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn rejects_neither_delay_nor_remind_at(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    let now = Utc::now();
    let err = remind(&store, "hi", "telegram", None, None, now).await.unwrap_err();
    assert!(matches!(err, SchedulerError::Task(ScheduledTaskError::AmbiguousReminderTiming)));
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn creates_a_one_shot_auto_disabling_task(pool: sqlx::PgPool) {
    let store = ScheduledTaskStore::new(Db::from_pool_for_test(pool));
    let now = Utc::now();
    let task = remind(&store, "take out the trash", "telegram", Some(10), None, now).await.unwrap();

    assert_eq!(task.source, butler_core::ScheduleSource::Db);
    assert_eq!(task.until_at, task.next_run_at.map(|t| t + Duration::minutes(1)));
    assert!(matches!(task.payload, DispatchPayload::Job { ref job_name, .. } if job_name == "notify.remind"));

    let stored = store.find_by_name(&task.name).await.unwrap().unwrap();
    assert_eq!(stored.id, task.id);
}
