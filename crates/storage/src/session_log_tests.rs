// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[sqlx::test(migrator = "crate::db::MIGRATOR")]
async fn create_then_complete_round_trips(pool: sqlx::PgPool) {
    let db = Db::from_pool_for_test(pool);
    let log = SessionLog::new(db);

    let id = log.create("hello", &TriggerSource::External, "trace-1", Some("claude"), None).await.unwrap();
    let before = log.in_flight().await.unwrap();
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].id, id);

    log.complete(
        id,
        SessionCompletion {
            completed_at: Utc::now(),
            result: Some("done".into()),
            tool_calls: vec![],
            success: true,
            error: None,
            duration_ms: 42,
            model: Some("claude".into()),
            input_tokens: Some(10),
            output_tokens: Some(5),
            cost: Some(0.02),
        },
    )
    .await
    .unwrap();

    assert!(log.in_flight().await.unwrap().is_empty());
    let listed = log.list(10, 0).await.unwrap();
    assert_eq!(listed[0].success, Some(true));
}

#[sqlx::test(migrator = "crate::db::MIGRATOR")]
async fn completing_with_failure_and_no_error_is_rejected(pool: sqlx::PgPool) {
    let db = Db::from_pool_for_test(pool);
    let log = SessionLog::new(db);
    let id = log.create("hello", &TriggerSource::Route, "trace-2", None, None).await.unwrap();

    let err = log
        .complete(
            id,
            SessionCompletion {
                completed_at: Utc::now(),
                result: None,
                tool_calls: vec![],
                success: false,
                error: None,
                duration_ms: 1,
                model: None,
                input_tokens: None,
                output_tokens: None,
                cost: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));
}

#[sqlx::test(migrator = "crate::db::MIGRATOR")]
async fn schedule_costs_join_matches_on_schedule_trigger_source(pool: sqlx::PgPool) {
    let db = Db::from_pool_for_test(pool.clone());
    let log = SessionLog::new(db.clone());

    sqlx::query(
        "INSERT INTO scheduled_tasks (id, name, cron, dispatch_mode, prompt, enabled, source, stagger_key)
         VALUES ($1, 'daily', '0 9 * * *', 'prompt', 'hi', true, 'toml', 'daily')",
    )
    .bind(uuid::Uuid::new_v4())
    .execute(&pool)
    .await
    .unwrap();

    let source = TriggerSource::parse("schedule:daily").unwrap();
    let id = log.create("hi", &source, "trace-3", Some("claude"), None).await.unwrap();
    log.complete(
        id,
        SessionCompletion {
            completed_at: Utc::now(),
            result: None,
            tool_calls: vec![],
            success: true,
            error: None,
            duration_ms: 5,
            model: Some("claude".into()),
            input_tokens: Some(10),
            output_tokens: Some(5),
            cost: Some(0.01),
        },
    )
    .await
    .unwrap();

    let costs = log.schedule_costs().await.unwrap();
    assert_eq!(costs.len(), 1);
    assert_eq!(costs[0].schedule_name, "daily");
    assert_eq!(costs[0].session_count, 1);
}
