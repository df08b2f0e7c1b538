// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn escape_like_neutralizes_wildcard_characters() {
    assert_eq!(escape_like("100%_done"), "100\\%\\_done");
    assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    assert_eq!(escape_like("plain"), "plain");
}

/// Exercises the full CAS lifecycle against a real Postgres instance.
/// `sqlx::test` provisions and migrates a scratch database per test using
/// the `DATABASE_URL` configured for the workspace.
#[sqlx::test(migrator = "crate::db::MIGRATOR")]
async fn compare_and_set_enforces_the_expected_version(pool: sqlx::PgPool) {
    let db = Db::from_pool_for_test(pool);
    let store = StateStore::new(db);

    let created = store.compare_and_set("counter", 0, serde_json::json!(1)).await.unwrap();
    assert_eq!(created, 1);

    let err = store.compare_and_set("counter", 0, serde_json::json!(2)).await.unwrap_err();
    assert!(matches!(err, StorageError::CasConflict(CasConflict { expected: 0, actual: Some(1) })));

    let updated = store.compare_and_set("counter", 1, serde_json::json!(2)).await.unwrap();
    assert_eq!(updated, 2);

    let entry = store.get("counter").await.unwrap().unwrap();
    assert_eq!(entry.version, 2);
    assert_eq!(entry.value, serde_json::json!(2));
}

#[sqlx::test(migrator = "crate::db::MIGRATOR")]
async fn list_filters_by_like_prefix_in_lexicographic_order(pool: sqlx::PgPool) {
    let db = Db::from_pool_for_test(pool);
    let store = StateStore::new(db);

    for key in ["routing.a", "routing.b", "unrelated"] {
        store.set(key, serde_json::json!(null)).await.unwrap();
    }

    let listed = store.list(Some("routing."), false).await.unwrap();
    let keys: Vec<_> = listed.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["routing.a", "routing.b"]);
}
