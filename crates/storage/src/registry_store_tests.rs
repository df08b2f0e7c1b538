// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn entry(name: &str) -> ButlerRegistryEntry {
    let now = Utc::now();
    ButlerRegistryEntry {
        name: name.into(),
        endpoint_url: format!("http://{name}:9001"),
        description: "".into(),
        modules: vec!["finance".into()],
        last_seen_at: None,
        registered_at: now,
        eligibility_state: EligibilityState::Active,
        eligibility_updated_at: now,
        quarantined_at: None,
        quarantine_reason: None,
        liveness_ttl_seconds: 60,
    }
}

#[sqlx::test(migrator = "crate::db::MIGRATOR")]
async fn register_writes_a_registered_log_entry(pool: sqlx::PgPool) {
    let store = RegistryStore::new(Db::from_pool_for_test(pool));
    store.register(&entry("finance")).await.unwrap();
    let found = store.find("finance").await.unwrap().unwrap();
    assert_eq!(found.eligibility_state, EligibilityState::Active);
}

#[sqlx::test(migrator = "crate::db::MIGRATOR")]
async fn heartbeat_reactivates_a_stale_butler(pool: sqlx::PgPool) {
    let store = RegistryStore::new(Db::from_pool_for_test(pool));
    let mut e = entry("finance");
    e.eligibility_state = EligibilityState::Stale;
    store.register(&e).await.unwrap();

    store
        .record_heartbeat("finance", Some((EligibilityState::Active, EligibilityTransitionReason::HeartbeatReceived)))
        .await
        .unwrap();

    let found = store.find("finance").await.unwrap().unwrap();
    assert_eq!(found.eligibility_state, EligibilityState::Active);
    assert!(found.last_seen_at.is_some());
}

#[sqlx::test(migrator = "crate::db::MIGRATOR")]
async fn quarantined_butler_still_gets_last_seen_at_updated(pool: sqlx::PgPool) {
    let store = RegistryStore::new(Db::from_pool_for_test(pool));
    let mut e = entry("finance");
    e.eligibility_state = EligibilityState::Quarantined;
    store.register(&e).await.unwrap();

    store.record_heartbeat("finance", None).await.unwrap();

    let found = store.find("finance").await.unwrap().unwrap();
    assert_eq!(found.eligibility_state, EligibilityState::Quarantined);
    assert!(found.last_seen_at.is_some());
}

#[sqlx::test(migrator = "crate::db::MIGRATOR")]
async fn sweep_transition_to_quarantined_records_the_reason(pool: sqlx::PgPool) {
    let store = RegistryStore::new(Db::from_pool_for_test(pool));
    store.register(&entry("finance")).await.unwrap();

    let now = Utc::now();
    store
        .apply_sweep_transition(
            "finance",
            EligibilityState::Stale,
            EligibilityState::Quarantined,
            EligibilityTransitionReason::LivenessTtlExpired2x,
            now,
        )
        .await
        .unwrap();

    let found = store.find("finance").await.unwrap().unwrap();
    assert_eq!(found.eligibility_state, EligibilityState::Quarantined);
    assert_eq!(found.quarantine_reason.as_deref(), Some("liveness_ttl_expired_2x"));
    assert!(found.quarantined_at.is_some());
}
