// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn entry(state: EligibilityState, last_seen_at: Option<DateTime<Utc>>) -> ButlerRegistryEntry {
    ButlerRegistryEntry {
        name: "finance".into(),
        endpoint_url: "http://finance:9001".into(),
        description: "".into(),
        modules: vec![],
        last_seen_at,
        registered_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        eligibility_state: state,
        eligibility_updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        quarantined_at: None,
        quarantine_reason: None,
        liveness_ttl_seconds: 60,
    }
}

#[test]
fn never_reported_butlers_are_skipped() {
    let e = entry(EligibilityState::Active, None);
    assert_eq!(e.sweep_transition(Utc::now()), None);
}

#[test]
fn active_within_ttl_is_unchanged() {
    let now = Utc::now();
    let e = entry(EligibilityState::Active, Some(now - chrono::Duration::seconds(30)));
    assert_eq!(e.sweep_transition(now), None);
}

#[test]
fn active_past_ttl_goes_stale() {
    let now = Utc::now();
    let e = entry(EligibilityState::Active, Some(now - chrono::Duration::seconds(61)));
    assert_eq!(
        e.sweep_transition(now),
        Some((EligibilityState::Stale, EligibilityTransitionReason::LivenessTtlExpired))
    );
}

#[test]
fn stale_past_double_ttl_goes_quarantined() {
    let now = Utc::now();
    let e = entry(EligibilityState::Stale, Some(now - chrono::Duration::seconds(121)));
    assert_eq!(
        e.sweep_transition(now),
        Some((EligibilityState::Quarantined, EligibilityTransitionReason::LivenessTtlExpired2x))
    );
}

#[test]
fn stale_within_double_ttl_is_unchanged() {
    let now = Utc::now();
    let e = entry(EligibilityState::Stale, Some(now - chrono::Duration::seconds(90)));
    assert_eq!(e.sweep_transition(now), None);
}

#[test]
fn quarantined_never_auto_transitions_via_sweep() {
    let now = Utc::now();
    let e = entry(EligibilityState::Quarantined, Some(now - chrono::Duration::seconds(10_000)));
    assert_eq!(e.sweep_transition(now), None);
}

#[test]
fn heartbeat_reactivates_only_from_stale() {
    assert_eq!(
        entry(EligibilityState::Stale, None).heartbeat_transition(),
        Some((EligibilityState::Active, EligibilityTransitionReason::HeartbeatReceived))
    );
    assert_eq!(entry(EligibilityState::Active, None).heartbeat_transition(), None);
    assert_eq!(entry(EligibilityState::Quarantined, None).heartbeat_transition(), None);
}
