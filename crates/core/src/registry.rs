// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`ButlerRegistryEntry`] — Switchboard-only record of a fleet member and
//! its liveness-derived eligibility state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived from heartbeat recency by the eligibility sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityState {
    Active,
    Stale,
    Quarantined,
}

crate::simple_display! {
    EligibilityState {
        Active => "active",
        Stale => "stale",
        Quarantined => "quarantined",
    }
}

/// The reason recorded alongside every `eligibility_log` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityTransitionReason {
    LivenessTtlExpired,
    LivenessTtlExpired2x,
    HeartbeatReceived,
    Registered,
}

crate::simple_display! {
    EligibilityTransitionReason {
        LivenessTtlExpired => "liveness_ttl_expired",
        LivenessTtlExpired2x => "liveness_ttl_expired_2x",
        HeartbeatReceived => "heartbeat_received",
        Registered => "registered",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButlerRegistryEntry {
    pub name: String,
    pub endpoint_url: String,
    pub description: String,
    pub modules: Vec<String>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub registered_at: DateTime<Utc>,
    pub eligibility_state: EligibilityState,
    pub eligibility_updated_at: DateTime<Utc>,
    pub quarantined_at: Option<DateTime<Utc>>,
    pub quarantine_reason: Option<String>,
    pub liveness_ttl_seconds: u64,
}

/// An append-only row recording one eligibility transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityLogEntry {
    pub butler_name: String,
    pub from_state: Option<EligibilityState>,
    pub to_state: EligibilityState,
    pub reason: EligibilityTransitionReason,
    pub at: DateTime<Utc>,
}

impl ButlerRegistryEntry {
    /// Evaluates the sweep rule from a reference `now`, returning the
    /// transition to apply (if any). Pure function; the caller persists the
    /// result and appends the log entry.
    ///
    /// - `last_seen_at IS NULL`: skipped (never reported), returns `None`.
    /// - `active` and stale past one TTL: transitions to `stale`.
    /// - `stale` and stale past two TTLs (measured from `last_seen_at`):
    ///   transitions to `quarantined`.
    /// - otherwise unchanged.
    pub fn sweep_transition(&self, now: DateTime<Utc>) -> Option<(EligibilityState, EligibilityTransitionReason)> {
        let last_seen_at = self.last_seen_at?;
        let ttl = chrono::Duration::seconds(self.liveness_ttl_seconds as i64);
        match self.eligibility_state {
            EligibilityState::Active if last_seen_at + ttl < now => {
                Some((EligibilityState::Stale, EligibilityTransitionReason::LivenessTtlExpired))
            }
            EligibilityState::Stale if last_seen_at + ttl * 2 < now => {
                Some((EligibilityState::Quarantined, EligibilityTransitionReason::LivenessTtlExpired2x))
            }
            _ => None,
        }
    }

    /// The transition applied when a heartbeat is received: `stale` becomes
    /// `active` again; `quarantined` is unaffected (but `last_seen_at` is
    /// still bumped by the caller); `active` is unaffected.
    pub fn heartbeat_transition(&self) -> Option<(EligibilityState, EligibilityTransitionReason)> {
        match self.eligibility_state {
            EligibilityState::Stale => Some((EligibilityState::Active, EligibilityTransitionReason::HeartbeatReceived)),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
