// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Switchboard-only storage: `butler_registry` and its append-only
//! `butler_registry_eligibility_log` (§4.9).

use butler_core::{ButlerRegistryEntry, EligibilityState, EligibilityTransitionReason};
use chrono::Utc;
use sqlx::Row;

use crate::db::Db;
use crate::error::StorageError;

#[derive(Clone)]
pub struct RegistryStore {
    db: Db,
}

impl RegistryStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn register(&self, entry: &ButlerRegistryEntry) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO butler_registry
             (name, endpoint_url, description, modules, last_seen_at, registered_at, eligibility_state,
              eligibility_updated_at, quarantined_at, quarantine_reason, liveness_ttl_seconds)
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
             ON CONFLICT (name) DO UPDATE SET endpoint_url = $2, description = $3, modules = $4,
              liveness_ttl_seconds = $11",
        )
        .bind(&entry.name)
        .bind(&entry.endpoint_url)
        .bind(&entry.description)
        .bind(serde_json::to_value(&entry.modules).unwrap_or_default())
        .bind(entry.last_seen_at)
        .bind(entry.registered_at)
        .bind(entry.eligibility_state.to_string())
        .bind(entry.eligibility_updated_at)
        .bind(entry.quarantined_at)
        .bind(&entry.quarantine_reason)
        .bind(entry.liveness_ttl_seconds as i64)
        .execute(self.db.pool())
        .await?;
        self.append_log(&entry.name, None, entry.eligibility_state, EligibilityTransitionReason::Registered).await?;
        Ok(())
    }

    pub async fn find(&self, name: &str) -> Result<Option<ButlerRegistryEntry>, StorageError> {
        let row = sqlx::query(SELECT_COLUMNS).bind(name).fetch_optional(self.db.pool()).await?;
        row.map(row_to_entry).transpose()
    }

    pub async fn list(&self) -> Result<Vec<ButlerRegistryEntry>, StorageError> {
        let rows = sqlx::query(
            "SELECT name, endpoint_url, description, modules, last_seen_at, registered_at, eligibility_state,
             eligibility_updated_at, quarantined_at, quarantine_reason, liveness_ttl_seconds
             FROM butler_registry ORDER BY name",
        )
        .fetch_all(self.db.pool())
        .await?;
        rows.into_iter().map(row_to_entry).collect()
    }

    /// Applies the heartbeat write: updates `last_seen_at` and, if given, the
    /// eligibility transition implied by [`ButlerRegistryEntry::heartbeat_transition`].
    pub async fn record_heartbeat(
        &self,
        name: &str,
        transition: Option<(EligibilityState, EligibilityTransitionReason)>,
    ) -> Result<(), StorageError> {
        let now = Utc::now();
        if let Some((to_state, reason)) = transition {
            let from_state = self.find(name).await?.map(|e| e.eligibility_state);
            sqlx::query(
                "UPDATE butler_registry SET last_seen_at = $2, eligibility_state = $3, eligibility_updated_at = $2
                 WHERE name = $1",
            )
            .bind(name)
            .bind(now)
            .bind(to_state.to_string())
            .execute(self.db.pool())
            .await?;
            self.append_log(name, from_state, to_state, reason).await?;
        } else {
            sqlx::query("UPDATE butler_registry SET last_seen_at = $2 WHERE name = $1")
                .bind(name)
                .bind(now)
                .execute(self.db.pool())
                .await?;
        }
        Ok(())
    }

    /// Applies a sweep-derived transition (and, when moving into
    /// `quarantined`, records `quarantined_at`/`quarantine_reason`).
    pub async fn apply_sweep_transition(
        &self,
        name: &str,
        from_state: EligibilityState,
        to_state: EligibilityState,
        reason: EligibilityTransitionReason,
        at: chrono::DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if to_state == EligibilityState::Quarantined {
            sqlx::query(
                "UPDATE butler_registry SET eligibility_state = $2, eligibility_updated_at = $3,
                 quarantined_at = $3, quarantine_reason = $4 WHERE name = $1",
            )
            .bind(name)
            .bind(to_state.to_string())
            .bind(at)
            .bind(reason.to_string())
            .execute(self.db.pool())
            .await?;
        } else {
            sqlx::query("UPDATE butler_registry SET eligibility_state = $2, eligibility_updated_at = $3 WHERE name = $1")
                .bind(name)
                .bind(to_state.to_string())
                .bind(at)
                .execute(self.db.pool())
                .await?;
        }
        self.append_log(name, Some(from_state), to_state, reason).await?;
        Ok(())
    }

    async fn append_log(
        &self,
        butler_name: &str,
        from_state: Option<EligibilityState>,
        to_state: EligibilityState,
        reason: EligibilityTransitionReason,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO butler_registry_eligibility_log (butler_name, from_state, to_state, reason, at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(butler_name)
        .bind(from_state.map(|s| s.to_string()))
        .bind(to_state.to_string())
        .bind(reason.to_string())
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}

const SELECT_COLUMNS: &str = "SELECT name, endpoint_url, description, modules, last_seen_at, registered_at, \
     eligibility_state, eligibility_updated_at, quarantined_at, quarantine_reason, liveness_ttl_seconds \
     FROM butler_registry WHERE name = $1";

fn row_to_entry(r: sqlx::postgres::PgRow) -> Result<ButlerRegistryEntry, StorageError> {
    let state: String = r.get("eligibility_state");
    let eligibility_state = parse_eligibility_state(&state)?;
    let modules: serde_json::Value = r.get("modules");
    Ok(ButlerRegistryEntry {
        name: r.get("name"),
        endpoint_url: r.get("endpoint_url"),
        description: r.get("description"),
        modules: serde_json::from_value(modules).unwrap_or_default(),
        last_seen_at: r.get("last_seen_at"),
        registered_at: r.get("registered_at"),
        eligibility_state,
        eligibility_updated_at: r.get("eligibility_updated_at"),
        quarantined_at: r.get("quarantined_at"),
        quarantine_reason: r.get("quarantine_reason"),
        liveness_ttl_seconds: r.get::<i64, _>("liveness_ttl_seconds") as u64,
    })
}

fn parse_eligibility_state(raw: &str) -> Result<EligibilityState, StorageError> {
    match raw {
        "active" => Ok(EligibilityState::Active),
        "stale" => Ok(EligibilityState::Stale),
        "quarantined" => Ok(EligibilityState::Quarantined),
        other => Err(StorageError::Validation(format!("corrupt eligibility_state in storage: {other:?}"))),
    }
}

#[cfg(test)]
#[path = "registry_store_tests.rs"]
mod tests;
