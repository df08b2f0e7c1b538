// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-butler versioned key-value store (§4.2).

use butler_core::{CasConflict, StateEntry};
use chrono::Utc;
use sqlx::Row;

use crate::db::Db;
use crate::error::StorageError;

#[derive(Clone)]
pub struct StateStore {
    db: Db,
}

impl StateStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: &str) -> Result<Option<StateEntry>, StorageError> {
        let row = sqlx::query("SELECT key, value, version, updated_at FROM state WHERE key = $1")
            .bind(key)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.map(|r| StateEntry {
            key: r.get("key"),
            value: r.get("value"),
            version: r.get::<i64, _>("version") as u64,
            updated_at: r.get("updated_at"),
        }))
    }

    /// Upsert: inserts at version 1, or increments the existing row's
    /// version by exactly 1.
    pub async fn set(&self, key: &str, value: serde_json::Value) -> Result<u64, StorageError> {
        let now = Utc::now();
        let row = sqlx::query(
            "INSERT INTO state (key, value, version, updated_at) VALUES ($1, $2, 1, $3)
             ON CONFLICT (key) DO UPDATE SET value = $2, version = state.version + 1, updated_at = $3
             RETURNING version",
        )
        .bind(key)
        .bind(&value)
        .bind(now)
        .fetch_one(self.db.pool())
        .await?;
        Ok(row.get::<i64, _>("version") as u64)
    }

    /// `expected_version = 0` means "the key must not exist yet" — the
    /// only way to create a row through the CAS path rather than `set`.
    pub async fn compare_and_set(
        &self,
        key: &str,
        expected_version: u64,
        new_value: serde_json::Value,
    ) -> Result<u64, StorageError> {
        let now = Utc::now();
        let mut tx = self.db.pool().begin().await?;

        let current = sqlx::query("SELECT version FROM state WHERE key = $1 FOR UPDATE")
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?
            .map(|r| r.get::<i64, _>("version") as u64);

        match current {
            None if expected_version == 0 => {
                sqlx::query(
                    "INSERT INTO state (key, value, version, updated_at) VALUES ($1, $2, 1, $3)",
                )
                .bind(key)
                .bind(&new_value)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                tx.commit().await?;
                Ok(1)
            }
            None => Err(StorageError::CasConflict(CasConflict { expected: expected_version, actual: None })),
            Some(actual) if actual != expected_version => {
                Err(StorageError::CasConflict(CasConflict { expected: expected_version, actual: Some(actual) }))
            }
            Some(_) => {
                let row = sqlx::query(
                    "UPDATE state SET value = $2, version = version + 1, updated_at = $3
                     WHERE key = $1 RETURNING version",
                )
                .bind(key)
                .bind(&new_value)
                .bind(now)
                .fetch_one(&mut *tx)
                .await?;
                tx.commit().await?;
                Ok(row.get::<i64, _>("version") as u64)
            }
        }
    }

    /// Idempotent: deleting an absent key is not an error.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM state WHERE key = $1").bind(key).execute(self.db.pool()).await?;
        Ok(())
    }

    /// Lexicographic order by key; `prefix`, when given, filters via SQL
    /// `LIKE prefix%`.
    pub async fn list(&self, prefix: Option<&str>, keys_only: bool) -> Result<Vec<StateEntry>, StorageError> {
        let like_pattern = prefix.map(|p| format!("{}%", escape_like(p)));
        let rows = match &like_pattern {
            Some(pattern) => {
                sqlx::query("SELECT key, value, version, updated_at FROM state WHERE key LIKE $1 ESCAPE '\\' ORDER BY key")
                    .bind(pattern)
                    .fetch_all(self.db.pool())
                    .await?
            }
            None => {
                sqlx::query("SELECT key, value, version, updated_at FROM state ORDER BY key")
                    .fetch_all(self.db.pool())
                    .await?
            }
        };
        Ok(rows
            .into_iter()
            .map(|r| StateEntry {
                key: r.get("key"),
                value: if keys_only { serde_json::Value::Null } else { r.get("value") },
                version: r.get::<i64, _>("version") as u64,
                updated_at: r.get("updated_at"),
            })
            .collect())
    }
}

/// Escapes `%`, `_`, and `\` so a literal prefix can be embedded safely in a
/// `LIKE ... ESCAPE '\'` pattern.
fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
#[path = "state_store_tests.rs"]
mod tests;
