// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Switchboard-only append-only log of routing outcomes, read by the
//! dashboard (out of scope here beyond the write path).

use butler_core::RequestId;
use chrono::Utc;

use crate::db::Db;
use crate::error::StorageError;

#[derive(Clone)]
pub struct RoutingLog {
    db: Db,
}

impl RoutingLog {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn record(
        &self,
        request_id: RequestId,
        target_butler: &str,
        outcome: &str,
        detail: Option<serde_json::Value>,
    ) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO routing_log (request_id, target_butler, outcome, detail, at) VALUES ($1,$2,$3,$4,$5)")
            .bind(request_id.as_uuid())
            .bind(target_butler)
            .bind(outcome)
            .bind(detail)
            .bind(Utc::now())
            .execute(self.db.pool())
            .await?;
        Ok(())
    }
}
