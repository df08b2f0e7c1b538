// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Switchboard-only append-only audit log for dashboard-initiated actions.
//! Out of scope for the core itself; retained here only because write
//! failures must never block the (out-of-scope) dashboard API, per the
//! error-handling policy.

use chrono::Utc;
use tracing::warn;

use crate::db::Db;

#[derive(Clone)]
pub struct DashboardAuditLog {
    db: Db,
}

impl DashboardAuditLog {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Fail-open: a write failure is logged and swallowed rather than
    /// propagated, so it can never block the caller's primary path.
    pub async fn record(&self, actor: &str, action: &str, detail: Option<serde_json::Value>) {
        let result = sqlx::query("INSERT INTO dashboard_audit_log (actor, action, detail, at) VALUES ($1,$2,$3,$4)")
            .bind(actor)
            .bind(action)
            .bind(detail)
            .bind(Utc::now())
            .execute(self.db.pool())
            .await;
        if let Err(err) = result {
            warn!(%err, actor, action, "dashboard_audit_log write failed");
        }
    }
}
