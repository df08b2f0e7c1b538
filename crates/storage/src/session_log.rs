// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only session log (§4.3).

use std::collections::BTreeMap;

use butler_core::{RequestId, Session, SessionCompletion, SessionId, ToolCallRecord, TriggerSource};
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::db::Db;
use crate::error::StorageError;

#[derive(Clone)]
pub struct SessionLog {
    db: Db,
}

/// Per-model token/cost totals for one aggregation period.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ModelPeriodAggregate {
    pub model: String,
    pub session_count: u64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cost: f64,
}

/// One day's per-model split, used for the daily time-series view.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DailyAggregate {
    pub day: chrono::NaiveDate,
    pub by_model: Vec<ModelPeriodAggregate>,
}

/// One row of the schedule-cost join: total cost attributed to a
/// `schedule:<name>` trigger source.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ScheduleCost {
    pub schedule_name: String,
    pub session_count: u64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cost: f64,
}

impl SessionLog {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Inserts the session row before the runtime is invoked, per the
    /// spawner's session-bracketing invariant.
    pub async fn create(
        &self,
        prompt: &str,
        trigger_source: &TriggerSource,
        trace_id: &str,
        model: Option<&str>,
        request_id: Option<RequestId>,
    ) -> Result<SessionId, StorageError> {
        let id = SessionId::new();
        let started_at = Utc::now();
        sqlx::query(
            "INSERT INTO sessions (id, prompt, trigger_source, started_at, tool_calls, trace_id, model, request_id)
             VALUES ($1, $2, $3, $4, '[]', $5, $6, $7)",
        )
        .bind(id.as_uuid())
        .bind(prompt)
        .bind(trigger_source.to_string())
        .bind(started_at)
        .bind(trace_id)
        .bind(model)
        .bind(request_id.map(|r| r.as_uuid()))
        .execute(self.db.pool())
        .await?;
        Ok(id)
    }

    /// The single allowed completion write. Errors if the row does not
    /// exist or if `completion` violates its own invariants against the
    /// stored `started_at`.
    pub async fn complete(&self, id: SessionId, completion: SessionCompletion) -> Result<(), StorageError> {
        let started_at: DateTime<Utc> = sqlx::query("SELECT started_at FROM sessions WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(self.db.pool())
            .await?
            .map(|r| r.get("started_at"))
            .ok_or_else(|| StorageError::NotFound(format!("session {id} not found")))?;

        completion.validate(started_at).map_err(|e| StorageError::Validation(e.to_string()))?;

        let tool_calls = serde_json::to_value(&completion.tool_calls).unwrap_or(serde_json::Value::Array(vec![]));
        sqlx::query(
            "UPDATE sessions SET completed_at = $2, result = $3, tool_calls = $4, success = $5, error = $6,
             duration_ms = $7, model = $8, input_tokens = $9, output_tokens = $10, cost = $11
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(completion.completed_at)
        .bind(&completion.result)
        .bind(tool_calls)
        .bind(completion.success)
        .bind(&completion.error)
        .bind(completion.duration_ms as i64)
        .bind(&completion.model)
        .bind(completion.input_tokens.map(|v| v as i64))
        .bind(completion.output_tokens.map(|v| v as i64))
        .bind(completion.cost)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn list(&self, limit: u32, offset: u32) -> Result<Vec<Session>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, prompt, trigger_source, started_at, completed_at, result, tool_calls, success, error,
             duration_ms, trace_id, model, input_tokens, output_tokens, cost, request_id
             FROM sessions ORDER BY started_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(self.db.pool())
        .await?;
        rows.into_iter().map(row_to_session).collect()
    }

    pub async fn in_flight(&self) -> Result<Vec<Session>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, prompt, trigger_source, started_at, completed_at, result, tool_calls, success, error,
             duration_ms, trace_id, model, input_tokens, output_tokens, cost, request_id
             FROM sessions WHERE completed_at IS NULL ORDER BY started_at DESC",
        )
        .fetch_all(self.db.pool())
        .await?;
        rows.into_iter().map(row_to_session).collect()
    }

    /// Per-period aggregation by model, where `since` bounds `started_at`
    /// (e.g. today / 7d / 30d, computed by the caller).
    pub async fn aggregate_by_model(&self, since: DateTime<Utc>) -> Result<Vec<ModelPeriodAggregate>, StorageError> {
        let rows = sqlx::query(
            "SELECT COALESCE(model, 'unknown') AS model, COUNT(*) AS session_count,
             COALESCE(SUM(input_tokens), 0) AS input_tokens, COALESCE(SUM(output_tokens), 0) AS output_tokens,
             COALESCE(SUM(cost), 0.0) AS cost
             FROM sessions WHERE started_at >= $1 GROUP BY model ORDER BY model",
        )
        .bind(since)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| ModelPeriodAggregate {
                model: r.get("model"),
                session_count: r.get::<i64, _>("session_count") as u64,
                input_tokens: r.get("input_tokens"),
                output_tokens: r.get("output_tokens"),
                cost: r.get("cost"),
            })
            .collect())
    }

    /// Daily time-series with per-model split, covering the last `days` days.
    pub async fn daily_time_series(&self, days: u32) -> Result<Vec<DailyAggregate>, StorageError> {
        let since = Utc::now() - chrono::Duration::days(days as i64);
        let rows = sqlx::query(
            "SELECT started_at::date AS day, COALESCE(model, 'unknown') AS model, COUNT(*) AS session_count,
             COALESCE(SUM(input_tokens), 0) AS input_tokens, COALESCE(SUM(output_tokens), 0) AS output_tokens,
             COALESCE(SUM(cost), 0.0) AS cost
             FROM sessions WHERE started_at >= $1 GROUP BY day, model ORDER BY day, model",
        )
        .bind(since)
        .fetch_all(self.db.pool())
        .await?;

        let mut by_day: BTreeMap<chrono::NaiveDate, Vec<ModelPeriodAggregate>> = BTreeMap::new();
        for r in rows {
            let day: chrono::NaiveDate = r.get("day");
            by_day.entry(day).or_default().push(ModelPeriodAggregate {
                model: r.get("model"),
                session_count: r.get::<i64, _>("session_count") as u64,
                input_tokens: r.get("input_tokens"),
                output_tokens: r.get("output_tokens"),
                cost: r.get("cost"),
            });
        }
        Ok(by_day.into_iter().map(|(day, by_model)| DailyAggregate { day, by_model }).collect())
    }

    /// Top-N sessions by `input_tokens + output_tokens`.
    pub async fn top_sessions_by_tokens(&self, n: u32) -> Result<Vec<Session>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, prompt, trigger_source, started_at, completed_at, result, tool_calls, success, error,
             duration_ms, trace_id, model, input_tokens, output_tokens, cost, request_id
             FROM sessions ORDER BY (COALESCE(input_tokens, 0) + COALESCE(output_tokens, 0)) DESC LIMIT $1",
        )
        .bind(n as i64)
        .fetch_all(self.db.pool())
        .await?;
        rows.into_iter().map(row_to_session).collect()
    }

    /// Joins sessions against `scheduled_tasks` on `trigger_source =
    /// 'schedule:' || scheduled_tasks.name`.
    pub async fn schedule_costs(&self) -> Result<Vec<ScheduleCost>, StorageError> {
        let rows = sqlx::query(
            "SELECT st.name AS schedule_name, COUNT(s.id) AS session_count,
             COALESCE(SUM(s.input_tokens), 0) AS input_tokens, COALESCE(SUM(s.output_tokens), 0) AS output_tokens,
             COALESCE(SUM(s.cost), 0.0) AS cost
             FROM scheduled_tasks st
             JOIN sessions s ON s.trigger_source = 'schedule:' || st.name
             GROUP BY st.name ORDER BY st.name",
        )
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| ScheduleCost {
                schedule_name: r.get("schedule_name"),
                session_count: r.get::<i64, _>("session_count") as u64,
                input_tokens: r.get("input_tokens"),
                output_tokens: r.get("output_tokens"),
                cost: r.get("cost"),
            })
            .collect())
    }
}

fn row_to_session(r: sqlx::postgres::PgRow) -> Result<Session, StorageError> {
    let tool_calls: serde_json::Value = r.get("tool_calls");
    let tool_calls: Vec<ToolCallRecord> = serde_json::from_value(tool_calls).unwrap_or_default();
    let trigger_source: String = r.get("trigger_source");
    let trigger_source = TriggerSource::parse(&trigger_source)
        .map_err(|e| StorageError::Validation(format!("corrupt trigger_source in storage: {e}")))?;
    Ok(Session {
        id: SessionId::from_uuid(r.get("id")),
        prompt: r.get("prompt"),
        trigger_source,
        started_at: r.get("started_at"),
        completed_at: r.get("completed_at"),
        result: r.get("result"),
        tool_calls,
        success: r.get("success"),
        error: r.get("error"),
        duration_ms: r.get::<Option<i64>, _>("duration_ms").map(|v| v as u64),
        trace_id: r.get("trace_id"),
        model: r.get("model"),
        input_tokens: r.get::<Option<i64>, _>("input_tokens").map(|v| v as u64),
        output_tokens: r.get::<Option<i64>, _>("output_tokens").map(|v| v as u64),
        cost: r.get("cost"),
        request_id: r.get::<Option<uuid::Uuid>, _>("request_id").map(RequestId::from_uuid),
    })
}

#[cfg(test)]
#[path = "session_log_tests.rs"]
mod tests;
