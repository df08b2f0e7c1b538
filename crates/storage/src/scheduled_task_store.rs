// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage for `scheduled_tasks` (§4.5): CRUD, due-task queries, and the
//! fields mutated by one tick.

use butler_core::{DispatchPayload, ScheduleSource, ScheduledTask, ScheduledTaskError, ScheduledTaskId};
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::db::Db;
use crate::error::StorageError;

#[derive(Clone)]
pub struct ScheduledTaskStore {
    db: Db,
}

impl ScheduledTaskStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(&self, task: &ScheduledTask) -> Result<(), StorageError> {
        if self.find_by_name(&task.name).await?.is_some() {
            return Err(StorageError::Validation(ScheduledTaskError::DuplicateName(task.name.clone()).to_string()));
        }
        self.upsert(task).await
    }

    pub async fn upsert(&self, task: &ScheduledTask) -> Result<(), StorageError> {
        let (prompt, job_name, job_args) = match &task.payload {
            DispatchPayload::Prompt { prompt } => (Some(prompt.as_str()), None, None),
            DispatchPayload::Job { job_name, job_args } => (None, Some(job_name.as_str()), Some(job_args.clone())),
        };
        sqlx::query(
            "INSERT INTO scheduled_tasks
             (id, name, cron, dispatch_mode, prompt, job_name, job_args, enabled, source, next_run_at,
              last_run_at, last_result, until_at, stagger_key, timezone, start_at, end_at, display_title)
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18)
             ON CONFLICT (name) DO UPDATE SET
              cron = $3, dispatch_mode = $4, prompt = $5, job_name = $6, job_args = $7, enabled = $8,
              next_run_at = $10, last_run_at = $11, last_result = $12, until_at = $13, stagger_key = $14,
              timezone = $15, start_at = $16, end_at = $17, display_title = $18",
        )
        .bind(task.id.as_uuid())
        .bind(&task.name)
        .bind(&task.cron)
        .bind(task.payload.mode().to_string())
        .bind(prompt)
        .bind(job_name)
        .bind(job_args)
        .bind(task.enabled)
        .bind(task.source.to_string())
        .bind(task.next_run_at)
        .bind(task.last_run_at)
        .bind(&task.last_result)
        .bind(task.until_at)
        .bind(&task.stagger_key)
        .bind(&task.timezone)
        .bind(task.start_at)
        .bind(task.end_at)
        .bind(&task.display_title)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<ScheduledTask>, StorageError> {
        let row = sqlx::query(SELECT_COLUMNS).bind(name).fetch_optional(self.db.pool()).await?;
        row.map(row_to_task).transpose()
    }

    pub async fn list(&self) -> Result<Vec<ScheduledTask>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, name, cron, dispatch_mode, prompt, job_name, job_args, enabled, source, next_run_at,
             last_run_at, last_result, until_at, stagger_key, timezone, start_at, end_at, display_title
             FROM scheduled_tasks ORDER BY name",
        )
        .fetch_all(self.db.pool())
        .await?;
        rows.into_iter().map(row_to_task).collect()
    }

    /// Query `(enabled AND next_run_at <= now)`, ordered by `next_run_at`,
    /// for the tick handler to dispatch serially.
    pub async fn due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledTask>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, name, cron, dispatch_mode, prompt, job_name, job_args, enabled, source, next_run_at,
             last_run_at, last_result, until_at, stagger_key, timezone, start_at, end_at, display_title
             FROM scheduled_tasks WHERE enabled AND next_run_at <= $1 ORDER BY next_run_at",
        )
        .bind(now)
        .fetch_all(self.db.pool())
        .await?;
        rows.into_iter().map(row_to_task).collect()
    }

    /// Rejected for `source='toml'` rows — they may only be disabled.
    pub async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let task = self
            .find_by_name(name)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("scheduled task {name:?} not found")))?;
        if task.source == ScheduleSource::Toml {
            return Err(StorageError::Validation(
                ScheduledTaskError::CannotDeleteTomlSourced(name.to_string()).to_string(),
            ));
        }
        sqlx::query("DELETE FROM scheduled_tasks WHERE name = $1").bind(name).execute(self.db.pool()).await?;
        Ok(())
    }

    /// `source='toml'` rows that no longer appear in config are disabled,
    /// never deleted, preserving history.
    pub async fn disable_missing_toml_rows(&self, present_names: &[String]) -> Result<(), StorageError> {
        let placeholders = present_names;
        sqlx::query(
            "UPDATE scheduled_tasks SET enabled = false, next_run_at = NULL
             WHERE source = 'toml' AND enabled AND NOT (name = ANY($1))",
        )
        .bind(placeholders)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Setting `enabled=false` nulls `next_run_at`; re-enabling recomputes
    /// it — the caller passes the freshly computed value when re-enabling.
    pub async fn set_enabled(&self, name: &str, enabled: bool, next_run_at: Option<DateTime<Utc>>) -> Result<(), StorageError> {
        sqlx::query("UPDATE scheduled_tasks SET enabled = $2, next_run_at = $3 WHERE name = $1")
            .bind(name)
            .bind(enabled)
            .bind(if enabled { next_run_at } else { None })
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// Applied after every dispatch attempt, success or failure: records
    /// `last_result`, bumps `last_run_at`, advances `next_run_at`, and
    /// auto-disables once `next_run_at` would cross `until_at`.
    pub async fn record_fire(
        &self,
        id: ScheduledTaskId,
        now: DateTime<Utc>,
        next_run_at: Option<DateTime<Utc>>,
        last_result: serde_json::Value,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE scheduled_tasks SET last_run_at = $2, next_run_at = $3, last_result = $4 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(now)
        .bind(next_run_at)
        .bind(last_result)
        .execute(self.db.pool())
        .await?;
        if next_run_at.is_none() {
            sqlx::query("UPDATE scheduled_tasks SET enabled = false WHERE id = $1")
                .bind(id.as_uuid())
                .execute(self.db.pool())
                .await?;
        }
        Ok(())
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, cron, dispatch_mode, prompt, job_name, job_args, enabled, source, \
     next_run_at, last_run_at, last_result, until_at, stagger_key, timezone, start_at, end_at, display_title \
     FROM scheduled_tasks WHERE name = $1";

fn row_to_task(r: sqlx::postgres::PgRow) -> Result<ScheduledTask, StorageError> {
    let mode: String = r.get("dispatch_mode");
    let payload = match mode.as_str() {
        "prompt" => DispatchPayload::Prompt { prompt: r.get::<Option<String>, _>("prompt").unwrap_or_default() },
        "job" => DispatchPayload::Job {
            job_name: r.get::<Option<String>, _>("job_name").unwrap_or_default(),
            job_args: r.get::<Option<serde_json::Value>, _>("job_args").unwrap_or(serde_json::Value::Null),
        },
        other => return Err(StorageError::Validation(format!("corrupt dispatch_mode in storage: {other:?}"))),
    };
    let source: String = r.get("source");
    let source = match source.as_str() {
        "toml" => ScheduleSource::Toml,
        "db" => ScheduleSource::Db,
        other => return Err(StorageError::Validation(format!("corrupt source in storage: {other:?}"))),
    };
    Ok(ScheduledTask {
        id: ScheduledTaskId::from_uuid(r.get("id")),
        name: r.get("name"),
        cron: r.get("cron"),
        payload,
        enabled: r.get("enabled"),
        source,
        next_run_at: r.get("next_run_at"),
        last_run_at: r.get("last_run_at"),
        last_result: r.get("last_result"),
        until_at: r.get("until_at"),
        stagger_key: r.get("stagger_key"),
        timezone: r.get("timezone"),
        start_at: r.get("start_at"),
        end_at: r.get("end_at"),
        display_title: r.get("display_title"),
    })
}

#[cfg(test)]
#[path = "scheduled_task_store_tests.rs"]
mod tests;
