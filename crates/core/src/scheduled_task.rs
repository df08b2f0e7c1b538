// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`ScheduledTask`] — a cron-driven dispatch bound to a butler, keyed by
//! `(butler, name)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifies a row in `scheduled_tasks`.
    pub struct ScheduledTaskId("task", v4);
}

/// How a fired task is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    Prompt,
    Job,
}

crate::simple_display! {
    DispatchMode {
        Prompt => "prompt",
        Job => "job",
    }
}

/// Where a `scheduled_tasks` row originated. `Toml` rows are reconciled from
/// config on every startup and are never deleted at runtime, only disabled;
/// `Db` rows (created via the runtime CRUD surface, e.g. `remind`) may be
/// freely deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleSource {
    Toml,
    Db,
}

crate::simple_display! {
    ScheduleSource {
        Toml => "toml",
        Db => "db",
    }
}

/// The dispatch payload, enforcing that exactly one of `prompt` or
/// `(job_name, job_args)` is present, matching `dispatch_mode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DispatchPayload {
    Prompt { prompt: String },
    Job { job_name: String, job_args: serde_json::Value },
}

impl DispatchPayload {
    pub fn mode(&self) -> DispatchMode {
        match self {
            Self::Prompt { .. } => DispatchMode::Prompt,
            Self::Job { .. } => DispatchMode::Job,
        }
    }
}

/// Error constructing or mutating a [`ScheduledTask`]: any condition the
/// spec declares rejected at write time, not a storage-layer failure.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ScheduledTaskError {
    #[error("cross-mode dispatch payload: a prompt task cannot carry job_name/job_args or vice versa")]
    CrossModePayload,
    #[error("end_at ({end_at}) must be strictly after start_at ({start_at})")]
    EndNotAfterStart { start_at: DateTime<Utc>, end_at: DateTime<Utc> },
    #[error("until_at ({until_at}) must be on or after start_at ({start_at})")]
    UntilBeforeStart { start_at: DateTime<Utc>, until_at: DateTime<Utc> },
    #[error("both delay_minutes and remind_at were supplied; exactly one is required")]
    AmbiguousReminderTiming,
    #[error("cannot delete scheduled task {0:?}: source='toml' rows may only be disabled")]
    CannotDeleteTomlSourced(String),
    #[error("a scheduled task named {0:?} already exists for this butler")]
    DuplicateName(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: ScheduledTaskId,
    pub name: String,
    pub cron: String,
    pub payload: DispatchPayload,
    pub enabled: bool,
    pub source: ScheduleSource,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_result: Option<serde_json::Value>,
    pub until_at: Option<DateTime<Utc>>,
    pub stagger_key: String,
    pub timezone: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub display_title: Option<String>,
}

impl ScheduledTask {
    /// Validates the calendar-projection and reminder-window invariants
    /// that hold regardless of how the task was constructed.
    pub fn validate_windows(
        start_at: Option<DateTime<Utc>>,
        end_at: Option<DateTime<Utc>>,
        until_at: Option<DateTime<Utc>>,
    ) -> Result<(), ScheduledTaskError> {
        if let (Some(start), Some(end)) = (start_at, end_at) {
            if end <= start {
                return Err(ScheduledTaskError::EndNotAfterStart { start_at: start, end_at: end });
            }
        }
        if let (Some(start), Some(until)) = (start_at, until_at) {
            if until < start {
                return Err(ScheduledTaskError::UntilBeforeStart { start_at: start, until_at: until });
            }
        }
        Ok(())
    }

    crate::setters! {
        option { display_title: String }
        option { timezone: String }
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct ScheduledTaskBuilder => ScheduledTask {
        computed { id: ScheduledTaskId = ScheduledTaskId::new() }
        into { name: String = "nightly" }
        into { cron: String = "0 9 * * *" }
        set { payload: DispatchPayload = DispatchPayload::Prompt { prompt: "hello".into() } }
        set { enabled: bool = true }
        set { source: ScheduleSource = ScheduleSource::Toml }
        set { next_run_at: Option<chrono::DateTime<chrono::Utc>> = None }
        set { last_run_at: Option<chrono::DateTime<chrono::Utc>> = None }
        set { last_result: Option<serde_json::Value> = None }
        set { until_at: Option<chrono::DateTime<chrono::Utc>> = None }
        into { stagger_key: String = "nightly" }
        set { timezone: Option<String> = None }
        set { start_at: Option<chrono::DateTime<chrono::Utc>> = None }
        set { end_at: Option<chrono::DateTime<chrono::Utc>> = None }
        set { display_title: Option<String> = None }
    }
}

#[cfg(test)]
#[path = "scheduled_task_tests.rs"]
mod tests;
