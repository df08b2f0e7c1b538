// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `remind` primitive (§4.5): a high-level one-shot reminder built on
//! top of the general scheduled-task machinery.

use butler_core::{DispatchPayload, ScheduleSource, ScheduledTask, ScheduledTaskError, ScheduledTaskId};
use butler_storage::ScheduledTaskStore;
use chrono::{DateTime, Duration, Utc};

use crate::error::SchedulerError;

/// Creates a one-shot schedule: a cron matching the target minute exactly,
/// `until_at = target + 1 minute`, auto-disabled by the tick handler once
/// it fires. Exactly one of `delay_minutes`/`remind_at` must be given.
pub async fn remind(
    store: &ScheduledTaskStore,
    message: &str,
    channel: &str,
    delay_minutes: Option<i64>,
    remind_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<ScheduledTask, SchedulerError> {
    let target = match (delay_minutes, remind_at) {
        (Some(_), Some(_)) => return Err(ScheduledTaskError::AmbiguousReminderTiming.into()),
        (None, None) => return Err(ScheduledTaskError::AmbiguousReminderTiming.into()),
        (Some(minutes), None) => now + Duration::minutes(minutes),
        (None, Some(at)) => at,
    };

    let cron = format!("{} {} {} {} *", target.format("%M"), target.format("%H"), target.format("%d"), target.format("%m"));
    let name = format!("remind-{}", ScheduledTaskId::new());

    let task = ScheduledTask {
        id: ScheduledTaskId::new(),
        name: name.clone(),
        cron,
        payload: DispatchPayload::Job {
            job_name: "notify.remind".to_string(),
            job_args: serde_json::json!({ "channel": channel, "message": message }),
        },
        enabled: true,
        source: ScheduleSource::Db,
        next_run_at: Some(target),
        last_run_at: None,
        last_result: None,
        until_at: Some(target + Duration::minutes(1)),
        stagger_key: name,
        timezone: None,
        start_at: None,
        end_at: None,
        display_title: Some(format!("Reminder: {message}")),
    };

    store.create(&task).await?;
    Ok(task)
}

#[cfg(test)]
#[path = "reminder_tests.rs"]
mod tests;
