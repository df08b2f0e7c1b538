// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML↔DB reconciliation (§4.5): matches declarative `butler.schedule`
//! entries to `scheduled_tasks` rows by name at startup.

use butler_core::{DispatchPayload, ScheduleEntryConfig, ScheduleSource, ScheduledTask, ScheduledTaskId};
use butler_storage::ScheduledTaskStore;
use chrono::{DateTime, Utc};

use crate::cron_eval::next_occurrence;
use crate::error::SchedulerError;
use crate::stagger::stagger_offset_default;

/// Reconciles `entries` against the store: inserts new `source='toml'`
/// rows, updates rows whose dispatch-relevant fields changed (recomputing
/// `next_run_at`), and disables (never deletes) `source='toml'` rows that
/// no longer appear in `entries`.
pub async fn reconcile(store: &ScheduledTaskStore, entries: &[ScheduleEntryConfig], now: DateTime<Utc>) -> Result<(), SchedulerError> {
    let mut present_names = Vec::with_capacity(entries.len());
    for entry in entries {
        present_names.push(entry.name.clone());
        reconcile_one(store, entry, now).await?;
    }
    store.disable_missing_toml_rows(&present_names).await?;
    Ok(())
}

async fn reconcile_one(store: &ScheduledTaskStore, entry: &ScheduleEntryConfig, now: DateTime<Utc>) -> Result<(), SchedulerError> {
    let payload = match entry.dispatch_mode {
        butler_core::DispatchMode::Prompt => {
            DispatchPayload::Prompt { prompt: entry.prompt.clone().unwrap_or_default() }
        }
        butler_core::DispatchMode::Job => DispatchPayload::Job {
            job_name: entry.job_name.clone().unwrap_or_default(),
            job_args: entry.job_args.clone().unwrap_or(serde_json::Value::Null),
        },
    };
    let stagger_key = entry.stagger_key.clone().unwrap_or_else(|| entry.name.clone());

    match store.find_by_name(&entry.name).await? {
        None => {
            let next_run_at = Some(compute_initial_next_run_at(&entry.cron, &stagger_key, now)?);
            let task = ScheduledTask {
                id: ScheduledTaskId::new(),
                name: entry.name.clone(),
                cron: entry.cron.clone(),
                payload,
                enabled: true,
                source: ScheduleSource::Toml,
                next_run_at,
                last_run_at: None,
                last_result: None,
                until_at: entry.until_at,
                stagger_key,
                timezone: entry.timezone.clone(),
                start_at: entry.start_at,
                end_at: entry.end_at,
                display_title: entry.display_title.clone(),
            };
            store.upsert(&task).await?;
        }
        Some(existing) => {
            let changed = existing.cron != entry.cron || existing.payload != payload;
            if changed {
                let next_run_at = Some(compute_initial_next_run_at(&entry.cron, &stagger_key, now)?);
                let task = ScheduledTask {
                    cron: entry.cron.clone(),
                    payload,
                    next_run_at,
                    until_at: entry.until_at,
                    stagger_key,
                    timezone: entry.timezone.clone(),
                    start_at: entry.start_at,
                    end_at: entry.end_at,
                    display_title: entry.display_title.clone(),
                    ..existing
                };
                store.upsert(&task).await?;
            } else if !existing.enabled {
                // A source='toml' task that was disabled because it left
                // config and has now re-appeared resumes enabled — see
                // DESIGN.md open-question decision.
                let next_run_at = Some(compute_initial_next_run_at(&entry.cron, &stagger_key, now)?);
                let task = ScheduledTask { enabled: true, next_run_at, ..existing };
                store.upsert(&task).await?;
            }
        }
    }
    Ok(())
}

fn compute_initial_next_run_at(cron: &str, stagger_key: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, SchedulerError> {
    let raw_next = next_occurrence(cron, now)?;
    let raw_next_after = next_occurrence(cron, raw_next)?;
    let cadence_seconds = (raw_next_after - raw_next).num_seconds().max(1) as u64;
    Ok(raw_next + stagger_offset_default(stagger_key, cadence_seconds))
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
