// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tick handler (§4.5): queries due tasks, dispatches them serially,
//! and unconditionally advances every task's schedule afterward.

use std::sync::Arc;

use butler_core::{DispatchPayload, ScheduledTask, TriggerSource};
use butler_storage::ScheduledTaskStore;
use chrono::{DateTime, Utc};

use crate::cron_eval::next_occurrence;
use crate::dispatch::{JobDispatcher, PromptDispatcher};
use crate::error::SchedulerError;
use crate::stagger::stagger_offset_default;

/// Outcome of dispatching a single due task during one tick.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub task_name: String,
    pub success: bool,
    pub next_run_at: Option<DateTime<Utc>>,
    pub auto_disabled: bool,
}

/// Drives one scheduler tick: due-task selection, serial dispatch, and the
/// unconditional `last_run_at`/`next_run_at`/`last_result` advance.
pub struct TickHandler {
    store: ScheduledTaskStore,
    prompt_dispatcher: Arc<dyn PromptDispatcher>,
    job_dispatcher: Arc<dyn JobDispatcher>,
}

impl TickHandler {
    pub fn new(
        store: ScheduledTaskStore,
        prompt_dispatcher: Arc<dyn PromptDispatcher>,
        job_dispatcher: Arc<dyn JobDispatcher>,
    ) -> Self {
        Self { store, prompt_dispatcher, job_dispatcher }
    }

    /// Runs once. Due tasks are queried ordered by `next_run_at` and
    /// dispatched strictly serially — concurrent ticks never overlap
    /// because the caller awaits this before scheduling the next one.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<Vec<TickOutcome>, SchedulerError> {
        let due = self.store.due(now).await?;
        let mut outcomes = Vec::with_capacity(due.len());
        for task in due {
            outcomes.push(self.fire_one(task, now).await?);
        }
        Ok(outcomes)
    }

    async fn fire_one(&self, task: ScheduledTask, now: DateTime<Utc>) -> Result<TickOutcome, SchedulerError> {
        let trigger_source = TriggerSource::Schedule(task.name.clone());
        let dispatch_result = match &task.payload {
            DispatchPayload::Prompt { prompt } => self.prompt_dispatcher.dispatch_prompt(prompt, trigger_source).await,
            DispatchPayload::Job { job_name, job_args } => {
                self.job_dispatcher.dispatch_job(job_name, job_args.clone(), trigger_source).await
            }
        };

        let (success, last_result) = match &dispatch_result {
            Ok(value) => (true, value.clone()),
            Err(err) => (false, serde_json::json!({ "error": err })),
        };

        let mut next_run_at = Some(self.compute_next_run_at(&task, now)?);
        let mut auto_disabled = false;
        if let (Some(until_at), Some(next)) = (task.until_at, next_run_at) {
            if next > until_at {
                next_run_at = None;
                auto_disabled = true;
            }
        }

        self.store.record_fire(task.id, now, next_run_at, last_result).await?;

        Ok(TickOutcome { task_name: task.name, success, next_run_at, auto_disabled })
    }

    fn compute_next_run_at(&self, task: &ScheduledTask, now: DateTime<Utc>) -> Result<DateTime<Utc>, SchedulerError> {
        let raw_next = next_occurrence(&task.cron, now)?;
        let raw_next_after = next_occurrence(&task.cron, raw_next)?;
        let cadence_seconds = (raw_next_after - raw_next).num_seconds().max(1) as u64;
        let offset = stagger_offset_default(&task.stagger_key, cadence_seconds);
        Ok(raw_next + offset)
    }
}

#[cfg(test)]
#[path = "tick_tests.rs"]
mod tests;
