// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Eligibility sweep (§4.9): the periodic pass over `butler_registry` that
//! applies [`butler_core::ButlerRegistryEntry::sweep_transition`] to every
//! row. Run as one more `ScheduledTask` in `job` mode — the Switchboard
//! registers `"eligibility_sweep"` with its own [`JobDispatcher`] impl
//! rather than a dedicated loop, same as any other module's job handler.

use async_trait::async_trait;
use butler_core::{EligibilityState, EligibilityTransitionReason, TriggerSource};
use butler_scheduler::JobDispatcher;
use butler_storage::RegistryStore;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const ELIGIBILITY_SWEEP_JOB_NAME: &str = "eligibility_sweep";

#[derive(Debug, Clone, Serialize)]
pub struct SweepOutcome {
    pub butler_name: String,
    pub from_state: EligibilityState,
    pub to_state: EligibilityState,
    pub reason: EligibilityTransitionReason,
}

pub struct EligibilitySweeper {
    registry: RegistryStore,
}

impl EligibilitySweeper {
    pub fn new(registry: RegistryStore) -> Self {
        Self { registry }
    }

    /// Walks every registered butler and applies any transition
    /// [`ButlerRegistryEntry::sweep_transition`] finds due at `now`.
    /// Entries with no recorded heartbeat yet (`last_seen_at` is `None`,
    /// e.g. registered but not started) are left alone.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<Vec<SweepOutcome>, crate::error::RouterError> {
        let entries = self.registry.list().await?;
        let mut outcomes = Vec::new();
        for entry in entries {
            if let Some((to_state, reason)) = entry.sweep_transition(now) {
                self.registry.apply_sweep_transition(&entry.name, entry.eligibility_state, to_state, reason, now).await?;
                outcomes.push(SweepOutcome { butler_name: entry.name, from_state: entry.eligibility_state, to_state, reason });
            }
        }
        Ok(outcomes)
    }
}

#[async_trait]
impl JobDispatcher for EligibilitySweeper {
    async fn dispatch_job(
        &self,
        job_name: &str,
        _job_args: serde_json::Value,
        _trigger_source: TriggerSource,
    ) -> Result<serde_json::Value, String> {
        if job_name != ELIGIBILITY_SWEEP_JOB_NAME {
            return Err(format!("unknown job {job_name:?}"));
        }
        let outcomes = self.sweep(Utc::now()).await.map_err(|err| err.to_string())?;
        serde_json::to_value(&outcomes).map_err(|err| err.to_string())
    }
}

#[cfg(test)]
#[path = "eligibility_tests.rs"]
mod tests;
