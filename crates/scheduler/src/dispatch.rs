// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seam between the scheduler and the spawner/job-handler layers. The
//! scheduler crate never depends on `butler-spawner` directly — the daemon
//! wires a concrete dispatcher at startup, same shape as the teacher's
//! `RuntimeAdapter` seam in `butler-spawner`.

use async_trait::async_trait;
use butler_core::TriggerSource;

/// Hands a `prompt`-mode task's prompt to the spawner.
#[async_trait]
pub trait PromptDispatcher: Send + Sync {
    async fn dispatch_prompt(&self, prompt: &str, trigger_source: TriggerSource) -> Result<serde_json::Value, String>;
}

/// Hands a `job`-mode task to the job handler a module registered for
/// `job_name`.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    async fn dispatch_job(
        &self,
        job_name: &str,
        job_args: serde_json::Value,
        trigger_source: TriggerSource,
    ) -> Result<serde_json::Value, String>;
}
