// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use butler_core::ScheduledTaskError;
use butler_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("invalid cron expression {cron:?}: {reason}")]
    InvalidCron { cron: String, reason: String },

    #[error(transparent)]
    Task(#[from] ScheduledTaskError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
