// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use butler_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("tool name collision: {name:?} is registered by both {first_owner} and {second_owner}")]
    ToolCollision { name: String, first_owner: String, second_owner: String },

    #[error("unknown tool: {0:?}")]
    UnknownTool(String),

    #[error("invalid arguments for tool {tool:?}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Scheduler(#[from] butler_scheduler::SchedulerError),
}
