// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use butler_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum SpawnerError {
    #[error("spawner is no longer accepting sessions (draining or shut down)")]
    NotAccepting,

    #[error("spawner queue is full (max_concurrent_sessions + max_queued_sessions reached)")]
    QueueFull,

    #[error("refused: this trigger_source=\"trigger\" call would deadlock on its own parent session's permit")]
    SelfDeadlock,

    #[error("runtime invocation failed: {0}")]
    RuntimeInvocation(String),

    #[error("session cancelled at drain timeout")]
    Cancelled,

    #[error(transparent)]
    Storage(#[from] StorageError),
}
