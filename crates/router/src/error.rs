// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use butler_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("target butler {0:?} is not registered")]
    UnknownTarget(String),

    #[error("route.execute call to {target:?} failed: {reason}")]
    Accept { target: String, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Spawner(#[from] butler_spawner::SpawnerError),
}
