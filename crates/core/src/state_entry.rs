// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`StateEntry`] — per-butler versioned key-value row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    pub key: String,
    pub value: serde_json::Value,
    /// Monotonic, starts at 1. Every successful write increments it by
    /// exactly 1.
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

/// Returned by a failed `compare_and_set`: the version actually stored,
/// or `None` if the key did not exist.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
#[error("compare_and_set conflict: expected version {expected}, actual {actual:?}")]
pub struct CasConflict {
    pub expected: u64,
    pub actual: Option<u64>,
}

#[cfg(test)]
#[path = "state_entry_tests.rs"]
mod tests;
