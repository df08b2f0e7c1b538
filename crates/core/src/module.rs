// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module-registry shared types. The [`crate::module::Module`] trait itself
//! (with its `on_startup`/`on_shutdown` callbacks) lives in `butler-modules`,
//! since it needs the DB pool and credential-store types defined there —
//! this crate only carries the plain-data shapes that cross that boundary.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Per-module outcome after a startup attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    Started,
    Failed,
    CascadeFailed,
}

crate::simple_display! {
    ModuleStatus {
        Started => "started",
        Failed => "failed",
        CascadeFailed => "cascade_failed",
    }
}

/// The fixed suffix set that marks a tool as channel egress, per
/// `<channel>_(send_message|reply_to_message|send_email|reply_to_thread)`.
pub const CHANNEL_EGRESS_SUFFIXES: [&str; 4] =
    ["send_message", "reply_to_message", "send_email", "reply_to_thread"];

/// True if `tool_name` matches the channel-egress naming convention, i.e.
/// `<channel>_<suffix>` for one of [`CHANNEL_EGRESS_SUFFIXES`].
pub fn is_channel_egress_tool_name(tool_name: &str) -> bool {
    CHANNEL_EGRESS_SUFFIXES.iter().any(|suffix| {
        tool_name
            .strip_suffix(suffix)
            .map(|prefix| prefix.ends_with('_') && prefix.len() > 1)
            .unwrap_or(false)
    })
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("module {module:?} registered forbidden channel-egress tool {tool_name:?} on a non-messenger butler")]
pub struct ChannelEgressOwnershipError {
    pub module: String,
    pub tool_name: String,
}

/// Per-module dependency declaration as seen by the topological sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDependencies {
    pub name: String,
    pub dependencies: BTreeSet<String>,
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;
