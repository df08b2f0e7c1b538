// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`ButlerConfig`] — the validated, immutable configuration of one butler
//! process. Parsing, `${VAR}` resolution, and schema validation live in
//! `butler-config`; this crate only carries the validated shape so that
//! every downstream crate can depend on it without pulling in the loader.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Selects which concrete [`crate::RuntimeAdapter`]-shaped driver a butler's
/// spawner uses. Validated against a fixed registry at config-load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeAdapterKind {
    ClaudeCli,
    CodexCli,
    Sdk,
}

crate::simple_display! {
    RuntimeAdapterKind {
        ClaudeCli => "claude_cli",
        CodexCli => "codex_cli",
        Sdk => "sdk",
    }
}

impl RuntimeAdapterKind {
    pub const ALL: [Self; 3] = [Self::ClaudeCli, Self::CodexCli, Self::Sdk];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.to_string() == name)
    }
}

/// Database connection coordinates for one butler's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    /// Required when the URL points at a database shared by multiple
    /// butlers, to enforce per-butler schema isolation.
    pub schema: String,
}

/// A declarative `butler.schedule` entry as it appears in config, before
/// reconciliation against the DB-backed [`crate::ScheduledTask`] table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntryConfig {
    pub name: String,
    pub cron: String,
    pub dispatch_mode: crate::scheduled_task::DispatchMode,
    pub prompt: Option<String>,
    pub job_name: Option<String>,
    pub job_args: Option<serde_json::Value>,
    #[serde(default)]
    pub stagger_key: Option<String>,
    pub until_at: Option<chrono::DateTime<chrono::Utc>>,
    pub timezone: Option<String>,
    pub start_at: Option<chrono::DateTime<chrono::Utc>>,
    pub end_at: Option<chrono::DateTime<chrono::Utc>>,
    pub display_title: Option<String>,
}

/// Immutable, validated butler configuration. Constructed once by the
/// orchestrator at startup; any load failure is startup-fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButlerConfig {
    /// Unique fleet-wide.
    pub name: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub required_env: Vec<String>,
    pub optional_env: Vec<String>,
    pub scheduler_tick_interval_s: u64,
    pub heartbeat_interval_s: u64,
    pub shutdown_timeout_s: u64,
    pub runtime_adapter: RuntimeAdapterKind,
    pub switchboard_url: String,
    pub is_switchboard: bool,
    pub max_concurrent_sessions: u32,
    pub max_queued_sessions: u32,
    pub schedule: Vec<ScheduleEntryConfig>,
    pub modules: BTreeMap<String, serde_json::Value>,
}

impl ButlerConfig {
    /// Default switchboard base URL when unconfigured, per the
    /// `BUTLERS_SWITCHBOARD_URL` environment convention.
    pub const DEFAULT_SWITCHBOARD_URL: &'static str = "http://localhost:40200";
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
