// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The as-written shape of a butler's config document, deserialized after
//! `${VAR}` resolution but before schema validation.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RawDocument {
    pub butler: RawButler,
    #[serde(default)]
    pub modules: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawDatabase {
    pub url: String,
    pub schema: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawButler {
    pub name: String,
    pub port: u16,
    pub database: Option<RawDatabase>,
    #[serde(default)]
    pub required_env: Vec<String>,
    #[serde(default)]
    pub optional_env: Vec<String>,
    #[serde(default = "default_scheduler_tick_interval_s")]
    pub scheduler_tick_interval_s: i64,
    #[serde(default = "default_heartbeat_interval_s")]
    pub heartbeat_interval_s: i64,
    #[serde(default = "default_shutdown_timeout_s")]
    pub shutdown_timeout_s: i64,
    pub runtime_adapter: String,
    #[serde(default = "default_switchboard_url")]
    pub switchboard_url: String,
    #[serde(default)]
    pub is_switchboard: bool,
    #[serde(default = "default_max_concurrent_sessions")]
    pub max_concurrent_sessions: u32,
    #[serde(default = "default_max_queued_sessions")]
    pub max_queued_sessions: u32,
    #[serde(default)]
    pub schedule: Vec<RawScheduleEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RawScheduleEntry {
    pub name: String,
    pub cron: String,
    pub dispatch_mode: String,
    pub prompt: Option<String>,
    pub job_name: Option<String>,
    pub job_args: Option<serde_json::Value>,
    pub stagger_key: Option<String>,
    pub until_at: Option<chrono::DateTime<chrono::Utc>>,
    pub timezone: Option<String>,
    pub start_at: Option<chrono::DateTime<chrono::Utc>>,
    pub end_at: Option<chrono::DateTime<chrono::Utc>>,
    pub display_title: Option<String>,
}

fn default_scheduler_tick_interval_s() -> i64 {
    30
}

fn default_heartbeat_interval_s() -> i64 {
    120
}

fn default_shutdown_timeout_s() -> i64 {
    30
}

fn default_switchboard_url() -> String {
    butler_core::ButlerConfig::DEFAULT_SWITCHBOARD_URL.to_string()
}

fn default_max_concurrent_sessions() -> u32 {
    1
}

fn default_max_queued_sessions() -> u32 {
    100
}
