// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loads, resolves, and validates a butler's config document.

use std::path::Path;

use butler_core::{ButlerConfig, DatabaseConfig, DispatchMode, RuntimeAdapterKind, ScheduleEntryConfig};

use crate::error::ConfigError;
use crate::raw::{RawButler, RawDocument, RawScheduleEntry};
use crate::template;

/// Load a butler config document from `path`: read, parse as TOML, resolve
/// every `${VAR}` reference against the process environment, then validate
/// into a [`ButlerConfig`]. Any failure is reported as fatal — there is no
/// partial startup.
pub fn load(path: &Path) -> Result<ButlerConfig, ConfigError> {
    let raw_text = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
    load_str(&raw_text, path.display().to_string())
}

/// Entry point that takes the document text directly, used by
/// `--check-config` and tests so they don't need a real filesystem path.
pub fn load_str(raw_text: &str, path_label: String) -> Result<ButlerConfig, ConfigError> {
    let value: toml::Value =
        toml::from_str(raw_text).map_err(|source| ConfigError::Parse { path: path_label, source })?;

    let resolved = template::resolve_env_refs(&value, |name| std::env::var(name).ok())
        .map_err(ConfigError::UnresolvedEnvVars)?;

    let doc: RawDocument = resolved.try_into().map_err(|e: toml::de::Error| ConfigError::Shape(e.to_string()))?;

    validate(doc)
}

fn validate(doc: RawDocument) -> Result<ButlerConfig, ConfigError> {
    let RawDocument { butler, modules } = doc;
    let RawButler {
        name,
        port,
        database,
        required_env,
        optional_env,
        scheduler_tick_interval_s,
        heartbeat_interval_s,
        shutdown_timeout_s,
        runtime_adapter,
        switchboard_url,
        is_switchboard,
        max_concurrent_sessions,
        max_queued_sessions,
        schedule,
    } = butler;

    if name.trim().is_empty() {
        return Err(ConfigError::MissingField("butler.name"));
    }
    if port == 0 {
        return Err(ConfigError::MissingField("butler.port"));
    }

    let runtime_adapter = RuntimeAdapterKind::parse(&runtime_adapter)
        .ok_or_else(|| ConfigError::UnknownRuntimeAdapter(runtime_adapter.clone()))?;

    check_interval("scheduler_tick_interval_s", scheduler_tick_interval_s)?;
    check_interval("heartbeat_interval_s", heartbeat_interval_s)?;
    check_interval("shutdown_timeout_s", shutdown_timeout_s)?;

    let database = database
        .map(|db| {
            let schema = db.schema.ok_or(ConfigError::MissingDatabaseSchema)?;
            Ok(DatabaseConfig { url: db.url, schema })
        })
        .transpose()?;

    let schedule = schedule.into_iter().map(validate_schedule_entry).collect::<Result<Vec<_>, _>>()?;

    Ok(ButlerConfig {
        name,
        port,
        database,
        required_env,
        optional_env,
        scheduler_tick_interval_s: scheduler_tick_interval_s as u64,
        heartbeat_interval_s: heartbeat_interval_s as u64,
        shutdown_timeout_s: shutdown_timeout_s as u64,
        runtime_adapter,
        switchboard_url,
        is_switchboard,
        max_concurrent_sessions,
        max_queued_sessions,
        schedule,
        modules,
    })
}

fn check_interval(field: &'static str, value: i64) -> Result<(), ConfigError> {
    if value <= 0 {
        return Err(ConfigError::InvalidInterval { field, value });
    }
    Ok(())
}

fn validate_schedule_entry(entry: RawScheduleEntry) -> Result<ScheduleEntryConfig, ConfigError> {
    let dispatch_mode = match entry.dispatch_mode.as_str() {
        "prompt" => DispatchMode::Prompt,
        "job" => DispatchMode::Job,
        other => return Err(ConfigError::Shape(format!("schedule {:?}: unknown dispatch_mode {other:?}", entry.name))),
    };

    match dispatch_mode {
        DispatchMode::Prompt if entry.prompt.is_none() || entry.job_name.is_some() => {
            return Err(ConfigError::Shape(format!(
                "schedule {:?}: dispatch_mode=prompt requires prompt and forbids job_name/job_args",
                entry.name
            )));
        }
        DispatchMode::Job if entry.job_name.is_none() || entry.prompt.is_some() => {
            return Err(ConfigError::Shape(format!(
                "schedule {:?}: dispatch_mode=job requires job_name and forbids prompt",
                entry.name
            )));
        }
        _ => {}
    }

    butler_core::ScheduledTask::validate_windows(entry.start_at, entry.end_at, entry.until_at)
        .map_err(|e| ConfigError::Shape(format!("schedule {:?}: {e}", entry.name)))?;

    Ok(ScheduleEntryConfig {
        name: entry.name.clone(),
        cron: entry.cron,
        dispatch_mode,
        prompt: entry.prompt,
        job_name: entry.job_name,
        job_args: entry.job_args,
        stagger_key: Some(entry.stagger_key.unwrap_or(entry.name)),
        until_at: entry.until_at,
        timezone: entry.timezone,
        start_at: entry.start_at,
        end_at: entry.end_at,
        display_title: entry.display_title,
    })
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
