// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! 5-field cron evaluation (§4.5). The `cron` crate's own grammar carries a
//! leading seconds field; spec.md's cron strings never do, so every
//! expression is validated and evaluated with an implicit `"0 "` seconds
//! prefix rather than exposing that detail to callers.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;

use crate::error::SchedulerError;

/// Validates a 5-field cron expression, returning the error the config
/// loader and runtime CRUD surface both report on rejection.
pub fn validate(cron_expr: &str) -> Result<(), SchedulerError> {
    parse(cron_expr).map(|_| ())
}

/// The next occurrence strictly after `after`, per the 5-field expression.
pub fn next_occurrence(cron_expr: &str, after: DateTime<Utc>) -> Result<DateTime<Utc>, SchedulerError> {
    let schedule = parse(cron_expr)?;
    schedule.after(&after).next().ok_or_else(|| SchedulerError::InvalidCron {
        cron: cron_expr.to_string(),
        reason: "expression has no future occurrences".to_string(),
    })
}

fn parse(cron_expr: &str) -> Result<Schedule, SchedulerError> {
    let fields: Vec<&str> = cron_expr.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(SchedulerError::InvalidCron {
            cron: cron_expr.to_string(),
            reason: format!("expected 5 fields, got {}", fields.len()),
        });
    }
    let with_seconds = format!("0 {cron_expr}");
    Schedule::from_str(&with_seconds)
        .map_err(|e| SchedulerError::InvalidCron { cron: cron_expr.to_string(), reason: e.to_string() })
}

#[cfg(test)]
#[path = "cron_eval_tests.rs"]
mod tests;
