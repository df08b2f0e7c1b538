// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{TimeZone, Utc};
use yare::parameterized;

use super::*;

#[test]
fn rejects_wrong_field_count() {
    let err = validate("0 9 * *").unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidCron { .. }));
}

#[test]
fn rejects_garbage_expression() {
    assert!(validate("not a cron").is_err());
}

#[parameterized(
    daily = { "0 9 * * *", "2026-03-15T00:00:00Z", "2026-03-15T09:00:00Z" },
    every_five_minutes = { "*/5 * * * *", "2026-03-15T09:00:00Z", "2026-03-15T09:05:00Z" },
    weekday_only = { "0 9 * * 1-5", "2026-03-14T09:00:01Z", "2026-03-16T09:00:00Z" },
)]
fn computes_next_occurrence(cron_expr: &str, after: &str, expected: &str) {
    let after = after.parse::<DateTime<Utc>>().unwrap();
    let expected = expected.parse::<DateTime<Utc>>().unwrap();
    assert_eq!(next_occurrence(cron_expr, after).unwrap(), expected);
}

#[test]
fn daily_at_nine_fires_at_nine_exactly_scenario_1() {
    // scenario 1 from spec.md §8: firing at t recomputes next_run_at to the
    // following day's occurrence.
    let fired_at = Utc.with_ymd_and_hms(2026, 3, 15, 9, 0, 0).unwrap();
    let next = next_occurrence("0 9 * * *", fired_at).unwrap();
    assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap());
}
