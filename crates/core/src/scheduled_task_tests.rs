// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn ts(y: i32, m: u32, d: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

#[test]
fn payload_mode_matches_variant() {
    let prompt = DispatchPayload::Prompt { prompt: "hi".into() };
    assert_eq!(prompt.mode(), DispatchMode::Prompt);
    let job = DispatchPayload::Job { job_name: "sweep".into(), job_args: serde_json::json!({}) };
    assert_eq!(job.mode(), DispatchMode::Job);
}

#[test]
fn end_at_must_be_after_start_at() {
    let err = ScheduledTask::validate_windows(Some(ts(2026, 1, 2)), Some(ts(2026, 1, 1)), None).unwrap_err();
    assert!(matches!(err, ScheduledTaskError::EndNotAfterStart { .. }));
}

#[test]
fn end_at_equal_to_start_at_is_rejected() {
    let err = ScheduledTask::validate_windows(Some(ts(2026, 1, 1)), Some(ts(2026, 1, 1)), None).unwrap_err();
    assert!(matches!(err, ScheduledTaskError::EndNotAfterStart { .. }));
}

#[test]
fn until_at_before_start_at_is_rejected() {
    let err = ScheduledTask::validate_windows(Some(ts(2026, 1, 5)), None, Some(ts(2026, 1, 1))).unwrap_err();
    assert!(matches!(err, ScheduledTaskError::UntilBeforeStart { .. }));
}

#[test]
fn until_at_equal_to_start_at_is_accepted() {
    assert!(ScheduledTask::validate_windows(Some(ts(2026, 1, 1)), None, Some(ts(2026, 1, 1))).is_ok());
}

#[test]
fn windows_are_optional() {
    assert!(ScheduledTask::validate_windows(None, None, None).is_ok());
}

#[test]
fn builder_produces_a_prompt_task() {
    let task = ScheduledTask::builder().name("daily").cron("0 9 * * *").build();
    assert_eq!(task.name, "daily");
    assert_eq!(task.payload.mode(), DispatchMode::Prompt);
    assert!(task.enabled);
}
