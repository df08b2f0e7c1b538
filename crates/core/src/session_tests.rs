// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

#[test]
fn completion_before_start_is_rejected() {
    let completion = SessionCompletion {
        completed_at: ts(10),
        result: None,
        tool_calls: vec![],
        success: true,
        error: None,
        duration_ms: 5,
        model: None,
        input_tokens: None,
        output_tokens: None,
        cost: None,
    };
    assert!(matches!(
        completion.validate(ts(20)),
        Err(SessionError::CompletedBeforeStarted { .. })
    ));
}

#[test]
fn failed_completion_requires_error_message() {
    let completion = SessionCompletion {
        completed_at: ts(20),
        result: None,
        tool_calls: vec![],
        success: false,
        error: None,
        duration_ms: 5,
        model: None,
        input_tokens: None,
        output_tokens: None,
        cost: None,
    };
    assert!(matches!(completion.validate(ts(10)), Err(SessionError::FailureMissingError)));
}

#[test]
fn successful_completion_with_valid_timestamps_passes() {
    let completion = SessionCompletion {
        completed_at: ts(20),
        result: Some("ok".into()),
        tool_calls: vec![],
        success: true,
        error: None,
        duration_ms: 10_000,
        model: Some("claude".into()),
        input_tokens: Some(10),
        output_tokens: Some(5),
        cost: Some(0.01),
    };
    assert!(completion.validate(ts(10)).is_ok());
}

#[test]
fn builder_produces_an_unstarted_external_session() {
    let session = Session::builder().prompt("ping").build();
    assert_eq!(session.trigger_source, TriggerSource::External);
    assert!(session.completed_at.is_none());
    assert!(session.success.is_none());
}
