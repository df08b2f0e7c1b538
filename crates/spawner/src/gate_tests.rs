// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use butler_core::TriggerSource;

use super::*;

#[tokio::test]
async fn the_nplus1th_waiter_is_rejected_with_queue_full() {
    let gate = Arc::new(SpawnGate::new(1, 1)); // capacity = 1 running + 1 queued

    let first = gate.acquire(&TriggerSource::Route).await.unwrap();
    let second_gate = gate.clone();
    let second = tokio::spawn(async move { second_gate.acquire(&TriggerSource::Route).await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let third = gate.acquire(&TriggerSource::Route).await;
    assert!(matches!(third, Err(SpawnerError::QueueFull)));

    drop(first);
    let second = second.await.unwrap();
    assert!(second.is_ok());
}

#[tokio::test]
async fn a_freed_permit_admits_a_new_call() {
    let gate = SpawnGate::new(1, 0);
    let permit = gate.acquire(&TriggerSource::Route).await.unwrap();
    drop(permit);

    let second = gate.acquire(&TriggerSource::Route).await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn self_triggered_nested_calls_refuse_instead_of_waiting() {
    let gate = SpawnGate::new(1, 10);
    let _permit = gate.acquire(&TriggerSource::Route).await.unwrap();

    let nested = gate.acquire(&TriggerSource::Trigger).await;
    assert!(matches!(nested, Err(SpawnerError::SelfDeadlock)));
}

#[tokio::test]
async fn trigger_source_trigger_is_accepted_when_a_permit_is_free() {
    let gate = SpawnGate::new(2, 0);
    let _first = gate.acquire(&TriggerSource::Route).await.unwrap();
    let nested = gate.acquire(&TriggerSource::Trigger).await;
    assert!(nested.is_ok());
}

#[tokio::test]
async fn stop_accepting_rejects_every_subsequent_call() {
    let gate = SpawnGate::new(1, 10);
    gate.stop_accepting();
    let result = gate.acquire(&TriggerSource::Route).await;
    assert!(matches!(result, Err(SpawnerError::NotAccepting)));
}

#[tokio::test]
async fn in_flight_count_tracks_held_permits() {
    let gate = SpawnGate::new(2, 0);
    assert_eq!(gate.in_flight_count(), 0);
    let a = gate.acquire(&TriggerSource::Route).await.unwrap();
    assert_eq!(gate.in_flight_count(), 1);
    let b = gate.acquire(&TriggerSource::Route).await.unwrap();
    assert_eq!(gate.in_flight_count(), 2);
    drop(a);
    assert_eq!(gate.in_flight_count(), 1);
    drop(b);
    assert_eq!(gate.in_flight_count(), 0);
}
