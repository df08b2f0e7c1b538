// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The concurrency gate: a `tokio::sync::Semaphore` sized to
//! `max_concurrent_sessions`, a counting guard bounding queued waiters to
//! `max_queued_sessions`, and the self-deadlock guard for
//! `trigger_source="trigger"` (§4.6).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use butler_core::TriggerSource;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::SpawnerError;

/// Held for the lifetime of one in-flight invocation. Dropping it frees
/// both the semaphore permit and the queue-depth slot.
pub struct SpawnPermit {
    _permit: OwnedSemaphorePermit,
    admitted: Arc<AtomicUsize>,
}

impl Drop for SpawnPermit {
    fn drop(&mut self) {
        self.admitted.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct SpawnGate {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    capacity: usize,
    admitted: Arc<AtomicUsize>,
    accepting: AtomicBool,
}

impl SpawnGate {
    pub fn new(max_concurrent_sessions: u32, max_queued_sessions: u32) -> Self {
        let max_concurrent = max_concurrent_sessions.max(1) as usize;
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            capacity: max_concurrent + max_queued_sessions as usize,
            admitted: Arc::new(AtomicUsize::new(0)),
            accepting: AtomicBool::new(true),
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Flips the gate so every subsequent `acquire` fails immediately.
    /// Idempotent.
    pub fn stop_accepting(&self) {
        self.accepting.store(false, Ordering::SeqCst);
    }

    /// Count of sessions currently holding a permit (running, not
    /// queued). Used by [`crate::Spawner::drain`] to detect quiescence.
    pub fn in_flight_count(&self) -> usize {
        self.max_concurrent - self.semaphore.available_permits()
    }

    /// Forcibly releases any waiters still blocked on `acquire` so drain
    /// can return instead of waiting out an unbounded queue.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Reserves a queue slot and waits for a permit. Rejects immediately
    /// (without queuing) when the gate is closed, the queue is full, or
    /// the call is a self-triggered nested invocation with zero free
    /// permits.
    pub async fn acquire(&self, trigger_source: &TriggerSource) -> Result<SpawnPermit, SpawnerError> {
        if !self.is_accepting() {
            return Err(SpawnerError::NotAccepting);
        }
        if trigger_source.is_trigger() && self.semaphore.available_permits() == 0 {
            return Err(SpawnerError::SelfDeadlock);
        }

        loop {
            let current = self.admitted.load(Ordering::SeqCst);
            if current >= self.capacity {
                return Err(SpawnerError::QueueFull);
            }
            if self
                .admitted
                .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                break;
            }
        }

        match self.semaphore.clone().acquire_owned().await {
            Ok(permit) => Ok(SpawnPermit { _permit: permit, admitted: self.admitted.clone() }),
            Err(_closed) => {
                self.admitted.fetch_sub(1, Ordering::SeqCst);
                Err(SpawnerError::NotAccepting)
            }
        }
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
