// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic staggering (§4.5, scenario 2): disperses co-scheduled
//! tasks across a cadence so they don't all fire at the same instant.

use sha2::{Digest, Sha256};

pub const DEFAULT_MAX_STAGGER_SECONDS: u64 = 900;

/// `offset = hash(stagger_key) mod min(max_stagger, cadence - 1)`. Pure and
/// deterministic: identical `(stagger_key, cadence_seconds, max_stagger)`
/// always produce the same offset, across process restarts.
pub fn stagger_offset(stagger_key: &str, cadence_seconds: u64, max_stagger: u64) -> chrono::Duration {
    let bound = max_stagger.min(cadence_seconds.saturating_sub(1)).max(1);
    let digest = Sha256::digest(stagger_key.as_bytes());
    let hash_u64 = u64::from_be_bytes(digest[..8].try_into().expect("digest is 32 bytes"));
    chrono::Duration::seconds((hash_u64 % bound) as i64)
}

/// [`stagger_offset`] with the spec's default `max_stagger = 900s`.
pub fn stagger_offset_default(stagger_key: &str, cadence_seconds: u64) -> chrono::Duration {
    stagger_offset(stagger_key, cadence_seconds, DEFAULT_MAX_STAGGER_SECONDS)
}

#[cfg(test)]
#[path = "stagger_tests.rs"]
mod tests;
