// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional fail-open memory-context collaborator (§4.6). No module in
//! this repo implements it yet; it exists so a future module can plug in
//! without the spawner's invocation path changing.

use async_trait::async_trait;
use butler_core::SessionId;

#[async_trait]
pub trait MemoryContext: Send + Sync {
    /// Called before invocation; the result, if any, is appended to the
    /// system prompt. Errors are the implementor's concern — this method
    /// signature has no error channel because a failure here must never
    /// affect the primary path.
    async fn fetch_memory_context(&self, prompt: &str) -> Option<String>;

    /// Called after a successful invocation.
    async fn store_session_episode(&self, session_id: SessionId, prompt: &str, result: &str);
}
