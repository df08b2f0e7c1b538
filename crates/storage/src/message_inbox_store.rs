// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage for `message_inbox` (§4.8): the accept-phase write, the
//! process-phase worker's claim-and-advance, and crash-recovery discovery.

use butler_core::message_inbox::{IllegalLifecycleTransition, LifecycleState, MessageInbox, SourceChannel, TraceContext};
use butler_core::RequestId;
use sqlx::Row;

use crate::db::Db;
use crate::error::StorageError;

#[derive(Clone)]
pub struct MessageInboxStore {
    db: Db,
}

impl MessageInboxStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// The accept-phase write: durable before the Switchboard's call
    /// returns. If `idempotency_key` matches an existing row, returns the
    /// existing row's `request_id` instead of inserting a duplicate.
    pub async fn accept(&self, inbox: &MessageInbox) -> Result<RequestId, StorageError> {
        if let Some(key) = &inbox.idempotency_key {
            if let Some(existing) = self.find_by_idempotency_key(key).await? {
                return Ok(existing.request_id);
            }
        }
        sqlx::query(
            "INSERT INTO message_inbox
             (request_id, source_channel, source_endpoint_identity, sender_identity, prompt, trace_id, span_id,
              lifecycle_state, classification, routing_results, created_at, idempotency_key)
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)",
        )
        .bind(inbox.request_id.as_uuid())
        .bind(inbox.source_channel.to_string())
        .bind(&inbox.source_endpoint_identity)
        .bind(&inbox.sender_identity)
        .bind(&inbox.prompt)
        .bind(&inbox.trace_context.trace_id)
        .bind(&inbox.trace_context.span_id)
        .bind(inbox.lifecycle_state.to_string())
        .bind(&inbox.classification)
        .bind(&inbox.routing_results)
        .bind(inbox.created_at)
        .bind(&inbox.idempotency_key)
        .execute(self.db.pool())
        .await?;
        Ok(inbox.request_id)
    }

    pub async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<MessageInbox>, StorageError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} WHERE idempotency_key = $1"))
            .bind(key)
            .fetch_optional(self.db.pool())
            .await?;
        row.map(row_to_inbox).transpose()
    }

    pub async fn get(&self, request_id: RequestId) -> Result<Option<MessageInbox>, StorageError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} WHERE request_id = $1"))
            .bind(request_id.as_uuid())
            .fetch_optional(self.db.pool())
            .await?;
        row.map(row_to_inbox).transpose()
    }

    /// Rows in `accepted` or `dispatching` at startup, for the process-phase
    /// worker to re-dispatch with a `route.process.recovery` span.
    pub async fn recoverable(&self) -> Result<Vec<MessageInbox>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} WHERE lifecycle_state IN ('accepted', 'dispatching') ORDER BY created_at"
        ))
        .fetch_all(self.db.pool())
        .await?;
        rows.into_iter().map(row_to_inbox).collect()
    }

    /// The process-phase worker's claim step (§4.8): locks up to `limit`
    /// rows in `accepted` or `dispatching`, skipping any already locked by
    /// another worker, and marks freshly-accepted rows `dispatching` before
    /// releasing the lock. `FOR UPDATE SKIP LOCKED` is what makes this safe
    /// to call from more than one polling loop at once.
    pub async fn claim_batch(&self, limit: i64) -> Result<Vec<MessageInbox>, StorageError> {
        let mut tx = self.db.pool().begin().await?;
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} WHERE lifecycle_state IN ('accepted', 'dispatching')
             ORDER BY created_at LIMIT $1 FOR UPDATE SKIP LOCKED"
        ))
        .bind(limit)
        .fetch_all(&mut *tx)
        .await?;
        let mut claimed = Vec::with_capacity(rows.len());
        for row in rows {
            let mut inbox = row_to_inbox(row)?;
            if inbox.lifecycle_state == LifecycleState::Accepted {
                sqlx::query("UPDATE message_inbox SET lifecycle_state = 'dispatching' WHERE request_id = $1")
                    .bind(inbox.request_id.as_uuid())
                    .execute(&mut *tx)
                    .await?;
                inbox.lifecycle_state = LifecycleState::Dispatching;
            }
            claimed.push(inbox);
        }
        tx.commit().await?;
        Ok(claimed)
    }

    /// Enforces the legal transition graph
    /// `accepted -> dispatching -> in_progress -> {parsed, errored}`.
    pub async fn transition(
        &self,
        request_id: RequestId,
        to: LifecycleState,
        classification: Option<serde_json::Value>,
        routing_results: Option<serde_json::Value>,
    ) -> Result<(), StorageError> {
        let current = self
            .get(request_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("inbox row {request_id} not found")))?;
        if !current.lifecycle_state.can_transition_to(to) {
            return Err(StorageError::Validation(
                IllegalLifecycleTransition { from: current.lifecycle_state, to }.to_string(),
            ));
        }
        sqlx::query(
            "UPDATE message_inbox SET lifecycle_state = $2, classification = COALESCE($3, classification),
             routing_results = COALESCE($4, routing_results) WHERE request_id = $1",
        )
        .bind(request_id.as_uuid())
        .bind(to.to_string())
        .bind(classification)
        .bind(routing_results)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}

const SELECT_COLUMNS: &str = "request_id, source_channel, source_endpoint_identity, sender_identity, prompt, \
     trace_id, span_id, lifecycle_state, classification, routing_results, created_at, idempotency_key \
     FROM message_inbox";

fn row_to_inbox(r: sqlx::postgres::PgRow) -> Result<MessageInbox, StorageError> {
    let channel: String = r.get("source_channel");
    let source_channel = match channel.as_str() {
        "telegram" => SourceChannel::Telegram,
        "email" => SourceChannel::Email,
        "http" => SourceChannel::Http,
        other => return Err(StorageError::Validation(format!("corrupt source_channel in storage: {other:?}"))),
    };
    let state: String = r.get("lifecycle_state");
    let lifecycle_state = match state.as_str() {
        "accepted" => LifecycleState::Accepted,
        "dispatching" => LifecycleState::Dispatching,
        "in_progress" => LifecycleState::InProgress,
        "parsed" => LifecycleState::Parsed,
        "errored" => LifecycleState::Errored,
        other => return Err(StorageError::Validation(format!("corrupt lifecycle_state in storage: {other:?}"))),
    };
    Ok(MessageInbox {
        request_id: RequestId::from_uuid(r.get("request_id")),
        source_channel,
        source_endpoint_identity: r.get("source_endpoint_identity"),
        sender_identity: r.get("sender_identity"),
        prompt: r.get("prompt"),
        trace_context: TraceContext { trace_id: r.get("trace_id"), span_id: r.get("span_id") },
        lifecycle_state,
        classification: r.get("classification"),
        routing_results: r.get("routing_results"),
        created_at: r.get("created_at"),
        idempotency_key: r.get("idempotency_key"),
    })
}

#[cfg(test)]
#[path = "message_inbox_store_tests.rs"]
mod tests;
