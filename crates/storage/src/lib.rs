// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Postgres-backed storage for the per-butler schema: state, sessions,
//! scheduled tasks, and message inbox, plus the Switchboard-only registry,
//! routing log, and dashboard audit log.

pub mod dashboard_audit_log;
pub mod db;
pub mod error;
pub mod message_inbox_store;
pub mod registry_store;
pub mod routing_log;
pub mod scheduled_task_store;
pub mod session_log;
pub mod state_store;

pub use dashboard_audit_log::DashboardAuditLog;
pub use db::Db;
pub use error::StorageError;
pub use message_inbox_store::MessageInboxStore;
pub use registry_store::RegistryStore;
pub use routing_log::RoutingLog;
pub use scheduled_task_store::ScheduledTaskStore;
pub use session_log::{DailyAggregate, ModelPeriodAggregate, ScheduleCost, SessionLog};
pub use state_store::StateStore;
