// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`DaemonError`]: the orchestrator's own error type, aggregating every
//! crate it wires together. Every variant is startup-fatal unless the
//! step that produced it says otherwise (module-credential and
//! per-module startup failures are isolated in [`butler_modules::ModuleRegistry`]
//! and never reach this type).

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] butler_config::ConfigError),

    #[error(transparent)]
    Storage(#[from] butler_storage::StorageError),

    #[error(transparent)]
    ModuleRegistry(#[from] butler_modules::ModuleRegistryError),

    #[error(transparent)]
    Scheduler(#[from] butler_scheduler::SchedulerError),

    #[error(transparent)]
    Endpoint(#[from] butler_endpoint::EndpointError),

    #[error(transparent)]
    Spawner(#[from] butler_spawner::SpawnerError),

    #[error(transparent)]
    Router(#[from] butler_router::RouterError),

    #[error("missing required credential(s) for butler {butler:?}: {}", .missing.join(", "))]
    MissingCoreCredentials { butler: String, missing: Vec<String> },

    #[error("failed to bind tool endpoint to port {port}: {source}")]
    EndpointBind { port: u16, source: std::io::Error },
}
