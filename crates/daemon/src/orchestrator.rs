// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The phased startup/shutdown sequence (§4.10) that wires every other
//! crate together into one running butler process.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use butler_core::{RequestId, ScheduledTaskError, TriggerSource};
use butler_endpoint::{CoreToolsContext, ToolRegistry};
use butler_endpoint::channel::{ChannelGateway, NoMessengerGateway};
use butler_modules::ModuleRegistry;
use butler_router::{EligibilitySweeper, ProcessWorker, ELIGIBILITY_SWEEP_JOB_NAME};
use butler_scheduler::{JobDispatcher, PromptDispatcher, TickHandler};
use butler_spawner::adapter::build_adapter;
use butler_spawner::env::EnvBuilder;
use butler_spawner::{SpawnRequest, Spawner};
use butler_storage::{Db, MessageInboxStore, RegistryStore, RoutingLog, ScheduledTaskStore, SessionLog, StateStore};
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::credentials::CredentialStore;
use crate::error::DaemonError;
use crate::modules;

/// Hands a scheduled `prompt`-mode task straight to the spawner, with
/// `trigger_source` already carrying `schedule:<name>` from the caller.
struct SpawnerPromptDispatcher {
    spawner: Arc<Spawner>,
}

#[async_trait]
impl PromptDispatcher for SpawnerPromptDispatcher {
    async fn dispatch_prompt(&self, prompt: &str, trigger_source: TriggerSource) -> Result<serde_json::Value, String> {
        let outcome = self
            .spawner
            .invoke(SpawnRequest {
                prompt: prompt.to_string(),
                system_prompt: None,
                trigger_source,
                trace_id: RequestId::new().to_string(),
                request_id: None,
            })
            .await
            .map_err(|err| err.to_string())?;
        Ok(serde_json::json!({ "session_id": outcome.session_id.to_string(), "result": outcome.result }))
    }
}

/// Routes `job`-mode scheduled tasks to whichever handler knows the job
/// name. Today the only such job is the Switchboard's own eligibility
/// sweep; a butler with no registered job handler rejects every job name.
struct DaemonJobDispatcher {
    eligibility_sweeper: Option<Arc<EligibilitySweeper>>,
}

#[async_trait]
impl JobDispatcher for DaemonJobDispatcher {
    async fn dispatch_job(&self, job_name: &str, job_args: serde_json::Value, trigger_source: TriggerSource) -> Result<serde_json::Value, String> {
        if job_name == ELIGIBILITY_SWEEP_JOB_NAME {
            if let Some(sweeper) = &self.eligibility_sweeper {
                return sweeper.dispatch_job(job_name, job_args, trigger_source).await;
            }
        }
        Err(format!("no job handler registered for job_name {job_name:?} on this butler"))
    }
}

/// Every long-lived loop and server task this butler owns, plus the
/// handles needed to tear them down in the order §4.10 specifies.
pub struct Daemon {
    config: butler_core::ButlerConfig,
    db: Db,
    modules: Arc<ModuleRegistry>,
    spawner: Arc<Spawner>,

    endpoint_cancel: CancellationToken,
    endpoint_task: JoinHandle<()>,

    process_cancel: CancellationToken,
    process_task: JoinHandle<()>,

    scheduler_cancel: CancellationToken,
    scheduler_task: JoinHandle<()>,

    heartbeat_cancel: Option<CancellationToken>,
    heartbeat_task: Option<JoinHandle<()>>,

    liveness_cancel: CancellationToken,
    liveness_task: JoinHandle<()>,
}

impl Daemon {
    /// Runs the full 17-step startup sequence. On any fatal error, already
    /// `on_startup`'d modules are torn down in reverse topological order
    /// before the error is returned — there is no partially-started daemon.
    pub async fn start(config: butler_core::ButlerConfig) -> Result<Self, DaemonError> {
        match Self::start_inner(&config).await {
            Ok(daemon) => Ok(daemon),
            Err((err, modules)) => {
                if let Some(modules) = modules {
                    modules.shutdown_all().await;
                }
                Err(err)
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    async fn start_inner(config: &butler_core::ButlerConfig) -> Result<Self, (DaemonError, Option<Arc<ModuleRegistry>>)> {
        // 2. Telemetry is initialised by main() before config is even loaded,
        // since a parse failure still deserves a structured log line.

        // 3. Discover and sort modules.
        let discovered = modules::discover();
        let module_registry = ModuleRegistry::build(discovered, is_messenger(config)).map_err(|err| (err.into(), None))?;

        // 4. Validate per-module configs.
        for name in module_registry.load_order() {
            let Some(module) = module_registry.get(name) else { continue };
            let raw = config.modules.get(name).cloned().unwrap_or(serde_json::Value::Null);
            if let Err(err) = module.validate_config(&raw) {
                tracing::warn!(module = %name, error = %err, "module config validation failed; module will cascade-fail at startup");
            }
        }

        // 5. Validate butler-level env credentials (fast-fail before DB
        // provisioning; step 9 re-checks once the credential store exists).
        let missing_core: Vec<&str> = config.required_env.iter().map(String::as_str).filter(|name| std::env::var(name).is_err()).collect();
        if !missing_core.is_empty() {
            let missing = missing_core.into_iter().map(String::from).collect();
            return Err((DaemonError::MissingCoreCredentials { butler: config.name.clone(), missing }, None));
        }

        // 6-7. Provision DB (schema, pool) and run core migrations.
        let database = config.database.as_ref().ok_or_else(|| {
            (butler_config::ConfigError::MissingField("butler.database").into(), None)
        })?;
        let db = Db::connect(&database.url, &database.schema).await.map_err(|err| (err.into(), None))?;

        // 8. Run module migrations. No domain module in this build declares
        // any, so there is nothing to run beyond the core migrator.

        // 9. Create credential store; validate module credentials
        // (non-fatal per module) then core credentials (fatal).
        let module_registry = Arc::new(module_registry);
        let mut declared_names: Vec<String> = config.required_env.iter().cloned().chain(config.optional_env.iter().cloned()).collect();
        for name in module_registry.load_order() {
            if let Some(module) = module_registry.get(name) {
                declared_names.extend(module.required_credentials());
            }
        }
        let credentials = Arc::new(CredentialStore::from_env(declared_names));
        for name in module_registry.load_order() {
            let Some(module) = module_registry.get(name) else { continue };
            let missing = credentials.missing(&module.required_credentials());
            if !missing.is_empty() {
                tracing::warn!(module = %name, missing = ?missing, "module is missing declared credentials; its on_startup may fail");
            }
        }
        let missing_core = credentials.missing(&config.required_env);
        if !missing_core.is_empty() {
            let missing = missing_core.into_iter().map(String::from).collect();
            return Err((
                DaemonError::MissingCoreCredentials { butler: config.name.clone(), missing },
                Some(module_registry),
            ));
        }

        // 10. Invoke `on_startup` per module, topological order.
        let mut module_registry_mut = Arc::try_unwrap(module_registry).unwrap_or_else(|arc| (*arc).clone_for_startup());
        let credential_values = credentials.clone();
        module_registry_mut
            .start_all(&db, |module_name| {
                let names = module_registry_mut
                    .get(module_name)
                    .map(|m| m.required_credentials())
                    .unwrap_or_default();
                names.into_iter().filter_map(|n| credential_values.resolve(&n).map(|v| (n, v))).collect()
            })
            .await;
        let module_registry = Arc::new(module_registry_mut);

        // 11. Construct spawner with runtime adapter (binary presence on
        // PATH is checked but advisory).
        let adapter = build_adapter(config.runtime_adapter);
        if !binary_is_on_path(adapter.binary_name()) {
            tracing::warn!(binary = adapter.binary_name(), "runtime adapter binary not found on PATH; sessions will fail until installed");
        }
        let session_log = SessionLog::new(db.clone());
        let env_builder = EnvBuilder::new(config.required_env.clone(), config.optional_env.clone(), module_credential_names(&module_registry));
        let tool_endpoint_base_url = format!("http://localhost:{}/mcp", config.port);
        let spawner = Arc::new(Spawner::new(
            config.name.clone(),
            config.max_concurrent_sessions,
            config.max_queued_sessions,
            adapter,
            session_log,
            env_builder,
            credentials.clone(),
            tool_endpoint_base_url,
            None,
        ));

        // 12. Reconcile schedules (§4.5).
        let scheduled_tasks = ScheduledTaskStore::new(db.clone());
        butler_scheduler::reconcile(&scheduled_tasks, &config.schedule, Utc::now())
            .await
            .map_err(|err| (err.into(), Some(module_registry.clone())))?;

        // Switchboard-only collaborators, constructed before tool
        // registration so both the core tools and the job dispatcher can
        // share them.
        let registry_store = config.is_switchboard.then(|| RegistryStore::new(db.clone()));
        let eligibility_sweeper = registry_store.clone().map(|r| Arc::new(EligibilitySweeper::new(r)));

        // 13. Register core tool set, then module tools, then approval
        // gates (the approvals layer itself is out of scope; there is
        // nothing to register here today).
        let mut tool_registry = ToolRegistry::new();
        let channel: Arc<dyn ChannelGateway> = Arc::new(NoMessengerGateway);
        let message_inbox = MessageInboxStore::new(db.clone());
        let tick_handler = Arc::new(TickHandler::new(
            scheduled_tasks.clone(),
            Arc::new(SpawnerPromptDispatcher { spawner: spawner.clone() }),
            Arc::new(DaemonJobDispatcher { eligibility_sweeper: eligibility_sweeper.clone() }),
        ));
        let core_tools = CoreToolsContext {
            butler_name: config.name.clone(),
            state: StateStore::new(db.clone()),
            scheduled_tasks: scheduled_tasks.clone(),
            sessions: SessionLog::new(db.clone()),
            message_inbox: message_inbox.clone(),
            spawner: spawner.clone(),
            tick_handler: tick_handler.clone(),
            modules: module_registry.clone(),
            channel,
        };
        core_tools.register(&mut tool_registry).map_err(|err| (err.into(), Some(module_registry.clone())))?;
        tool_registry.register_module_tools(&module_registry).map_err(|err| (err.into(), Some(module_registry.clone())))?;

        // 14. Start tool-endpoint server (merged with the Switchboard's
        // heartbeat HTTP surface when this butler is the Switchboard).
        let mut app = butler_endpoint::tool_endpoint_router(config.name.clone(), Arc::new(tool_registry));
        if let Some(registry_store) = &registry_store {
            app = app.merge(butler_router::heartbeat_router(Arc::new(registry_store.clone())));
        }
        let listener = TcpListener::bind(("0.0.0.0", config.port))
            .await
            .map_err(|source| (DaemonError::EndpointBind { port: config.port, source }, Some(module_registry.clone())))?;
        let endpoint_cancel = CancellationToken::new();
        let endpoint_cancel_for_task = endpoint_cancel.clone();
        let endpoint_task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { endpoint_cancel_for_task.cancelled().await })
                .await;
            if let Err(err) = result {
                tracing::error!(error = %err, "tool endpoint server exited with an error");
            }
        });

        // The process-phase worker drains `message_inbox` on every butler,
        // not just the one that accepted the message.
        let process_cancel = CancellationToken::new();
        let process_worker = Arc::new(ProcessWorker::new(message_inbox, spawner.clone(), Duration::from_secs(2)));
        process_worker.recover_on_startup().await;
        let process_cancel_for_task = process_cancel.clone();
        let process_task = {
            let worker = process_worker.clone();
            tokio::spawn(async move { worker.run(process_cancel_for_task).await })
        };

        // 15. Start switchboard heartbeat client (if not the switchboard
        // itself).
        let (heartbeat_cancel, heartbeat_task) = if config.is_switchboard {
            (None, None)
        } else {
            let cancel = CancellationToken::new();
            let reporter = Arc::new(butler_router::HeartbeatReporter::new(
                config.switchboard_url.clone(),
                config.name.clone(),
                Duration::from_secs(config.heartbeat_interval_s),
            ));
            let cancel_for_task = cancel.clone();
            let task = tokio::spawn(async move { reporter.run(cancel_for_task).await });
            (Some(cancel), Some(task))
        };

        // 16. Start scheduler loop.
        let scheduler_cancel = CancellationToken::new();
        let scheduler_cancel_for_task = scheduler_cancel.clone();
        let scheduler_interval = Duration::from_secs(config.scheduler_tick_interval_s);
        let scheduler_task = tokio::spawn(async move { run_scheduler_loop(tick_handler, scheduler_interval, scheduler_cancel_for_task).await });

        // 17. Start liveness reporter. On the Switchboard itself this is
        // the eligibility sweep job's own dispatch path via the scheduler
        // loop above; every butler (including the Switchboard) still runs
        // the generic liveness bookkeeping loop that keeps its own process
        // alive as a supervised task.
        let liveness_cancel = CancellationToken::new();
        let liveness_cancel_for_task = liveness_cancel.clone();
        let liveness_task = tokio::spawn(async move { liveness_cancel_for_task.cancelled().await });

        tracing::info!(butler_name = %config.name, port = config.port, is_switchboard = config.is_switchboard, "butler started");

        Ok(Self {
            config: config.clone(),
            db,
            modules: module_registry,
            spawner,
            endpoint_cancel,
            endpoint_task,
            process_cancel,
            process_task,
            scheduler_cancel,
            scheduler_task,
            heartbeat_cancel,
            heartbeat_task,
            liveness_cancel,
            liveness_task,
        })
    }

    /// Mirrors the startup order in reverse, bounded overall by
    /// `shutdown_timeout_s`.
    pub async fn shutdown(self) {
        let timeout = Duration::from_secs(self.config.shutdown_timeout_s);
        let deadline = tokio::time::Instant::now() + timeout;

        // Stop tool-endpoint.
        self.endpoint_cancel.cancel();
        let _ = tokio::time::timeout_at(deadline, self.endpoint_task).await;

        // Stop accepting triggers at the spawner, drain in-flight sessions
        // (cancelled at timeout by `Spawner::drain` itself).
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        self.spawner.drain(remaining).await;

        // Cancel the process-phase worker; an in-progress batch finishes.
        self.process_cancel.cancel();
        let _ = tokio::time::timeout_at(deadline, self.process_task).await;

        // Cancel heartbeat. No MCP clients are held open between calls
        // (`mcp_client::call_tool` is one-shot), so there is nothing else
        // to close there.
        if let Some(cancel) = self.heartbeat_cancel {
            cancel.cancel();
        }
        if let Some(task) = self.heartbeat_task {
            let _ = tokio::time::timeout_at(deadline, task).await;
        }

        // Cancel scheduler, letting an in-progress tick finish.
        self.scheduler_cancel.cancel();
        let _ = tokio::time::timeout_at(deadline, self.scheduler_task).await;

        // Cancel liveness reporter.
        self.liveness_cancel.cancel();
        let _ = tokio::time::timeout_at(deadline, self.liveness_task).await;

        // `on_shutdown` modules in reverse topological order.
        self.modules.shutdown_all().await;

        // Close DB pool.
        self.db.pool().close().await;

        tracing::info!(butler_name = %self.config.name, "butler shut down");
    }
}

async fn run_scheduler_loop(tick_handler: Arc<TickHandler>, interval: Duration, cancel: CancellationToken) {
    loop {
        if let Err(err) = tick_handler.tick(Utc::now()).await {
            tracing::warn!(error = %err, "scheduler tick failed");
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

fn is_messenger(config: &butler_core::ButlerConfig) -> bool {
    config.modules.contains_key("messenger")
}

fn module_credential_names(modules: &ModuleRegistry) -> Vec<String> {
    modules.load_order().iter().filter_map(|name| modules.get(name)).flat_map(|m| m.required_credentials()).collect()
}

fn binary_is_on_path(binary: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(binary).is_file()))
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;

#[allow(dead_code)]
fn _assert_job_error_shape(_: ScheduledTaskError) {}
