// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registration of the fixed core tool set every butler exposes (§4.7):
//! status, trigger, `route.execute`, tick, state CRUD, schedule CRUD,
//! sessions/cost reporting, notify/remind/get-attachment, and module
//! introspection.

use std::sync::Arc;

use butler_core::message_inbox::{MessageInbox, SourceChannel, TraceContext};
use butler_core::{RequestId, ScheduledTask, TriggerSource};
use butler_modules::ModuleRegistry;
use butler_scheduler::TickHandler;
use butler_spawner::{SpawnRequest, Spawner};
use butler_storage::{MessageInboxStore, ScheduledTaskStore, SessionLog, StateStore};
use chrono::Utc;

use crate::channel::ChannelGateway;
use crate::error::EndpointError;
use crate::registry::ToolRegistry;
use crate::tool::{FnTool, ToolContext, ToolHandler};

fn arg_str(args: &serde_json::Value, name: &str) -> Result<String, EndpointError> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| EndpointError::InvalidArguments { tool: name.to_string(), reason: format!("missing required string argument {name:?}") })
}

/// Collaborators every core tool closes over. Constructed once at startup
/// (§4.10 step 13) after the spawner, scheduler store, and module registry
/// all exist.
pub struct CoreToolsContext {
    pub butler_name: String,
    pub state: StateStore,
    pub scheduled_tasks: ScheduledTaskStore,
    pub sessions: SessionLog,
    pub message_inbox: MessageInboxStore,
    pub spawner: Arc<Spawner>,
    pub tick_handler: Arc<TickHandler>,
    pub modules: Arc<ModuleRegistry>,
    pub channel: Arc<dyn ChannelGateway>,
}

impl CoreToolsContext {
    pub fn register(&self, registry: &mut ToolRegistry) -> Result<(), EndpointError> {
        self.register_status(registry)?;
        self.register_trigger(registry)?;
        self.register_route_execute(registry)?;
        self.register_tick(registry)?;
        self.register_state(registry)?;
        self.register_schedule(registry)?;
        self.register_sessions(registry)?;
        self.register_notify_remind_attachment(registry)?;
        self.register_module_introspection(registry)?;
        Ok(())
    }

    fn register_status(&self, registry: &mut ToolRegistry) -> Result<(), EndpointError> {
        let butler_name = self.butler_name.clone();
        registry.register(
            "status",
            "core",
            Arc::new(FnTool::new("Reports this butler's name and liveness.", move |_args, _ctx| {
                let butler_name = butler_name.clone();
                async move { Ok(serde_json::json!({ "butler_name": butler_name, "status": "ok" })) }
            })),
        )
    }

    fn register_trigger(&self, registry: &mut ToolRegistry) -> Result<(), EndpointError> {
        let spawner = self.spawner.clone();
        registry.register(
            "trigger",
            "core",
            Arc::new(FnTool::new(
                "Spawns an ad hoc LLM session from a free-form prompt (trigger_source=\"trigger\").",
                move |args, _ctx| {
                    let spawner = spawner.clone();
                    async move {
                        let prompt = arg_str(&args, "prompt")?;
                        let system_prompt = args.get("system_prompt").and_then(|v| v.as_str()).map(str::to_string);
                        let outcome = spawner
                            .invoke(SpawnRequest {
                                prompt,
                                system_prompt,
                                trigger_source: TriggerSource::Trigger,
                                trace_id: butler_core::RequestId::new().to_string(),
                                request_id: None,
                            })
                            .await
                            .map_err(|e| EndpointError::InvalidArguments { tool: "trigger".to_string(), reason: e.to_string() })?;
                        Ok(serde_json::json!({ "session_id": outcome.session_id.to_string(), "result": outcome.result }))
                    }
                },
            )),
        )
    }

    /// The accept phase of §4.8: a single durable write to `message_inbox`
    /// with `lifecycle_state=accepted`, nothing more. The process-phase
    /// worker (`butler-router`) is what actually hands the prompt to the
    /// spawner; this tool must return before that happens, so the
    /// Switchboard's call stays inside the ≤ 50 ms accept-phase budget.
    fn register_route_execute(&self, registry: &mut ToolRegistry) -> Result<(), EndpointError> {
        let message_inbox = self.message_inbox.clone();
        registry.register(
            "route.execute",
            "core",
            Arc::new(FnTool::new(
                "Accept-phase entry point for a routed message (§4.8); the process phase runs asynchronously.",
                move |args, _ctx| {
                    let message_inbox = message_inbox.clone();
                    async move {
                        let prompt = arg_str(&args, "prompt")?;
                        let request_id = args
                            .get("request_id")
                            .and_then(|v| v.as_str())
                            .and_then(|s| RequestId::parse_str(s).ok())
                            .unwrap_or_else(RequestId::new);
                        let source_channel = match args.get("source_channel").and_then(|v| v.as_str()) {
                            Some("telegram") => SourceChannel::Telegram,
                            Some("email") => SourceChannel::Email,
                            _ => SourceChannel::Http,
                        };
                        let source_endpoint_identity = args
                            .get("source_metadata")
                            .and_then(|m| m.get("endpoint_identity"))
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string();
                        let sender_identity = args
                            .get("source_metadata")
                            .and_then(|m| m.get("sender_identity"))
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string();
                        let trace_context = TraceContext {
                            trace_id: args
                                .get("trace_context")
                                .and_then(|t| t.get("trace_id"))
                                .and_then(|v| v.as_str())
                                .map(str::to_string)
                                .unwrap_or_else(|| request_id.to_string()),
                            span_id: args
                                .get("trace_context")
                                .and_then(|t| t.get("span_id"))
                                .and_then(|v| v.as_str())
                                .map(str::to_string),
                        };
                        let idempotency_key = args.get("idempotency_key").and_then(|v| v.as_str()).map(str::to_string);

                        let row = MessageInbox {
                            request_id,
                            source_channel,
                            source_endpoint_identity,
                            sender_identity,
                            prompt,
                            trace_context,
                            lifecycle_state: butler_core::LifecycleState::Accepted,
                            classification: None,
                            routing_results: None,
                            created_at: Utc::now(),
                            idempotency_key,
                        };
                        let accepted_request_id = message_inbox
                            .accept(&row)
                            .await
                            .map_err(|e| EndpointError::InvalidArguments { tool: "route.execute".to_string(), reason: e.to_string() })?;
                        Ok(serde_json::json!({ "request_id": accepted_request_id.to_string(), "lifecycle_state": "accepted" }))
                    }
                },
            )),
        )
    }

    fn register_tick(&self, registry: &mut ToolRegistry) -> Result<(), EndpointError> {
        let tick_handler = self.tick_handler.clone();
        registry.register(
            "tick",
            "core",
            Arc::new(FnTool::new("Runs one scheduler tick out of band (operator/debug use).", move |_args, _ctx| {
                let tick_handler = tick_handler.clone();
                async move {
                    let outcomes = tick_handler
                        .tick(Utc::now())
                        .await
                        .map_err(|e| EndpointError::InvalidArguments { tool: "tick".to_string(), reason: e.to_string() })?;
                    Ok(serde_json::to_value(
                        outcomes
                            .into_iter()
                            .map(|o| serde_json::json!({ "task_name": o.task_name, "success": o.success, "auto_disabled": o.auto_disabled }))
                            .collect::<Vec<_>>(),
                    )
                    .expect("TickOutcome summaries always serialize"))
                }
            })),
        )
    }

    fn register_state(&self, registry: &mut ToolRegistry) -> Result<(), EndpointError> {
        let get_store = self.state.clone();
        registry.register(
            "state.get",
            "core",
            Arc::new(FnTool::new("Reads one state entry by key.", move |args, _ctx| {
                let store = get_store.clone();
                async move {
                    let key = arg_str(&args, "key")?;
                    let entry = store.get(&key).await.map_err(|e| EndpointError::InvalidArguments { tool: "state.get".to_string(), reason: e.to_string() })?;
                    Ok(serde_json::to_value(entry).expect("StateEntry always serializes"))
                }
            })),
        )?;

        let set_store = self.state.clone();
        registry.register(
            "state.set",
            "core",
            Arc::new(FnTool::new("Writes a state entry, creating or versioning it.", move |args, _ctx| {
                let store = set_store.clone();
                async move {
                    let key = arg_str(&args, "key")?;
                    let value = args.get("value").cloned().unwrap_or(serde_json::Value::Null);
                    let version = store.set(&key, value).await.map_err(|e| EndpointError::InvalidArguments { tool: "state.set".to_string(), reason: e.to_string() })?;
                    Ok(serde_json::json!({ "key": key, "version": version }))
                }
            })),
        )?;

        let delete_store = self.state.clone();
        registry.register(
            "state.delete",
            "core",
            Arc::new(FnTool::new("Deletes a state entry; deleting an absent key is not an error.", move |args, _ctx| {
                let store = delete_store.clone();
                async move {
                    let key = arg_str(&args, "key")?;
                    store.delete(&key).await.map_err(|e| EndpointError::InvalidArguments { tool: "state.delete".to_string(), reason: e.to_string() })?;
                    Ok(serde_json::json!({ "deleted": key }))
                }
            })),
        )?;

        let list_store = self.state.clone();
        registry.register(
            "state.list",
            "core",
            Arc::new(FnTool::new("Lists state entries, optionally by key prefix.", move |args, _ctx| {
                let store = list_store.clone();
                async move {
                    let prefix = args.get("prefix").and_then(|v| v.as_str()).map(str::to_string);
                    let keys_only = args.get("keys_only").and_then(|v| v.as_bool()).unwrap_or(false);
                    let entries = store
                        .list(prefix.as_deref(), keys_only)
                        .await
                        .map_err(|e| EndpointError::InvalidArguments { tool: "state.list".to_string(), reason: e.to_string() })?;
                    Ok(serde_json::to_value(entries).expect("StateEntry list always serializes"))
                }
            })),
        )
    }

    fn register_schedule(&self, registry: &mut ToolRegistry) -> Result<(), EndpointError> {
        let list_store = self.scheduled_tasks.clone();
        registry.register(
            "schedule.list",
            "core",
            Arc::new(FnTool::new("Lists every scheduled task.", move |_args, _ctx| {
                let store = list_store.clone();
                async move {
                    let tasks = store.list().await.map_err(|e| EndpointError::InvalidArguments { tool: "schedule.list".to_string(), reason: e.to_string() })?;
                    Ok(serde_json::to_value(tasks).expect("ScheduledTask list always serializes"))
                }
            })),
        )?;

        let create_store = self.scheduled_tasks.clone();
        registry.register(
            "schedule.create",
            "core",
            Arc::new(FnTool::new("Creates a db-sourced scheduled task from a prompt or job payload.", move |args, _ctx| {
                let store = create_store.clone();
                async move {
                    let mut task = parse_scheduled_task(&args)?;
                    task.next_run_at = Some(compute_next_run_at(&task.cron, &task.stagger_key)?);
                    store.create(&task).await.map_err(|e| EndpointError::InvalidArguments { tool: "schedule.create".to_string(), reason: e.to_string() })?;
                    Ok(serde_json::json!({ "name": task.name, "next_run_at": task.next_run_at }))
                }
            })),
        )?;

        let update_store = self.scheduled_tasks.clone();
        registry.register(
            "schedule.update",
            "core",
            Arc::new(FnTool::new("Replaces a db-sourced scheduled task's definition by name.", move |args, _ctx| {
                let store = update_store.clone();
                async move {
                    let mut task = parse_scheduled_task(&args)?;
                    task.next_run_at = Some(compute_next_run_at(&task.cron, &task.stagger_key)?);
                    store.upsert(&task).await.map_err(|e| EndpointError::InvalidArguments { tool: "schedule.update".to_string(), reason: e.to_string() })?;
                    Ok(serde_json::json!({ "name": task.name, "next_run_at": task.next_run_at }))
                }
            })),
        )?;

        let delete_store = self.scheduled_tasks.clone();
        registry.register(
            "schedule.delete",
            "core",
            Arc::new(FnTool::new("Deletes a db-sourced scheduled task by name (toml-sourced tasks may only be disabled).", move |args, _ctx| {
                let store = delete_store.clone();
                async move {
                    let name = arg_str(&args, "name")?;
                    store.delete(&name).await.map_err(|e| EndpointError::InvalidArguments { tool: "schedule.delete".to_string(), reason: e.to_string() })?;
                    Ok(serde_json::json!({ "deleted": name }))
                }
            })),
        )
    }

    fn register_sessions(&self, registry: &mut ToolRegistry) -> Result<(), EndpointError> {
        let list_log = self.sessions.clone();
        registry.register(
            "sessions.list",
            "core",
            Arc::new(FnTool::new("Lists recent sessions, newest first.", move |args, _ctx| {
                let log = list_log.clone();
                async move {
                    let limit = args.get("limit").and_then(|v| v.as_u64()).unwrap_or(50) as u32;
                    let offset = args.get("offset").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
                    let sessions = log.list(limit, offset).await.map_err(|e| EndpointError::InvalidArguments { tool: "sessions.list".to_string(), reason: e.to_string() })?;
                    Ok(serde_json::to_value(sessions).expect("Session list always serializes"))
                }
            })),
        )?;

        let get_log = self.sessions.clone();
        registry.register(
            "sessions.get",
            "core",
            Arc::new(FnTool::new("Fetches one session by id.", move |args, _ctx| {
                let log = get_log.clone();
                async move {
                    let id_str = arg_str(&args, "session_id")?;
                    let id = butler_core::SessionId::parse_str(&id_str)
                        .map_err(|_| EndpointError::InvalidArguments { tool: "sessions.get".to_string(), reason: format!("{id_str:?} is not a valid session id") })?;
                    let in_flight = log.in_flight().await.map_err(|e| EndpointError::InvalidArguments { tool: "sessions.get".to_string(), reason: e.to_string() })?;
                    if let Some(session) = in_flight.into_iter().find(|s| s.id == id) {
                        return Ok(serde_json::to_value(session).expect("Session always serializes"));
                    }
                    let mut offset = 0u32;
                    loop {
                        let page = log.list(100, offset).await.map_err(|e| EndpointError::InvalidArguments { tool: "sessions.get".to_string(), reason: e.to_string() })?;
                        if page.is_empty() {
                            return Err(EndpointError::InvalidArguments { tool: "sessions.get".to_string(), reason: format!("session {id} not found") });
                        }
                        if let Some(session) = page.iter().find(|s| s.id == id) {
                            return Ok(serde_json::to_value(session).expect("Session always serializes"));
                        }
                        offset += 100;
                    }
                }
            })),
        )?;

        let summary_log = self.sessions.clone();
        registry.register(
            "sessions.summary",
            "core",
            Arc::new(FnTool::new("Per-model token/cost aggregate since a given timestamp.", move |args, _ctx| {
                let log = summary_log.clone();
                async move {
                    let since = args
                        .get("since")
                        .and_then(|v| v.as_str())
                        .map(|s| s.parse::<chrono::DateTime<Utc>>())
                        .transpose()
                        .map_err(|_| EndpointError::InvalidArguments { tool: "sessions.summary".to_string(), reason: "since must be RFC3339".to_string() })?
                        .unwrap_or_else(|| Utc::now() - chrono::Duration::days(1));
                    let aggregates = log.aggregate_by_model(since).await.map_err(|e| EndpointError::InvalidArguments { tool: "sessions.summary".to_string(), reason: e.to_string() })?;
                    Ok(serde_json::to_value(aggregates).expect("aggregates always serialize"))
                }
            })),
        )?;

        let daily_log = self.sessions.clone();
        registry.register(
            "sessions.daily",
            "core",
            Arc::new(FnTool::new("Daily per-model token/cost time series.", move |args, _ctx| {
                let log = daily_log.clone();
                async move {
                    let days = args.get("days").and_then(|v| v.as_u64()).unwrap_or(14) as u32;
                    let series = log.daily_time_series(days).await.map_err(|e| EndpointError::InvalidArguments { tool: "sessions.daily".to_string(), reason: e.to_string() })?;
                    Ok(serde_json::to_value(series).expect("daily series always serializes"))
                }
            })),
        )?;

        let top_log = self.sessions.clone();
        registry.register(
            "top-sessions",
            "core",
            Arc::new(FnTool::new("The N most token-expensive sessions.", move |args, _ctx| {
                let log = top_log.clone();
                async move {
                    let n = args.get("n").and_then(|v| v.as_u64()).unwrap_or(10) as u32;
                    let sessions = log.top_sessions_by_tokens(n).await.map_err(|e| EndpointError::InvalidArguments { tool: "top-sessions".to_string(), reason: e.to_string() })?;
                    Ok(serde_json::to_value(sessions).expect("Session list always serializes"))
                }
            })),
        )?;

        let cost_log = self.sessions.clone();
        registry.register(
            "schedule-costs",
            "core",
            Arc::new(FnTool::new("Total cost attributed to each `schedule:<name>` trigger source.", move |_args, _ctx| {
                let log = cost_log.clone();
                async move {
                    let costs = log.schedule_costs().await.map_err(|e| EndpointError::InvalidArguments { tool: "schedule-costs".to_string(), reason: e.to_string() })?;
                    Ok(serde_json::to_value(costs).expect("ScheduleCost list always serializes"))
                }
            })),
        )
    }

    fn register_notify_remind_attachment(&self, registry: &mut ToolRegistry) -> Result<(), EndpointError> {
        let notify_channel = self.channel.clone();
        registry.register(
            "notify",
            "core",
            Arc::new(FnTool::new("Sends a one-off message through this butler's messenger module.", move |args, _ctx| {
                let channel = notify_channel.clone();
                async move {
                    let message = arg_str(&args, "message")?;
                    channel.notify(&message).await?;
                    Ok(serde_json::json!({ "sent": true }))
                }
            })),
        )?;

        let remind_store = self.scheduled_tasks.clone();
        registry.register(
            "remind",
            "core",
            Arc::new(FnTool::new("Schedules a one-shot reminder (§4.5).", move |args, _ctx| {
                let store = remind_store.clone();
                async move {
                    let message = arg_str(&args, "message")?;
                    let channel = arg_str(&args, "channel")?;
                    let delay_minutes = args.get("delay_minutes").and_then(|v| v.as_i64());
                    let remind_at = args
                        .get("remind_at")
                        .and_then(|v| v.as_str())
                        .map(|s| s.parse::<chrono::DateTime<Utc>>())
                        .transpose()
                        .map_err(|_| EndpointError::InvalidArguments { tool: "remind".to_string(), reason: "remind_at must be RFC3339".to_string() })?;
                    let task = butler_scheduler::remind(&store, &message, &channel, delay_minutes, remind_at, Utc::now())
                        .await
                        .map_err(|e| EndpointError::InvalidArguments { tool: "remind".to_string(), reason: e.to_string() })?;
                    Ok(serde_json::json!({ "name": task.name, "next_run_at": task.next_run_at }))
                }
            })),
        )?;

        let attachment_channel = self.channel.clone();
        registry.register(
            "get-attachment",
            "core",
            Arc::new(FnTool::new("Fetches attachment bytes through this butler's messenger module, base64-encoded in the response.", move |args, _ctx| {
                let channel = attachment_channel.clone();
                async move {
                    let attachment_id = arg_str(&args, "attachment_id")?;
                    let bytes = channel.get_attachment(&attachment_id).await?;
                    use base64::Engine;
                    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                    Ok(serde_json::json!({ "base64": encoded }))
                }
            })),
        )
    }

    fn register_module_introspection(&self, registry: &mut ToolRegistry) -> Result<(), EndpointError> {
        let modules = self.modules.clone();
        registry.register(
            "module.states",
            "core",
            Arc::new(FnTool::new("Reports each module's load order and lifecycle status.", move |_args, _ctx| {
                let modules = modules.clone();
                async move {
                    let states: Vec<_> = modules
                        .load_order()
                        .iter()
                        .map(|name| serde_json::json!({ "name": name, "status": modules.status(name) }))
                        .collect();
                    Ok(serde_json::Value::Array(states))
                }
            })),
        )?;

        registry.register(
            "module.set-enabled",
            "core",
            Arc::new(FnTool::new(
                "Out of scope at the core layer: module enable/disable is a config-time decision, not a runtime toggle.",
                move |_args, _ctx| async move {
                    Err(EndpointError::InvalidArguments {
                        tool: "module.set-enabled".to_string(),
                        reason: "modules are enabled via config and reloaded at startup, not toggled at runtime".to_string(),
                    })
                },
            )),
        )
    }
}

/// Mirrors `reconcile`'s initial-`next_run_at` computation for db-sourced
/// tasks created or updated through the tool endpoint rather than config.
fn compute_next_run_at(cron: &str, stagger_key: &str) -> Result<chrono::DateTime<Utc>, EndpointError> {
    let now = Utc::now();
    let raw_next = butler_scheduler::next_occurrence(cron, now)
        .map_err(|e| EndpointError::InvalidArguments { tool: "schedule".to_string(), reason: e.to_string() })?;
    let raw_next_after = butler_scheduler::next_occurrence(cron, raw_next)
        .map_err(|e| EndpointError::InvalidArguments { tool: "schedule".to_string(), reason: e.to_string() })?;
    let cadence_seconds = (raw_next_after - raw_next).num_seconds().max(1) as u64;
    Ok(raw_next + butler_scheduler::stagger_offset(stagger_key, cadence_seconds, 900))
}

/// Builds a `source=Db` scheduled task from the tool-call arguments: callers
/// of `schedule.create`/`schedule.update` never supply an id or source,
/// both of which only make sense for toml-reconciled rows.
fn parse_scheduled_task(args: &serde_json::Value) -> Result<ScheduledTask, EndpointError> {
    let name = arg_str(args, "name")?;
    let cron = arg_str(args, "cron")?;

    let payload = if let Some(prompt) = args.get("prompt").and_then(|v| v.as_str()) {
        butler_core::DispatchPayload::Prompt { prompt: prompt.to_string() }
    } else if let Some(job_name) = args.get("job_name").and_then(|v| v.as_str()) {
        let job_args = args.get("job_args").cloned().unwrap_or(serde_json::Value::Null);
        butler_core::DispatchPayload::Job { job_name: job_name.to_string(), job_args }
    } else {
        return Err(EndpointError::InvalidArguments {
            tool: "schedule".to_string(),
            reason: "exactly one of `prompt` or `job_name` is required".to_string(),
        });
    };

    let parse_timestamp = |field: &str| -> Result<Option<chrono::DateTime<Utc>>, EndpointError> {
        args.get(field)
            .and_then(|v| v.as_str())
            .map(|s| s.parse::<chrono::DateTime<Utc>>())
            .transpose()
            .map_err(|_| EndpointError::InvalidArguments { tool: "schedule".to_string(), reason: format!("{field} must be RFC3339") })
    };

    Ok(ScheduledTask {
        id: butler_core::ScheduledTaskId::new(),
        stagger_key: name.clone(),
        name,
        cron,
        payload,
        enabled: args.get("enabled").and_then(|v| v.as_bool()).unwrap_or(true),
        source: butler_core::ScheduleSource::Db,
        next_run_at: None,
        last_run_at: None,
        last_result: None,
        until_at: parse_timestamp("until_at")?,
        timezone: args.get("timezone").and_then(|v| v.as_str()).map(str::to_string),
        start_at: parse_timestamp("start_at")?,
        end_at: parse_timestamp("end_at")?,
        display_title: args.get("display_title").and_then(|v| v.as_str()).map(str::to_string),
    })
}

#[cfg(test)]
#[path = "core_tools_tests.rs"]
mod tests;
