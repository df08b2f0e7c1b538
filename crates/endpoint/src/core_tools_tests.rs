use std::sync::Arc;

use async_trait::async_trait;
use butler_core::TriggerSource;
use butler_modules::ModuleRegistry;
use butler_scheduler::{JobDispatcher, PromptDispatcher, TickHandler};
use butler_spawner::adapter::{AdapterError, InvocationOutcome, InvocationRequest, McpConfig, RuntimeAdapter};
use butler_spawner::env::{EmptyCredentialResolver, EnvBuilder};
use butler_spawner::Spawner;
use butler_storage::{Db, MessageInboxStore, ScheduledTaskStore, SessionLog, StateStore};

use super::*;
use crate::channel::NoMessengerGateway;
use crate::tool::ToolContext;

struct FakeAdapter;

#[async_trait]
impl RuntimeAdapter for FakeAdapter {
    fn binary_name(&self) -> &'static str {
        "fake"
    }

    async fn build_config_file(&self, _mcp_config: &McpConfig) -> Result<std::path::PathBuf, AdapterError> {
        Ok(std::path::PathBuf::new())
    }

    async fn parse_system_prompt_file(&self, _path: &std::path::Path) -> Result<String, AdapterError> {
        Ok(String::new())
    }

    async fn invoke(&self, _request: InvocationRequest) -> Result<InvocationOutcome, AdapterError> {
        Ok(InvocationOutcome { result: "fake-result".to_string(), ..Default::default() })
    }

    async fn reset(&self) {}
}

struct NoopPrompt;

#[async_trait]
impl PromptDispatcher for NoopPrompt {
    async fn dispatch_prompt(&self, _prompt: &str, _trigger_source: TriggerSource) -> Result<serde_json::Value, String> {
        Ok(serde_json::json!({}))
    }
}

struct NoopJob;

#[async_trait]
impl JobDispatcher for NoopJob {
    async fn dispatch_job(&self, _job_name: &str, _job_args: serde_json::Value, _trigger_source: TriggerSource) -> Result<serde_json::Value, String> {
        Ok(serde_json::json!({}))
    }
}

fn context_for(db: Db) -> CoreToolsContext {
    let spawner = Spawner::new(
        "concierge",
        1,
        1,
        Arc::new(FakeAdapter),
        SessionLog::new(db.clone()),
        EnvBuilder::new(vec![], vec![], vec![]),
        Arc::new(EmptyCredentialResolver),
        "http://localhost:9000/mcp",
        None,
    );
    let tick_handler = TickHandler::new(ScheduledTaskStore::new(db.clone()), Arc::new(NoopPrompt), Arc::new(NoopJob));
    CoreToolsContext {
        butler_name: "concierge".to_string(),
        state: StateStore::new(db.clone()),
        scheduled_tasks: ScheduledTaskStore::new(db.clone()),
        sessions: SessionLog::new(db.clone()),
        message_inbox: MessageInboxStore::new(db.clone()),
        spawner: Arc::new(spawner),
        tick_handler: Arc::new(tick_handler),
        modules: Arc::new(ModuleRegistry::build(vec![], true).unwrap()),
        channel: Arc::new(NoMessengerGateway),
    }
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn status_reports_the_butler_name(pool: sqlx::PgPool) {
    let ctx = context_for(Db::from_pool_for_test(pool));
    let mut registry = ToolRegistry::new();
    ctx.register(&mut registry).unwrap();

    let handler = registry.get("status").unwrap();
    let result = handler.call(serde_json::json!({}), &ToolContext::default()).await.unwrap();
    assert_eq!(result["butler_name"], "concierge");
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn state_set_then_get_round_trips_through_the_tool_layer(pool: sqlx::PgPool) {
    let ctx = context_for(Db::from_pool_for_test(pool));
    let mut registry = ToolRegistry::new();
    ctx.register(&mut registry).unwrap();

    let set = registry.get("state.set").unwrap();
    set.call(serde_json::json!({ "key": "k1", "value": { "n": 1 } }), &ToolContext::default()).await.unwrap();

    let get = registry.get("state.get").unwrap();
    let result = get.call(serde_json::json!({ "key": "k1" }), &ToolContext::default()).await.unwrap();
    assert_eq!(result["value"]["n"], 1);
    assert_eq!(result["version"], 1);
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn schedule_create_computes_a_next_run_at(pool: sqlx::PgPool) {
    let ctx = context_for(Db::from_pool_for_test(pool));
    let mut registry = ToolRegistry::new();
    ctx.register(&mut registry).unwrap();

    let create = registry.get("schedule.create").unwrap();
    let result = create
        .call(serde_json::json!({ "name": "nightly", "cron": "0 9 * * *", "prompt": "summarize the day" }), &ToolContext::default())
        .await
        .unwrap();
    assert_eq!(result["name"], "nightly");
    assert!(result["next_run_at"].is_string());
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn schedule_create_rejects_a_payload_with_neither_prompt_nor_job_name(pool: sqlx::PgPool) {
    let ctx = context_for(Db::from_pool_for_test(pool));
    let mut registry = ToolRegistry::new();
    ctx.register(&mut registry).unwrap();

    let create = registry.get("schedule.create").unwrap();
    let err = create.call(serde_json::json!({ "name": "nightly", "cron": "0 9 * * *" }), &ToolContext::default()).await;
    assert!(err.is_err());
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn trigger_invokes_the_spawner_and_returns_a_session_id(pool: sqlx::PgPool) {
    let ctx = context_for(Db::from_pool_for_test(pool));
    let mut registry = ToolRegistry::new();
    ctx.register(&mut registry).unwrap();

    let trigger = registry.get("trigger").unwrap();
    let result = trigger.call(serde_json::json!({ "prompt": "hello" }), &ToolContext::default()).await.unwrap();
    assert_eq!(result["result"], "fake-result");
    assert!(result["session_id"].is_string());
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn route_execute_writes_an_accepted_inbox_row_without_spawning(pool: sqlx::PgPool) {
    let db = Db::from_pool_for_test(pool);
    let ctx = context_for(db.clone());
    let mut registry = ToolRegistry::new();
    ctx.register(&mut registry).unwrap();

    let route_execute = registry.get("route.execute").unwrap();
    let result = route_execute
        .call(serde_json::json!({ "prompt": "book a table for two" }), &ToolContext::default())
        .await
        .unwrap();
    assert_eq!(result["lifecycle_state"], "accepted");

    let request_id = butler_core::RequestId::parse_str(result["request_id"].as_str().unwrap()).unwrap();
    let row = MessageInboxStore::new(db).get(request_id).await.unwrap().unwrap();
    assert_eq!(row.lifecycle_state, butler_core::LifecycleState::Accepted);
    assert_eq!(row.prompt, "book a table for two");
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn notify_without_a_messenger_module_fails_clearly(pool: sqlx::PgPool) {
    let ctx = context_for(Db::from_pool_for_test(pool));
    let mut registry = ToolRegistry::new();
    ctx.register(&mut registry).unwrap();

    let notify = registry.get("notify").unwrap();
    let err = notify.call(serde_json::json!({ "message": "hi" }), &ToolContext::default()).await;
    assert!(err.is_err());
}

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn module_set_enabled_is_refused_at_the_core_layer(pool: sqlx::PgPool) {
    let ctx = context_for(Db::from_pool_for_test(pool));
    let mut registry = ToolRegistry::new();
    ctx.register(&mut registry).unwrap();

    let handler = registry.get("module.set-enabled").unwrap();
    let err = handler.call(serde_json::json!({}), &ToolContext::default()).await;
    assert!(err.is_err());
}
