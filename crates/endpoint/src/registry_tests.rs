use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use butler_modules::{CredentialView, Module, ModuleConfigError, ModuleRegistry, ToolMetadata};
use butler_storage::Db;

use super::*;
use crate::tool::ToolContext;

struct EchoModule {
    name: &'static str,
    tools: Vec<&'static str>,
}

#[async_trait]
impl Module for EchoModule {
    fn name(&self) -> &str {
        self.name
    }

    fn dependencies(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn validate_config(&self, _raw: &serde_json::Value) -> Result<(), ModuleConfigError> {
        Ok(())
    }

    fn tool_metadata(&self) -> std::collections::BTreeMap<String, ToolMetadata> {
        self.tools.iter().map(|t| (t.to_string(), ToolMetadata::default())).collect()
    }

    async fn on_startup(&self, _db: &Db, _credentials: &CredentialView<'_>) -> Result<(), ModuleConfigError> {
        Ok(())
    }

    async fn on_shutdown(&self) {}

    async fn call_tool(&self, tool_name: &str, args: serde_json::Value) -> Result<serde_json::Value, butler_modules::ModuleToolError> {
        if self.tools.contains(&tool_name) {
            Ok(serde_json::json!({ "echo": args }))
        } else {
            Err(butler_modules::ModuleToolError::UnknownTool { module: self.name.to_string(), tool: tool_name.to_string() })
        }
    }
}

struct NoopTool;

#[async_trait]
impl ToolHandler for NoopTool {
    fn description(&self) -> &str {
        "noop"
    }

    async fn call(&self, _args: serde_json::Value, _ctx: &ToolContext) -> Result<serde_json::Value, EndpointError> {
        Ok(serde_json::json!({}))
    }
}

#[test]
fn a_name_owned_by_two_different_owners_is_a_fatal_collision() {
    let mut registry = ToolRegistry::new();
    registry.register("status", "core", Arc::new(NoopTool)).unwrap();
    let err = registry.register("status", "some_module", Arc::new(NoopTool)).unwrap_err();
    assert!(matches!(err, EndpointError::ToolCollision { .. }));
}

#[test]
fn module_tools_are_namespaced_by_module_name() {
    let module: Arc<dyn Module> = Arc::new(EchoModule { name: "github", tools: vec!["create_issue"] });
    let modules = Arc::new(ModuleRegistry::build(vec![module], false).unwrap());

    let mut registry = ToolRegistry::new();
    registry.register_module_tools(&modules).unwrap();

    assert!(registry.get("github.create_issue").is_some());
    assert!(registry.get("create_issue").is_none());
}

#[tokio::test]
async fn a_module_tool_call_is_dispatched_through_the_owning_module() {
    let module: Arc<dyn Module> = Arc::new(EchoModule { name: "github", tools: vec!["create_issue"] });
    let modules = Arc::new(ModuleRegistry::build(vec![module], false).unwrap());

    let mut registry = ToolRegistry::new();
    registry.register_module_tools(&modules).unwrap();

    let handler = registry.get("github.create_issue").unwrap();
    let ctx = ToolContext::default();
    let result = handler.call(serde_json::json!({ "title": "bug" }), &ctx).await.unwrap();
    assert_eq!(result, serde_json::json!({ "echo": { "title": "bug" } }));
}

#[test]
fn two_distinct_modules_with_disjoint_tool_names_register_cleanly() {
    let a: Arc<dyn Module> = Arc::new(EchoModule { name: "github", tools: vec!["create_issue"] });
    let b: Arc<dyn Module> = Arc::new(EchoModule { name: "linear", tools: vec!["create_issue"] });
    let modules = Arc::new(ModuleRegistry::build(vec![a, b], false).unwrap());

    let mut registry = ToolRegistry::new();
    registry.register_module_tools(&modules).unwrap();

    assert!(registry.get("github.create_issue").is_some());
    assert!(registry.get("linear.create_issue").is_some());
}
