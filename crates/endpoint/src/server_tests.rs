use std::sync::Arc;

use async_trait::async_trait;

use super::*;
use crate::tool::ToolContext;

struct EchoTool;

#[async_trait]
impl ToolHandler for EchoTool {
    fn description(&self) -> &str {
        "echoes its arguments back"
    }

    async fn call(&self, args: serde_json::Value, _ctx: &ToolContext) -> Result<serde_json::Value, EndpointError> {
        Ok(args)
    }
}

struct FailingTool;

#[async_trait]
impl ToolHandler for FailingTool {
    fn description(&self) -> &str {
        "always fails"
    }

    async fn call(&self, _args: serde_json::Value, _ctx: &ToolContext) -> Result<serde_json::Value, EndpointError> {
        Err(EndpointError::InvalidArguments { tool: "boom".to_string(), reason: "nope".to_string() })
    }
}

fn server_with(tools: Vec<(&str, Arc<dyn ToolHandler>)>) -> ButlerToolServer {
    let mut registry = ToolRegistry::new();
    for (name, handler) in tools {
        registry.register(name, "core", handler).unwrap();
    }
    ButlerToolServer::new("concierge".to_string(), Arc::new(registry))
}

#[test]
fn get_info_names_the_butler_in_its_server_name() {
    let server = server_with(vec![]);
    let info = server.get_info();
    assert_eq!(info.server_info.name, "butler-concierge");
}

#[test]
fn tools_lists_every_registered_tool_with_its_description() {
    let server = server_with(vec![("echo", Arc::new(EchoTool))]);
    let tools = server.tools();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "echo");
    assert_eq!(tools[0].description.as_deref(), Some("echoes its arguments back"));
}

#[tokio::test]
async fn dispatch_returns_unknown_tool_as_an_invalid_params_error() {
    let server = server_with(vec![]);
    let err = server.dispatch("does-not-exist", None, None).await.unwrap_err();
    assert!(err.message.contains("unknown tool"));
}

#[tokio::test]
async fn dispatch_routes_arguments_to_the_registered_handler() {
    let server = server_with(vec![("echo", Arc::new(EchoTool))]);
    let mut args = serde_json::Map::new();
    args.insert("greeting".to_string(), serde_json::json!("hi"));

    let result = server.dispatch("echo", Some(args), None).await.unwrap();
    assert!(!result.is_error.unwrap_or(false));
}

#[tokio::test]
async fn dispatch_turns_a_handler_error_into_a_call_tool_error_result_rather_than_failing_the_call() {
    let server = server_with(vec![("boom", Arc::new(FailingTool))]);
    let result = server.dispatch("boom", None, None).await.unwrap();
    assert_eq!(result.is_error, Some(true));
}
