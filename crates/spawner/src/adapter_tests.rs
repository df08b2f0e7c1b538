// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use butler_core::{RuntimeAdapterKind, SessionId};

use super::*;

#[test]
fn mcp_config_appends_session_id_as_query_param() {
    let config = McpConfig::new("concierge", "http://localhost:9000/mcp", SessionId::new());
    assert!(config.endpoint_url.starts_with("http://localhost:9000/mcp?session_id=sess_"));
}

#[test]
fn mcp_config_uses_ampersand_when_base_url_already_has_a_query() {
    let config = McpConfig::new("concierge", "http://localhost:9000/mcp?transport=sse", SessionId::new());
    assert!(config.endpoint_url.contains("&session_id="));
}

#[test]
fn factory_selects_the_binary_matching_each_kind() {
    for (kind, expected_binary) in [
        (RuntimeAdapterKind::ClaudeCli, "claude"),
        (RuntimeAdapterKind::CodexCli, "codex"),
        (RuntimeAdapterKind::Sdk, "sdk"),
    ] {
        let adapter = build_adapter(kind);
        assert_eq!(adapter.binary_name(), expected_binary);
    }
}

#[tokio::test]
async fn sdk_adapter_parse_system_prompt_file_tolerates_an_empty_path() {
    let adapter = build_adapter(RuntimeAdapterKind::Sdk);
    let result = adapter.parse_system_prompt_file(std::path::Path::new("")).await.unwrap();
    assert_eq!(result, "");
}

#[tokio::test]
async fn cli_adapter_missing_binary_surfaces_as_binary_not_found() {
    let adapter = build_adapter(RuntimeAdapterKind::ClaudeCli);
    let mcp_config = McpConfig::new("concierge", "http://localhost:9000/mcp", SessionId::new());
    let request = InvocationRequest {
        prompt: "hi".to_string(),
        system_prompt: String::new(),
        env: std::collections::BTreeMap::from([("PATH".to_string(), "/nonexistent".to_string())]),
        mcp_config,
    };
    let err = adapter.invoke(request).await.unwrap_err();
    assert!(matches!(err, AdapterError::BinaryNotFound { binary: "claude" } | AdapterError::Spawn(_)));
}
