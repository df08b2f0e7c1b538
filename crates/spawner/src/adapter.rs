// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`RuntimeAdapter`]: the narrow interface the spawner drives an LLM CLI
//! or SDK through, plus the three concrete adapters and their factory
//! (§4.6, §9 "Dynamic-dispatch adapters").

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use butler_core::{RuntimeAdapterKind, SessionId, ToolCallRecord};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// A single-entry map from a butler's own name to the URL of its own tool
/// endpoint, with `session_id` threaded through as a query parameter so
/// tool calls made during the session correlate back to it.
#[derive(Debug, Clone)]
pub struct McpConfig {
    pub butler_name: String,
    pub endpoint_url: String,
}

impl McpConfig {
    pub fn new(butler_name: impl Into<String>, tool_endpoint_base_url: &str, session_id: SessionId) -> Self {
        let sep = if tool_endpoint_base_url.contains('?') { '&' } else { '?' };
        Self {
            butler_name: butler_name.into(),
            endpoint_url: format!("{tool_endpoint_base_url}{sep}session_id={session_id}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub prompt: String,
    pub system_prompt: String,
    pub env: BTreeMap<String, String>,
    pub mcp_config: McpConfig,
}

#[derive(Debug, Clone, Default)]
pub struct InvocationOutcome {
    pub result: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub model: Option<String>,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub cost: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("runtime binary {binary} not found on PATH")]
    BinaryNotFound { binary: &'static str },
    #[error("failed to build adapter config file: {0}")]
    ConfigFile(String),
    #[error("subprocess {binary} exited with status {status}: {stderr}")]
    NonZeroExit { binary: &'static str, status: i32, stderr: String },
    #[error("failed to spawn subprocess: {0}")]
    Spawn(String),
    #[error("malformed output from runtime: {0}")]
    MalformedOutput(String),
}

/// The capability-narrow seam the spawner drives every runtime through.
/// Three concrete shapes exist today (two subprocess CLIs, one in-process
/// SDK call); all share this interface so the spawner never branches on
/// adapter identity.
#[async_trait]
pub trait RuntimeAdapter: Send + Sync {
    fn binary_name(&self) -> &'static str;

    /// Writes the adapter-specific MCP/tool config file the CLI reads on
    /// startup, returning its path.
    async fn build_config_file(&self, mcp_config: &McpConfig) -> Result<PathBuf, AdapterError>;

    /// Reads back a previously-written system prompt file, used by
    /// callers that persist the composed system prompt alongside the
    /// config file rather than passing it inline.
    async fn parse_system_prompt_file(&self, path: &Path) -> Result<String, AdapterError>;

    async fn invoke(&self, request: InvocationRequest) -> Result<InvocationOutcome, AdapterError>;

    /// Releases any per-invocation resources (temp config files, open
    /// handles). Called unconditionally after every invocation, and
    /// synchronously at drain timeout for a cancelled session.
    async fn reset(&self);
}

/// Selects the concrete adapter for a validated [`RuntimeAdapterKind`].
/// Unknown names are rejected earlier, at config load — this factory is
/// total over [`RuntimeAdapterKind::ALL`].
pub fn build_adapter(kind: RuntimeAdapterKind) -> Arc<dyn RuntimeAdapter> {
    match kind {
        RuntimeAdapterKind::ClaudeCli => Arc::new(cli::ClaudeCliAdapter::default()),
        RuntimeAdapterKind::CodexCli => Arc::new(cli::CodexCliAdapter::default()),
        RuntimeAdapterKind::Sdk => Arc::new(sdk::SdkAdapter::default()),
    }
}

/// Shared subprocess plumbing for the two CLI-backed adapters: build a
/// piped `Command`, write the prompt to stdin, wait for exit, parse the
/// trailing JSON line of stdout as the invocation outcome.
mod cli {
    use super::*;

    #[derive(Default)]
    pub struct ClaudeCliAdapter {
        config_path: parking_lot::Mutex<Option<PathBuf>>,
    }

    #[async_trait]
    impl RuntimeAdapter for ClaudeCliAdapter {
        fn binary_name(&self) -> &'static str {
            "claude"
        }

        async fn build_config_file(&self, mcp_config: &McpConfig) -> Result<PathBuf, AdapterError> {
            let path = write_mcp_config_file(self.binary_name(), mcp_config).await?;
            *self.config_path.lock() = Some(path.clone());
            Ok(path)
        }

        async fn parse_system_prompt_file(&self, path: &Path) -> Result<String, AdapterError> {
            read_system_prompt_file(path).await
        }

        async fn invoke(&self, request: InvocationRequest) -> Result<InvocationOutcome, AdapterError> {
            let config_path = self.build_config_file(&request.mcp_config).await?;
            run_subprocess_adapter(self.binary_name(), &["--mcp-config"], &config_path, request).await
        }

        async fn reset(&self) {
            reset_config_file(&self.config_path).await;
        }
    }

    #[derive(Default)]
    pub struct CodexCliAdapter {
        config_path: parking_lot::Mutex<Option<PathBuf>>,
    }

    #[async_trait]
    impl RuntimeAdapter for CodexCliAdapter {
        fn binary_name(&self) -> &'static str {
            "codex"
        }

        async fn build_config_file(&self, mcp_config: &McpConfig) -> Result<PathBuf, AdapterError> {
            let path = write_mcp_config_file(self.binary_name(), mcp_config).await?;
            *self.config_path.lock() = Some(path.clone());
            Ok(path)
        }

        async fn parse_system_prompt_file(&self, path: &Path) -> Result<String, AdapterError> {
            read_system_prompt_file(path).await
        }

        async fn invoke(&self, request: InvocationRequest) -> Result<InvocationOutcome, AdapterError> {
            let config_path = self.build_config_file(&request.mcp_config).await?;
            run_subprocess_adapter(self.binary_name(), &["--config"], &config_path, request).await
        }

        async fn reset(&self) {
            reset_config_file(&self.config_path).await;
        }
    }

    async fn write_mcp_config_file(binary: &'static str, mcp_config: &McpConfig) -> Result<PathBuf, AdapterError> {
        let dir = std::env::temp_dir().join("butlerd").join(binary);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AdapterError::ConfigFile(e.to_string()))?;
        let path = dir.join(format!("mcp-{}.json", uuid::Uuid::new_v4()));
        let body = serde_json::json!({
            "mcpServers": {
                mcp_config.butler_name.clone(): {
                    "url": mcp_config.endpoint_url.clone(),
                }
            }
        });
        let mut file = tokio::fs::File::create(&path).await.map_err(|e| AdapterError::ConfigFile(e.to_string()))?;
        file.write_all(serde_json::to_string_pretty(&body).unwrap_or_default().as_bytes())
            .await
            .map_err(|e| AdapterError::ConfigFile(e.to_string()))?;
        Ok(path)
    }

    async fn read_system_prompt_file(path: &Path) -> Result<String, AdapterError> {
        tokio::fs::read_to_string(path).await.map_err(|e| AdapterError::ConfigFile(e.to_string()))
    }

    async fn reset_config_file(config_path: &parking_lot::Mutex<Option<PathBuf>>) {
        let path = config_path.lock().take();
        if let Some(path) = path {
            let _ = tokio::fs::remove_file(&path).await;
        }
    }

    async fn run_subprocess_adapter(
        binary: &'static str,
        config_flag: &[&str],
        config_path: &Path,
        request: InvocationRequest,
    ) -> Result<InvocationOutcome, AdapterError> {
        let mut cmd = Command::new(binary);
        cmd.args(config_flag)
            .arg(config_path)
            .arg("--append-system-prompt")
            .arg(&request.system_prompt)
            .arg("--output-format")
            .arg("json")
            .env_clear()
            .envs(&request.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AdapterError::BinaryNotFound { binary }
            } else {
                AdapterError::Spawn(e.to_string())
            }
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(request.prompt.as_bytes()).await;
        }

        let output = child.wait_with_output().await.map_err(|e| AdapterError::Spawn(e.to_string()))?;
        if !output.status.success() {
            return Err(AdapterError::NonZeroExit {
                binary,
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        parse_cli_output(&output.stdout)
    }

    fn parse_cli_output(stdout: &[u8]) -> Result<InvocationOutcome, AdapterError> {
        let text = String::from_utf8_lossy(stdout);
        let last_line = text.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or_default();
        let json: serde_json::Value =
            serde_json::from_str(last_line).map_err(|e| AdapterError::MalformedOutput(e.to_string()))?;

        let result = json
            .get("result")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AdapterError::MalformedOutput("missing result field".to_string()))?
            .to_string();

        Ok(InvocationOutcome {
            result,
            tool_calls: Vec::new(),
            model: json.get("model").and_then(|v| v.as_str()).map(str::to_string),
            input_tokens: json.get("usage").and_then(|u| u.get("input_tokens")).and_then(|v| v.as_u64()),
            output_tokens: json.get("usage").and_then(|u| u.get("output_tokens")).and_then(|v| v.as_u64()),
            cost: json.get("total_cost_usd").and_then(|v| v.as_f64()),
        })
    }
}

/// SDK-backed adapter for runtimes reached over an HTTP model API rather
/// than a CLI binary — no subprocess, no config file on disk.
mod sdk {
    use super::*;

    #[derive(Default)]
    pub struct SdkAdapter {
        client: reqwest::Client,
    }

    #[async_trait]
    impl RuntimeAdapter for SdkAdapter {
        fn binary_name(&self) -> &'static str {
            "sdk"
        }

        async fn build_config_file(&self, _mcp_config: &McpConfig) -> Result<PathBuf, AdapterError> {
            Ok(PathBuf::new())
        }

        async fn parse_system_prompt_file(&self, path: &Path) -> Result<String, AdapterError> {
            if path.as_os_str().is_empty() {
                return Ok(String::new());
            }
            tokio::fs::read_to_string(path).await.map_err(|e| AdapterError::ConfigFile(e.to_string()))
        }

        async fn invoke(&self, request: InvocationRequest) -> Result<InvocationOutcome, AdapterError> {
            let endpoint = request
                .env
                .get("SDK_MODEL_ENDPOINT")
                .cloned()
                .unwrap_or_else(|| "https://api.anthropic.com/v1/messages".to_string());
            let api_key = request.env.get("ANTHROPIC_API_KEY").cloned().unwrap_or_default();

            let body = serde_json::json!({
                "system": request.system_prompt,
                "messages": [{ "role": "user", "content": request.prompt }],
                "mcp_servers": { request.mcp_config.butler_name.clone(): request.mcp_config.endpoint_url.clone() },
            });

            let response = self
                .client
                .post(&endpoint)
                .header("x-api-key", api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| AdapterError::Spawn(e.to_string()))?;

            if !response.status().is_success() {
                let status = response.status().as_u16() as i32;
                let stderr = response.text().await.unwrap_or_default();
                return Err(AdapterError::NonZeroExit { binary: "sdk", status, stderr });
            }

            let json: serde_json::Value = response.json().await.map_err(|e| AdapterError::MalformedOutput(e.to_string()))?;
            let result = json
                .get("content")
                .and_then(|c| c.as_array())
                .and_then(|a| a.first())
                .and_then(|b| b.get("text"))
                .and_then(|t| t.as_str())
                .ok_or_else(|| AdapterError::MalformedOutput("missing content[0].text".to_string()))?
                .to_string();

            Ok(InvocationOutcome {
                result,
                tool_calls: Vec::new(),
                model: json.get("model").and_then(|v| v.as_str()).map(str::to_string),
                input_tokens: json.get("usage").and_then(|u| u.get("input_tokens")).and_then(|v| v.as_u64()),
                output_tokens: json.get("usage").and_then(|u| u.get("output_tokens")).and_then(|v| v.as_u64()),
                cost: None,
            })
        }

        async fn reset(&self) {}
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
