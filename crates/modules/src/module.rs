// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The [`Module`] trait: the capability set a domain module implements —
//! name, config schema, dependencies, tool registration, migrations, and
//! lifecycle hooks.

use std::collections::BTreeSet;

use async_trait::async_trait;
use butler_storage::Db;

/// The per-tool sensitive-argument declaration used by the (out-of-scope)
/// approvals layer — carried here so a module can declare it without that
/// layer needing to exist in this crate.
#[derive(Debug, Clone, Default)]
pub struct ToolMetadata {
    pub sensitive_args: BTreeSet<String>,
}

/// Resolved per-module credentials, borrowed for the duration of
/// `on_startup`/`on_shutdown` and tool calls — never stored as an owning
/// reference inside a module.
pub struct CredentialView<'a> {
    values: &'a std::collections::BTreeMap<String, String>,
}

impl<'a> CredentialView<'a> {
    pub fn new(values: &'a std::collections::BTreeMap<String, String>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModuleConfigError {
    #[error("module {module:?}: {reason}")]
    Invalid { module: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ModuleToolError {
    #[error("tool {tool:?} not found on module {module:?}")]
    UnknownTool { module: String, tool: String },
    #[error("tool {tool:?} failed: {reason}")]
    Failed { tool: String, reason: String },
}

/// A domain module, discovered at startup and driven through the lifecycle
/// described in §4.4. Implementations never outlive the daemon; they only
/// borrow the DB pool and credential view passed to their hooks.
#[async_trait]
pub trait Module: Send + Sync {
    fn name(&self) -> &str;

    /// Other module names this one depends on; participates in the
    /// topological load order.
    fn dependencies(&self) -> BTreeSet<String>;

    /// Validates this module's slice of the `[modules.<name>]` config
    /// table. Runs before credentials/migrations/`on_startup`.
    fn validate_config(&self, raw: &serde_json::Value) -> Result<(), ModuleConfigError>;

    /// Declared credential names this module needs resolved before
    /// `on_startup` runs. Resolution failure isolates this module only.
    fn required_credentials(&self) -> Vec<String> {
        Vec::new()
    }

    /// Tool-name -> sensitive-argument metadata for tools this module
    /// registers, checked for channel-egress ownership violations and
    /// handed to the (out-of-scope) approvals layer.
    fn tool_metadata(&self) -> std::collections::BTreeMap<String, ToolMetadata> {
        Default::default()
    }

    /// Names this module's tools expose, used for the collision check in
    /// the tool endpoint and the channel-egress ownership check.
    fn tool_names(&self) -> Vec<String> {
        self.tool_metadata().into_keys().collect()
    }

    /// An optional migration branch label; modules sharing a label run
    /// their schema migrations together.
    fn migration_branch(&self) -> Option<&str> {
        None
    }

    async fn on_startup(&self, db: &Db, credentials: &CredentialView<'_>) -> Result<(), ModuleConfigError>;

    async fn on_shutdown(&self);

    /// Dispatches one of this module's own tools (namespaced
    /// `<module>.<tool>` by the tool endpoint before the call reaches
    /// here — `tool_name` is the bare, unprefixed name). The default
    /// rejects every call; a module with no tools never needs to
    /// override it.
    async fn call_tool(&self, tool_name: &str, _args: serde_json::Value) -> Result<serde_json::Value, ModuleToolError> {
        Err(ModuleToolError::UnknownTool { module: self.name().to_string(), tool: tool_name.to_string() })
    }
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;
