// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`ToolRegistry`]: the fixed core tool set plus module tools under
//! namespaced names, with startup-fatal collision detection (§4.7).

use std::collections::BTreeMap;
use std::sync::Arc;

use butler_modules::ModuleRegistry;

use crate::error::EndpointError;
use crate::tool::ToolHandler;

struct Entry {
    owner: String,
    handler: Arc<dyn ToolHandler>,
}

pub struct ToolRegistry {
    tools: BTreeMap<String, Entry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: BTreeMap::new() }
    }

    /// Registers one tool under `owner`. A name already owned by a
    /// different owner is a fatal [`EndpointError::ToolCollision`]; the
    /// same owner re-registering its own name is also rejected since it
    /// indicates a bug in that owner's tool list.
    pub fn register(&mut self, name: impl Into<String>, owner: impl Into<String>, handler: Arc<dyn ToolHandler>) -> Result<(), EndpointError> {
        let name = name.into();
        let owner = owner.into();
        if let Some(existing) = self.tools.get(&name) {
            return Err(EndpointError::ToolCollision {
                name,
                first_owner: existing.owner.clone(),
                second_owner: owner,
            });
        }
        self.tools.insert(name, Entry { owner, handler });
        Ok(())
    }

    /// Registers every tool every loaded module declares, namespaced
    /// `<module>.<tool>` and dispatched back through [`ModuleRegistry`].
    pub fn register_module_tools(&mut self, modules: &Arc<ModuleRegistry>) -> Result<(), EndpointError> {
        for module_name in modules.load_order() {
            let Some(module) = modules.get(module_name) else { continue };
            for tool_name in module.tool_names() {
                let namespaced = format!("{module_name}.{tool_name}");
                let handler = Arc::new(ModuleToolHandler {
                    modules: modules.clone(),
                    module_name: module_name.to_string(),
                    tool_name: tool_name.clone(),
                });
                self.register(namespaced, module_name.to_string(), handler)?;
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.tools.get(name).map(|e| &e.handler)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn descriptions(&self) -> Vec<(String, String)> {
        self.tools.iter().map(|(name, e)| (name.clone(), e.handler.description().to_string())).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

struct ModuleToolHandler {
    modules: Arc<ModuleRegistry>,
    module_name: String,
    tool_name: String,
}

#[async_trait::async_trait]
impl ToolHandler for ModuleToolHandler {
    fn description(&self) -> &str {
        "module tool"
    }

    async fn call(&self, args: serde_json::Value, _ctx: &crate::tool::ToolContext) -> Result<serde_json::Value, EndpointError> {
        let module = self
            .modules
            .get(&self.module_name)
            .ok_or_else(|| EndpointError::UnknownTool(format!("{}.{}", self.module_name, self.tool_name)))?;
        module
            .call_tool(&self.tool_name, args)
            .await
            .map_err(|e| EndpointError::InvalidArguments { tool: self.tool_name.clone(), reason: e.to_string() })
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
