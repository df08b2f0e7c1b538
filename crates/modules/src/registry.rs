// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module discovery, dependency resolution, and per-module lifecycle
//! isolation (§4.4).

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use butler_core::{ChannelEgressOwnershipError, ModuleStatus};
use butler_storage::Db;

use crate::module::{CredentialView, Module};

#[derive(Debug, thiserror::Error)]
pub enum ModuleRegistryError {
    #[error("duplicate module name {0:?}")]
    DuplicateName(String),

    #[error("module {module:?} declares a dependency on unknown module {dependency:?}")]
    UnknownDependency { module: String, dependency: String },

    #[error("dependency cycle detected, witness: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error(transparent)]
    ChannelEgressOwnership(#[from] ChannelEgressOwnershipError),
}

/// Discovers, topologically sorts, and drives the lifecycle of a fixed set
/// of modules. Discovery itself (walking a known namespace) is the
/// embedding binary's job — modules are registered here once found.
pub struct ModuleRegistry {
    modules: BTreeMap<String, Arc<dyn Module>>,
    load_order: Vec<String>,
    statuses: BTreeMap<String, ModuleStatus>,
}

impl ModuleRegistry {
    /// Registers `modules`, computes the deterministic topological load
    /// order, and validates channel-egress ownership. Does not run any
    /// lifecycle hooks yet — call [`Self::start_all`] for that.
    pub fn build(modules: Vec<Arc<dyn Module>>, butler_is_messenger: bool) -> Result<Self, ModuleRegistryError> {
        let mut by_name = BTreeMap::new();
        for module in modules {
            let name = module.name().to_string();
            if by_name.insert(name.clone(), module).is_some() {
                return Err(ModuleRegistryError::DuplicateName(name));
            }
        }

        if !butler_is_messenger {
            for module in by_name.values() {
                for tool_name in module.tool_names() {
                    if butler_core::module::is_channel_egress_tool_name(&tool_name) {
                        return Err(ChannelEgressOwnershipError { module: module.name().to_string(), tool_name }.into());
                    }
                }
            }
        }

        let load_order = topological_sort(&by_name)?;

        Ok(Self { modules: by_name, load_order, statuses: BTreeMap::new() })
    }

    pub fn load_order(&self) -> &[String] {
        &self.load_order
    }

    pub fn status(&self, name: &str) -> Option<ModuleStatus> {
        self.statuses.get(name).copied()
    }

    /// Runs `on_startup` in topological order. A module whose own startup
    /// fails is marked `Failed`; modules that (transitively) depend on a
    /// failed module are marked `CascadeFailed` and never invoked;
    /// unrelated modules continue independently.
    pub async fn start_all(
        &mut self,
        db: &Db,
        credentials_for: impl Fn(&str) -> std::collections::BTreeMap<String, String>,
    ) {
        let mut failed: BTreeSet<String> = BTreeSet::new();

        for name in self.load_order.clone() {
            let module = self.modules.get(&name).expect("load_order only lists registered modules");
            let deps = module.dependencies();
            if deps.iter().any(|d| failed.contains(d)) {
                failed.insert(name.clone());
                self.statuses.insert(name, ModuleStatus::CascadeFailed);
                continue;
            }

            let values = credentials_for(&name);
            let view = CredentialView::new(&values);
            match module.on_startup(db, &view).await {
                Ok(()) => {
                    self.statuses.insert(name, ModuleStatus::Started);
                }
                Err(_err) => {
                    failed.insert(name.clone());
                    self.statuses.insert(name, ModuleStatus::Failed);
                }
            }
        }
    }

    /// Runs `on_shutdown` in reverse topological order, for every module
    /// that was successfully started.
    pub async fn shutdown_all(&self) {
        for name in self.load_order.iter().rev() {
            if self.statuses.get(name) == Some(&ModuleStatus::Started) {
                if let Some(module) = self.modules.get(name) {
                    module.on_shutdown().await;
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.get(name)
    }
}

/// Kahn's algorithm with lexicographic tie-breaking at each stratum, so
/// load order is deterministic across restarts given the same module set.
fn topological_sort(modules: &BTreeMap<String, Arc<dyn Module>>) -> Result<Vec<String>, ModuleRegistryError> {
    let mut in_degree: BTreeMap<String, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (name, module) in modules {
        in_degree.entry(name.clone()).or_insert(0);
        for dep in module.dependencies() {
            if !modules.contains_key(&dep) {
                return Err(ModuleRegistryError::UnknownDependency { module: name.clone(), dependency: dep });
            }
            *in_degree.entry(name.clone()).or_insert(0) += 1;
            dependents.entry(dep).or_default().insert(name.clone());
        }
    }

    let mut ready: VecDeque<String> =
        in_degree.iter().filter(|(_, &deg)| deg == 0).map(|(name, _)| name.clone()).collect::<Vec<_>>().into();
    let mut ready_sorted: Vec<String> = ready.drain(..).collect();
    ready_sorted.sort();
    let mut queue: VecDeque<String> = ready_sorted.into();

    let mut order = Vec::with_capacity(modules.len());
    while let Some(name) = queue.pop_front() {
        order.push(name.clone());
        let mut newly_ready = Vec::new();
        if let Some(children) = dependents.get(&name) {
            for child in children {
                let deg = in_degree.get_mut(child).expect("child must have an in-degree entry");
                *deg -= 1;
                if *deg == 0 {
                    newly_ready.push(child.clone());
                }
            }
        }
        newly_ready.sort();
        for child in newly_ready {
            queue.push_back(child);
        }
    }

    if order.len() != modules.len() {
        let witness = find_cycle_witness(modules);
        return Err(ModuleRegistryError::Cycle(witness));
    }

    Ok(order)
}

/// DFS from the lexicographically-first unvisited node, tracking the path,
/// to produce a human-readable witness cycle once Kahn's algorithm has
/// already determined one exists.
fn find_cycle_witness(modules: &BTreeMap<String, Arc<dyn Module>>) -> Vec<String> {
    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut stack: Vec<String> = Vec::new();

    fn visit(
        name: &str,
        modules: &BTreeMap<String, Arc<dyn Module>>,
        visited: &mut BTreeSet<String>,
        stack: &mut Vec<String>,
    ) -> Option<Vec<String>> {
        if let Some(pos) = stack.iter().position(|n| n == name) {
            let mut cycle = stack[pos..].to_vec();
            cycle.push(name.to_string());
            return Some(cycle);
        }
        if visited.contains(name) {
            return None;
        }
        visited.insert(name.to_string());
        stack.push(name.to_string());
        if let Some(module) = modules.get(name) {
            for dep in module.dependencies() {
                if let Some(cycle) = visit(&dep, modules, visited, stack) {
                    return Some(cycle);
                }
            }
        }
        stack.pop();
        None
    }

    for name in modules.keys() {
        if let Some(cycle) = visit(name, modules, &mut visited, &mut stack) {
            return cycle;
        }
    }
    vec!["<unknown>".to_string()]
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
