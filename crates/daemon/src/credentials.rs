// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The credential store (startup step 9): resolves every name a module or
//! the butler's own `required_env`/`optional_env` declares from the
//! daemon process's environment. There is no secret-manager backend yet —
//! this is the seam `butler_spawner::CredentialResolver` expects, filled
//! in from `std::env::var` today and swappable later without touching the
//! spawner.

use std::collections::BTreeMap;

use butler_spawner::CredentialResolver;

/// A flat name -> value map snapshotted from the process environment at
/// startup for every name any loaded module or the butler config declared.
pub struct CredentialStore {
    values: BTreeMap<String, String>,
}

impl CredentialStore {
    /// Resolves `names` from the environment, keeping only what's present.
    /// Missing names are simply absent from the store — callers decide
    /// whether that's fatal for their own declared name.
    pub fn from_env(names: impl IntoIterator<Item = String>) -> Self {
        let mut values = BTreeMap::new();
        for name in names {
            if let Ok(value) = std::env::var(&name) {
                values.insert(name, value);
            }
        }
        Self { values }
    }

    pub fn missing<'a>(&self, names: &'a [String]) -> Vec<&'a str> {
        names.iter().map(String::as_str).filter(|n| !self.values.contains_key(*n)).collect()
    }
}

impl CredentialResolver for CredentialStore {
    fn resolve(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
