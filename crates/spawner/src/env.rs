// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment isolation for spawned runtime subprocesses (§4.6). The
//! child receives exactly `PATH`, the core API key variables, the
//! butler's declared env vars, and its loaded modules' declared
//! credentials — nothing else leaks through from the daemon process.

use std::collections::BTreeMap;

/// Fixed set of API key variables every adapter may need regardless of
/// which modules a butler has loaded.
pub const CORE_API_KEY_VARS: &[&str] = &["ANTHROPIC_API_KEY", "OPENAI_API_KEY"];

/// Resolves a named credential, typically backed by the daemon's
/// credential store. Kept as a trait so the spawner crate never depends
/// on `butler-daemon`.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<String>;
}

/// A resolver with nothing registered; every lookup falls through to the
/// caller's own process environment. Used in tests and by butlers with no
/// modules declaring credentials.
pub struct EmptyCredentialResolver;

impl CredentialResolver for EmptyCredentialResolver {
    fn resolve(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Builds the explicit environment map passed to a runtime subprocess.
#[derive(Debug, Clone, Default)]
pub struct EnvBuilder {
    required_env: Vec<String>,
    optional_env: Vec<String>,
    module_credential_names: Vec<String>,
}

impl EnvBuilder {
    pub fn new(required_env: Vec<String>, optional_env: Vec<String>, module_credential_names: Vec<String>) -> Self {
        Self { required_env, optional_env, module_credential_names }
    }

    /// Resolves each declared name via `resolver` first, then the
    /// daemon process's own environment. Missing optional vars and
    /// missing credentials are silently omitted; `PATH` is always taken
    /// from the daemon process since it has no credential-store
    /// equivalent.
    pub fn build(&self, resolver: &dyn CredentialResolver) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();

        if let Ok(path) = std::env::var("PATH") {
            env.insert("PATH".to_string(), path);
        }

        let declared = CORE_API_KEY_VARS
            .iter()
            .map(|s| s.to_string())
            .chain(self.required_env.iter().cloned())
            .chain(self.optional_env.iter().cloned())
            .chain(self.module_credential_names.iter().cloned());

        for name in declared {
            if env.contains_key(&name) {
                continue;
            }
            let value = resolver.resolve(&name).or_else(|| std::env::var(&name).ok());
            if let Some(value) = value {
                env.insert(name, value);
            }
        }

        env
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
