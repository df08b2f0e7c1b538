// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `${NAME}` environment-variable interpolation, scanned recursively through
//! nested TOML mappings and sequences.
//!
//! Unlike a runbook template (which falls back to a default for an unset
//! variable), config resolution is fail-closed: every unresolved reference
//! anywhere in the document is collected and reported together as a single
//! startup error, never a per-field one.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("constant regex pattern is valid"));

/// Resolve every `${NAME}` occurrence inside a parsed [`toml::Value`]
/// against `lookup`. Returns the resolved document, or the sorted set of
/// every distinct name that failed to resolve anywhere in the tree.
pub fn resolve_env_refs(
    value: &toml::Value,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<toml::Value, BTreeSet<String>> {
    let mut missing = BTreeSet::new();
    let resolved = resolve_value(value, &lookup, &mut missing);
    if missing.is_empty() {
        Ok(resolved)
    } else {
        Err(missing)
    }
}

fn resolve_value(
    value: &toml::Value,
    lookup: &impl Fn(&str) -> Option<String>,
    missing: &mut BTreeSet<String>,
) -> toml::Value {
    match value {
        toml::Value::String(s) => toml::Value::String(resolve_string(s, lookup, missing)),
        toml::Value::Array(items) => {
            toml::Value::Array(items.iter().map(|v| resolve_value(v, lookup, missing)).collect())
        }
        toml::Value::Table(map) => toml::Value::Table(
            map.iter().map(|(k, v)| (k.clone(), resolve_value(v, lookup, missing))).collect(),
        ),
        other => other.clone(),
    }
}

fn resolve_string(s: &str, lookup: &impl Fn(&str) -> Option<String>, missing: &mut BTreeSet<String>) -> String {
    VAR_PATTERN
        .replace_all(s, |caps: &regex::Captures| {
            let name = &caps[1];
            match lookup(name) {
                Some(val) => val,
                None => {
                    missing.insert(name.to_string());
                    caps[0].to_string()
                }
            }
        })
        .to_string()
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
