// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeSet;

/// Always fatal at startup, per the spec's `ConfigError` kind.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read { path: String, #[source] source: std::io::Error },

    #[error("failed to parse config file {path:?} as TOML: {source}")]
    Parse { path: String, #[source] source: toml::de::Error },

    #[error("unresolved environment variable reference(s): {}", join(.0))]
    UnresolvedEnvVars(BTreeSet<String>),

    #[error("missing required field {0:?}")]
    MissingField(&'static str),

    #[error("unknown runtime adapter {0:?}; must be one of claude_cli, codex_cli, sdk")]
    UnknownRuntimeAdapter(String),

    #[error("interval {field} must be > 0, got {value}")]
    InvalidInterval { field: &'static str, value: i64 },

    #[error("database url is configured but schema is not set; shared databases require an explicit schema for per-butler isolation")]
    MissingDatabaseSchema,

    #[error("{0}")]
    Shape(String),
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(", ")
}
