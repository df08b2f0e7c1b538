// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `trigger_source` validation.
//!
//! A session's `trigger_source` is one of the fixed set `{tick, external,
//! trigger, route}` or the parametric form `schedule:<name>` where `<name>`
//! is any non-empty token. Unknown forms are rejected at create time.

use std::fmt;

/// A validated `trigger_source` value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TriggerSource {
    Tick,
    External,
    Trigger,
    Route,
    Schedule(String),
}

/// Error returned when a raw string does not match the valid `trigger_source` grammar.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("invalid trigger_source: {0:?}")]
pub struct InvalidTriggerSource(pub String);

impl TriggerSource {
    pub fn parse(raw: &str) -> Result<Self, InvalidTriggerSource> {
        match raw {
            "tick" => Ok(Self::Tick),
            "external" => Ok(Self::External),
            "trigger" => Ok(Self::Trigger),
            "route" => Ok(Self::Route),
            _ => match raw.strip_prefix("schedule:") {
                Some(name) if !name.is_empty() => Ok(Self::Schedule(name.to_string())),
                _ => Err(InvalidTriggerSource(raw.to_string())),
            },
        }
    }

    /// True for the variant the spawner's self-deadlock guard watches for.
    pub fn is_trigger(&self) -> bool {
        matches!(self, Self::Trigger)
    }

    pub fn schedule_name(&self) -> Option<&str> {
        match self {
            Self::Schedule(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tick => f.write_str("tick"),
            Self::External => f.write_str("external"),
            Self::Trigger => f.write_str("trigger"),
            Self::Route => f.write_str("route"),
            Self::Schedule(name) => write!(f, "schedule:{name}"),
        }
    }
}

impl serde::Serialize for TriggerSource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for TriggerSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "trigger_source_tests.rs"]
mod tests;
