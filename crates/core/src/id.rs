// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ID generation abstractions
//!
//! IDs are thin newtype wrappers around [`uuid::Uuid`]. Each wrapper carries
//! a human-readable prefix used only in `Display`/logging output; the
//! underlying storage and comparison value is always the raw UUID, which is
//! also what gets written to and read from Postgres `uuid` columns.

use uuid::Uuid;

/// Define a newtype ID wrapper around [`Uuid`] with a display prefix.
///
/// Generates `new()` for random ID generation (UUIDv4 by default, or UUIDv7
/// when `v7` is specified), `from_uuid()`, `parse_str()`, `as_uuid()`,
/// `Display`, `From<Uuid>`, `sqlx::Type`/`Encode`/`Decode` passthrough to
/// `Uuid`, and `Serialize`/`Deserialize` (transparent, as the bare UUID —
/// the prefix is a presentation detail, not part of the wire format).
///
/// ```ignore
/// define_id! {
///     /// Identifies a scheduled task.
///     pub struct ScheduledTaskId("task", v4);
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal, v4);
    ) => {
        $crate::define_id!(@inner $(#[$meta])* $name, $prefix, new_v4);
    };
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal, v7);
    ) => {
        $crate::define_id!(@inner $(#[$meta])* $name, $prefix, now_v7);
    };
    (@inner $(#[$meta:meta])* $name:ident, $prefix:literal, $gen:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[derive(serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub ::uuid::Uuid);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new random ID.
            pub fn new() -> Self {
                Self(::uuid::Uuid::$gen())
            }

            /// Wrap an existing UUID (e.g. one read back from storage).
            pub fn from_uuid(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Parse an ID from its string form. Accepts a bare UUID or a
            /// `{prefix}_{uuid}` display string.
            pub fn parse_str(s: &str) -> Result<Self, uuid::Error> {
                let raw = s.strip_prefix(Self::PREFIX).and_then(|rest| rest.strip_prefix('_')).unwrap_or(s);
                Ok(Self(::uuid::Uuid::parse_str(raw)?))
            }

            pub fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}_{}", Self::PREFIX, self.0)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Returns a string slice truncated to at most `n` characters.
pub fn short(s: &str, n: usize) -> &str {
    let end = s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len());
    &s[..end]
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
