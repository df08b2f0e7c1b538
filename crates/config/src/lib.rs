// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config loading: parse a butler's TOML document, resolve `${VAR}`
//! environment references, and validate it into a [`butler_core::ButlerConfig`].

pub mod error;
pub mod loader;
pub mod raw;
pub mod template;

pub use error::ConfigError;
pub use loader::{load, load_str};
