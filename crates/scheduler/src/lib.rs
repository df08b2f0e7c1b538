// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron evaluation, deterministic staggering, TOML↔DB reconciliation, the
//! tick handler, and the one-shot reminder primitive (§4.5).

pub mod cron_eval;
pub mod dispatch;
pub mod error;
pub mod reconcile;
pub mod reminder;
pub mod stagger;
pub mod tick;

pub use cron_eval::next_occurrence;
pub use dispatch::{JobDispatcher, PromptDispatcher};
pub use error::SchedulerError;
pub use reconcile::reconcile;
pub use reminder::remind;
pub use stagger::stagger_offset;
pub use tick::{TickHandler, TickOutcome};
