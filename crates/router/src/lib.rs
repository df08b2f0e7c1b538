// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Switchboard-only routing layer (§4.8, §4.9): the accept-phase
//! [`RouteClient`], the target-local process-phase [`ProcessWorker`], the
//! liveness [`HeartbeatReporter`]/`/api/heartbeat` handler, and the
//! [`EligibilitySweeper`] job. `butler-endpoint` hosts the `route.execute`
//! tool that accepts; everything here drains and keeps the registry honest.

pub mod eligibility;
pub mod error;
pub mod liveness;
pub mod mcp_client;
pub mod process;
pub mod route_client;

pub use eligibility::{EligibilitySweeper, SweepOutcome, ELIGIBILITY_SWEEP_JOB_NAME};
pub use error::RouterError;
pub use liveness::{heartbeat_router, HeartbeatReporter};
pub use process::ProcessWorker;
pub use route_client::RouteClient;
