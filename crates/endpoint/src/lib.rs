// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool endpoint (§4.7): the fixed core tool set plus per-module tools,
//! served over an `rmcp` streamable-HTTP transport mounted on `axum`.
//! Accept-phase routing (§4.8) lands here too — `route.execute` is a core
//! tool like any other, backed directly by `butler-storage`'s message
//! inbox; the process-phase worker that drains it lives in `butler-router`.

pub mod channel;
pub mod core_tools;
pub mod error;
pub mod http;
pub mod registry;
pub mod server;
pub mod tool;

pub use core_tools::CoreToolsContext;
pub use error::EndpointError;
pub use http::tool_endpoint_router;
pub use registry::ToolRegistry;
pub use server::ButlerToolServer;
pub use tool::{FnTool, ToolContext, ToolHandler};
