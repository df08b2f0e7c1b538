// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module discovery (startup step 3): walks a known namespace and returns
//! one instance per concrete [`Module`] found. The domain modules
//! themselves (messaging, relationships, travel, finance, memory) are
//! external collaborators this repo only defines the seam for — discovery
//! registers whichever of them this build was compiled with, which today
//! is none.

use std::sync::Arc;

use butler_modules::Module;

/// Returns every module this daemon binary was built with. Empty until a
/// concrete domain module crate is added as a dependency and registered
/// here; `ModuleRegistry::build` tolerates an empty set.
pub fn discover() -> Vec<Arc<dyn Module>> {
    Vec::new()
}
