// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Shared state handed to every route handler.

use std::path::PathBuf;

use daq_core::Clock;

use crate::orchestrator::SharedOrchestrator;

#[derive(Clone)]
pub struct AppState<C: Clock> {
    pub orchestrator: SharedOrchestrator<C>,
    pub debug: bool,
    pub log_dir: PathBuf,
    pub started_at: std::time::Instant,
}
