// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Log route family: `/logs/paths`, `/logs/master`, `/logs/modules/{name}`,
//! `/logs/tail/{path}`. Tailing rejects any path escaping the log
//! directory.

use axum::extract::{Path, State};
use axum::Json;
use daq_core::Clock;
use serde_json::{json, Value};

use super::reject_path_traversal;
use super::state::AppState;
use super::ApiError;

const TAIL_MAX_BYTES: usize = 64 * 1024;

pub async fn paths<C: Clock>(State(state): State<AppState<C>>) -> Json<Value> {
    let orchestrator = state.orchestrator.lock().await;
    let modules: Vec<String> = orchestrator.list_modules().into_iter().map(|(name, _)| format!("{name}.log")).collect();
    Json(json!({ "log_dir": state.log_dir, "master": "daemon.log", "modules": modules }))
}

pub async fn master<C: Clock>(State(state): State<AppState<C>>) -> Result<String, ApiError> {
    read_tail(&state.log_dir.join("daemon.log"))
}

pub async fn module_log<C: Clock>(State(state): State<AppState<C>>, Path(name): Path<String>) -> Result<String, ApiError> {
    read_tail(&state.log_dir.join(format!("{name}.log")))
}

pub async fn tail<C: Clock>(State(state): State<AppState<C>>, Path(path): Path<String>) -> Result<String, ApiError> {
    let target = reject_path_traversal(&state.log_dir, &path)?;
    read_tail(&target)
}

fn read_tail(path: &std::path::Path) -> Result<String, ApiError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ApiError::not_found(format!("cannot read log: {e}")))?;
    let tail = if contents.len() > TAIL_MAX_BYTES {
        let min_start = contents.len() - TAIL_MAX_BYTES;
        let start = (min_start..contents.len()).find(|&i| contents.is_char_boundary(i)).unwrap_or(0);
        contents[start..].to_string()
    } else {
        contents
    };
    Ok(tail)
}
