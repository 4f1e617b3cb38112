// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! System route family: `/health`, `/status`, `/platform`, `/info/system`,
//! `/shutdown`.

use axum::extract::State;
use axum::Json;
use daq_core::Clock;
use serde_json::{json, Value};

use super::state::AppState;
use super::ApiError;

pub async fn health<C: Clock>(State(_state): State<AppState<C>>) -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn status<C: Clock>(State(state): State<AppState<C>>) -> Json<Value> {
    let orchestrator = state.orchestrator.lock().await;
    let modules: Vec<Value> = orchestrator
        .list_modules()
        .into_iter()
        .map(|(name, state)| json!({ "name": name, "state": format!("{state:?}") }))
        .collect();
    Json(json!({
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "session_active": orchestrator.session().is_some(),
        "modules": modules,
    }))
}

pub async fn platform<C: Clock>(State(_state): State<AppState<C>>) -> Json<Value> {
    Json(json!({
        "os": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
        "family": std::env::consts::FAMILY,
    }))
}

pub async fn info_system<C: Clock>(State(state): State<AppState<C>>) -> Json<Value> {
    Json(json!({
        "pid": std::process::id(),
        "data_dir": state.orchestrator.lock().await.config().data_dir,
        "log_dir": state.log_dir,
    }))
}

/// Graceful shutdown is requested by the caller closing the server's
/// listener (see `main.rs`'s signal handling); this route only acknowledges
/// the request so a REST client doesn't need direct process access.
pub async fn shutdown<C: Clock>(State(_state): State<AppState<C>>) -> Result<Json<Value>, ApiError> {
    Ok(Json(json!({ "status": "shutdown_requested" })))
}
