// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Module route family: `/modules`, `/modules/{name}/...`, `/instances`.

use axum::extract::{Path, State};
use axum::Json;
use daq_core::Clock;
use serde_json::{json, Value};

use super::state::AppState;
use super::ApiError;

pub async fn list_modules<C: Clock>(State(state): State<AppState<C>>) -> Json<Value> {
    let orchestrator = state.orchestrator.lock().await;
    let modules: Vec<Value> = orchestrator
        .list_modules()
        .into_iter()
        .map(|(name, module_state)| json!({ "name": name, "state": format!("{module_state:?}") }))
        .collect();
    Json(json!({ "modules": modules }))
}

pub async fn module_detail<C: Clock>(State(state): State<AppState<C>>, Path(name): Path<String>) -> Result<Json<Value>, ApiError> {
    let orchestrator = state.orchestrator.lock().await;
    let module_state = orchestrator.module_state(&name).ok_or_else(|| ApiError::not_found(format!("no such module: {name}")))?;
    Ok(Json(json!({ "name": name, "state": format!("{module_state:?}") })))
}

pub async fn start_module<C: Clock>(State(state): State<AppState<C>>, Path(name): Path<String>) -> Result<Json<Value>, ApiError> {
    let mut orchestrator = state.orchestrator.lock().await;
    orchestrator.start_module(&name).await?;
    Ok(Json(json!({ "name": name, "state": "ready" })))
}

pub async fn stop_module<C: Clock>(State(state): State<AppState<C>>, Path(name): Path<String>) -> Result<Json<Value>, ApiError> {
    let mut orchestrator = state.orchestrator.lock().await;
    orchestrator.stop_module(&name).await?;
    Ok(Json(json!({ "name": name, "state": "stopped" })))
}

pub async fn list_instances<C: Clock>(State(state): State<AppState<C>>) -> Json<Value> {
    let orchestrator = state.orchestrator.lock().await;
    let instances: Vec<Value> = orchestrator
        .list_modules()
        .into_iter()
        .map(|(name, module_state)| json!({ "module_name": name, "state": format!("{module_state:?}") }))
        .collect();
    Json(json!({ "instances": instances }))
}
