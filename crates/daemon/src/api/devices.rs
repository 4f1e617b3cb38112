// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Device route family: `/devices`, `/devices/{id}/connect|disconnect`,
//! `/devices/scanning/status`.

use axum::extract::{Path, State};
use axum::Json;
use daq_core::{Clock, DeviceId};
use serde_json::{json, Value};

use super::state::AppState;
use super::ApiError;

pub async fn list_devices<C: Clock>(State(state): State<AppState<C>>) -> Json<Value> {
    let orchestrator = state.orchestrator.lock().await;
    let devices: Vec<Value> = orchestrator
        .devices()
        .into_iter()
        .map(|d| {
            json!({
                "device_id": d.device_id.as_str(),
                "display_name": d.display_name,
                "module_id": d.module_id,
                "interface": format!("{:?}", d.interface),
                "device_type": format!("{:?}", d.device_type),
                "connected": d.connected,
                "connecting": d.connecting,
            })
        })
        .collect();
    Json(json!({ "devices": devices }))
}

pub async fn connect_device<C: Clock>(State(state): State<AppState<C>>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let device_id = DeviceId::from_string(&id);
    let mut orchestrator = state.orchestrator.lock().await;
    orchestrator.begin_connecting(&device_id, false)?;
    orchestrator.mark_connected(&device_id);
    Ok(Json(json!({ "device_id": id, "connected": true })))
}

pub async fn disconnect_device<C: Clock>(State(state): State<AppState<C>>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let device_id = DeviceId::from_string(&id);
    let mut orchestrator = state.orchestrator.lock().await;
    orchestrator.device(&device_id).ok_or_else(|| ApiError::not_found(format!("no such device: {id}")))?;
    orchestrator.mark_disconnected(&device_id);
    Ok(Json(json!({ "device_id": id, "connected": false })))
}

pub async fn scanning_status<C: Clock>(State(state): State<AppState<C>>) -> Json<Value> {
    let orchestrator = state.orchestrator.lock().await;
    Json(json!({ "device_count": orchestrator.devices().len() }))
}
