// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Session and trial route family: `/session`, `/trial`.

use axum::extract::State;
use axum::Json;
use daq_core::Clock;
use serde::Deserialize;
use serde_json::{json, Value};

use super::state::AppState;
use super::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct StartSessionBody {
    pub session_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct StartTrialBody {
    pub trial_label: Option<String>,
}

pub async fn get_session<C: Clock>(State(state): State<AppState<C>>) -> Json<Value> {
    let orchestrator = state.orchestrator.lock().await;
    match orchestrator.session() {
        Some(session) => Json(json!({
            "active": session.active,
            "session_label": session.session_label,
            "session_dir": session.session_dir,
            "trial_counter": session.trial_counter,
            "trial_active": session.trial_active,
        })),
        None => Json(json!({ "active": false })),
    }
}

pub async fn start_session<C: Clock>(
    State(state): State<AppState<C>>,
    body: Option<Json<StartSessionBody>>,
) -> Result<Json<Value>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let mut orchestrator = state.orchestrator.lock().await;
    let session = orchestrator.start_session(body.session_dir)?;
    Ok(Json(json!({ "session_label": session.session_label, "session_dir": session.session_dir })))
}

pub async fn stop_session<C: Clock>(State(state): State<AppState<C>>) -> Result<Json<Value>, ApiError> {
    let mut orchestrator = state.orchestrator.lock().await;
    orchestrator.stop_session()?;
    Ok(Json(json!({ "active": false })))
}

pub async fn trial_status<C: Clock>(State(state): State<AppState<C>>) -> Result<Json<Value>, ApiError> {
    let orchestrator = state.orchestrator.lock().await;
    let session = orchestrator.session().ok_or_else(|| ApiError::not_found("no active session"))?;
    Ok(Json(json!({ "trial_counter": session.trial_counter, "trial_active": session.trial_active, "trial_label": session.trial_label })))
}

pub async fn start_trial<C: Clock>(
    State(state): State<AppState<C>>,
    body: Option<Json<StartTrialBody>>,
) -> Result<Json<Value>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let mut orchestrator = state.orchestrator.lock().await;
    let outcome = orchestrator.start_trial(body.trial_label).await?;
    Ok(Json(serde_json::to_value(outcome).unwrap_or(Value::Null)))
}

pub async fn stop_trial<C: Clock>(State(state): State<AppState<C>>) -> Result<Json<Value>, ApiError> {
    let mut orchestrator = state.orchestrator.lock().await;
    let outcome = orchestrator.stop_trial().await?;
    Ok(Json(serde_json::to_value(outcome).unwrap_or(Value::Null)))
}
