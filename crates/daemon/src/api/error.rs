// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Converts handler failures into the shared `{"error": {...}, "status": N}`
//! envelope. Every route handler returns `Result<_, ApiError>`; axum calls
//! `IntoResponse` on the `Err` arm automatically, which is this module's
//! entire job.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use daq_protocol::rest::{ApiErrorBody, ErrorCode};

use crate::orchestrator::OrchestratorError;
use crate::process::ProcessError;

pub struct ApiError(ApiErrorBody);

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self(ApiErrorBody::new(code, message))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn missing_field(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingField, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(e: OrchestratorError) -> Self {
        let code = match &e {
            OrchestratorError::UnknownModule(_) | OrchestratorError::UnknownDevice(_) => ErrorCode::NotFound,
            OrchestratorError::NotWireless(_) => ErrorCode::NotWirelessDevice,
            OrchestratorError::SessionAlreadyActive
            | OrchestratorError::NoActiveSession
            | OrchestratorError::TrialAlreadyActive
            | OrchestratorError::NoActiveTrial => ErrorCode::Conflict,
            OrchestratorError::Process(_) => ErrorCode::InternalError,
        };
        Self::new(code, e.to_string())
    }
}

impl From<ProcessError> for ApiError {
    fn from(e: ProcessError) -> Self {
        Self::new(ErrorCode::InternalError, e.to_string())
    }
}
