// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! REST control-plane error envelope shared by the daemon and the CLI
//! client: `{"error": {"code", "message", "details?"}, "status": N}`.

use serde::{Deserialize, Serialize};

/// Well-known error codes used across route families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationError,
    MissingField,
    NotFound,
    Conflict,
    NotWirelessDevice,
    Forbidden,
    InternalError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::MissingField => "MISSING_FIELD",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::NotWirelessDevice => "NOT_WIRELESS_DEVICE",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// HTTP status mirrored in the envelope's `status` field.
    pub const fn http_status(self) -> u16 {
        match self {
            ErrorCode::ValidationError | ErrorCode::MissingField | ErrorCode::Conflict | ErrorCode::NotWirelessDevice => 400,
            ErrorCode::Forbidden => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::InternalError => 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// The full response body for any non-2xx route result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiErrorBody {
    pub error: ErrorDetail,
    pub status: u16,
}

impl ApiErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail { code: code.as_str().to_string(), message: message.into(), details: None },
            status: code.http_status(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_mirrors_http_status() {
        let body = ApiErrorBody::new(ErrorCode::NotWirelessDevice, "device is wired");
        assert_eq!(body.status, 400);
        assert_eq!(body.error.code, "NOT_WIRELESS_DEVICE");
    }

    #[test]
    fn missing_resource_maps_to_404() {
        let body = ApiErrorBody::new(ErrorCode::NotFound, "no such module");
        assert_eq!(body.status, 404);
    }

    #[test]
    fn details_are_omitted_when_absent() {
        let body = ApiErrorBody::new(ErrorCode::InternalError, "boom");
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["error"].get("details").is_none());
    }
}
