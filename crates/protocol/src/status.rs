// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Status messages, child process to orchestrator.
//!
//! A status is a JSON object tagged `type: "status"` carrying a status
//! name, a timestamp, and a free-form data payload. [`StatusWriter`] is the
//! sink a module writes these through: a value owned by the module runtime
//! and threaded explicitly into command handlers, rather than a shared
//! global, so it keeps working if a handler redirects its own stdout.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// Well-known status values. New statuses are accepted as opaque strings
/// by the orchestrator, so this is a set of constants, not a closed enum.
pub mod well_known {
    pub const INITIALIZING: &str = "initializing";
    pub const INITIALIZED: &str = "initialized";
    pub const RECORDING_STARTED: &str = "recording_started";
    pub const RECORDING_STOPPED: &str = "recording_stopped";
    pub const SNAPSHOT_TAKEN: &str = "snapshot_taken";
    pub const STATUS_REPORT: &str = "status_report";
    pub const PREVIEW_FRAME: &str = "preview_frame";
    pub const PREVIEW_TOGGLED: &str = "preview_toggled";
    pub const GEOMETRY_CHANGED: &str = "geometry_changed";
    pub const ERROR: &str = "error";
    pub const WARNING: &str = "warning";
    pub const QUITTING: &str = "quitting";
}

/// Maximum length of a sanitised error message embedded in a status line.
pub const ERROR_MESSAGE_LIMIT: usize = 200;

pub fn sanitize_error_message(msg: &str) -> String {
    let clean: String = msg.chars().filter(|c| !c.is_control() || *c == ' ').collect();
    crate::str_truncate(&clean, ERROR_MESSAGE_LIMIT)
}

/// A parsed status line.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub status: String,
    pub timestamp: Option<String>,
    pub data: Value,
}

impl Status {
    pub fn new(status: impl Into<String>, data: Value) -> Self {
        Self {
            status: status.into(),
            timestamp: Some(crate::time::now_iso8601()),
            data,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == well_known::ERROR
    }

    pub fn is_warning(&self) -> bool {
        self.status == well_known::WARNING
    }

    pub fn error_message(&self) -> Option<&str> {
        if self.is_error() {
            self.data.get("message").and_then(Value::as_str)
        } else {
            None
        }
    }

    fn encode(&self) -> String {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::String("status".to_string()));
        obj.insert("status".to_string(), Value::String(self.status.clone()));
        obj.insert(
            "timestamp".to_string(),
            Value::String(self.timestamp.clone().unwrap_or_default()),
        );
        obj.insert("data".to_string(), self.data.clone());
        format!("{}\n", Value::Object(obj))
    }

    /// Parse a status line. A non-status JSON object (no `type: "status"`)
    /// is rejected with [`ProtocolError::NotAStatus`] rather than panicking,
    /// mirroring [`crate::Command::parse`]'s leniency.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(line.trim()).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
        let Value::Object(obj) = value else {
            return Err(ProtocolError::NotAnObject);
        };
        if obj.get("type").and_then(Value::as_str) != Some("status") {
            return Err(ProtocolError::NotAStatus);
        }
        let status = obj
            .get("status")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::NotAStatus)?
            .to_string();
        let timestamp = obj.get("timestamp").and_then(Value::as_str).map(str::to_string);
        let data = obj.get("data").cloned().unwrap_or(Value::Object(Map::new()));
        Ok(Self { status, timestamp, data })
    }
}

/// Sink for status lines, owned by the module runtime's `System` and
/// threaded into every command handler explicitly.
///
/// A module that redirects its own stdout to a log file constructs this
/// over the *original* stdout handle before doing so, so parent
/// communication survives the redirect.
#[derive(Clone)]
pub struct StatusWriter {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl StatusWriter {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self { inner: Arc::new(Mutex::new(Box::new(sink))) }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// Write one status line atomically and flush.
    pub fn send(&self, status: impl Into<String>, data: Value) -> Result<(), ProtocolError> {
        let msg = Status::new(status, data);
        let line = msg.encode();
        let mut guard = self.inner.lock();
        guard.write_all(line.as_bytes()).map_err(|e| ProtocolError::Io(e.to_string()))?;
        guard.flush().map_err(|e| ProtocolError::Io(e.to_string()))
    }

    pub fn send_error(&self, message: impl AsRef<str>) -> Result<(), ProtocolError> {
        self.send(well_known::ERROR, serde_json::json!({ "message": sanitize_error_message(message.as_ref()) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_parse_round_trips_status_and_data() {
        let msg = Status::new("initialized", serde_json::json!({"devices": 2}));
        let line = msg.encode();
        let parsed = Status::parse(&line).unwrap();
        assert_eq!(parsed.status, "initialized");
        assert_eq!(parsed.data, serde_json::json!({"devices": 2}));
    }

    #[test]
    fn is_error_and_is_warning_predicates() {
        let err = Status::new("error", serde_json::json!({"message": "boom"}));
        assert!(err.is_error());
        assert!(!err.is_warning());
        assert_eq!(err.error_message(), Some("boom"));

        let warn = Status::new("warning", Value::Null);
        assert!(warn.is_warning());
        assert!(!warn.is_error());
    }

    #[test]
    fn rejects_non_status_objects() {
        let err = Status::parse(r#"{"command": "quit"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::NotAStatus));
    }

    #[test]
    fn status_writer_writes_single_flushed_line() {
        let buf: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        struct SharedBuf(Arc<Mutex<Vec<u8>>>);
        impl Write for SharedBuf {
            fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
                self.0.lock().extend_from_slice(data);
                Ok(data.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let writer = StatusWriter::new(SharedBuf(Arc::clone(&buf)));
        writer.send("quitting", serde_json::json!({"reason": "operator"})).unwrap();
        let written = String::from_utf8(buf.lock().clone()).unwrap();
        assert_eq!(written.matches('\n').count(), 1);
        let parsed = Status::parse(written.trim()).unwrap();
        assert_eq!(parsed.status, "quitting");
    }

    #[test]
    fn sanitize_truncates_to_limit() {
        let long = "x".repeat(500);
        let sanitized = sanitize_error_message(&long);
        assert_eq!(sanitized.chars().count(), ERROR_MESSAGE_LIMIT);
    }
}
