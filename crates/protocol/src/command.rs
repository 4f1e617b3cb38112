// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Command messages, orchestrator to child process.
//!
//! A command is a JSON object with a `command` key and a `timestamp`, plus
//! whatever extra fields the caller attached, newline-terminated.

use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub timestamp: Option<String>,
    /// All fields from the JSON object, including `command`/`timestamp`.
    /// Excess keys are preserved and forwarded as-is.
    pub fields: Map<String, Value>,
}

impl Command {
    /// Build a command with the given name and keyword parameters, stamping
    /// a wall-clock ISO-8601 timestamp.
    pub fn new(name: impl Into<String>, params: Map<String, Value>) -> Self {
        let name = name.into();
        let timestamp = crate::time::now_iso8601();
        let mut fields = params;
        fields.insert("command".to_string(), Value::String(name.clone()));
        fields.insert("timestamp".to_string(), Value::String(timestamp.clone()));
        Self { name, timestamp: Some(timestamp), fields }
    }

    /// Encode as a single `\n`-terminated line ready for a child's stdin.
    pub fn encode(&self) -> String {
        format!("{}\n", Value::Object(self.fields.clone()))
    }

    /// Parse one line of input. Rejects non-JSON, non-object, or
    /// missing/non-string `command`.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let trimmed = line.trim();
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(ProtocolError::NotAnObject);
        };
        let name = match fields.get("command") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(ProtocolError::MissingCommand),
            None => return Err(ProtocolError::MissingCommand),
        };
        let timestamp = fields.get("timestamp").and_then(Value::as_str).map(str::to_string);
        Ok(Self { name, timestamp, fields })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.fields.get(key).and_then(Value::as_u64)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }
}

/// Convenience builder matching the common `command(name, key=value, ...)`
/// call sites used throughout the module runtime and the orchestrator.
#[macro_export]
macro_rules! command {
    ($name:expr $(,)?) => {
        $crate::Command::new($name, ::serde_json::Map::new())
    };
    ($name:expr, $($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = ::serde_json::Map::new();
        $(map.insert($key.to_string(), ::serde_json::json!($value));)+
        $crate::Command::new($name, map)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_parse_preserves_command_and_extra_fields() {
        let cmd = command!("start_recording", "trial_number" => 2, "trial_label" => "t2");
        let line = cmd.encode();
        let parsed = Command::parse(&line).unwrap();
        assert_eq!(parsed.name, "start_recording");
        assert_eq!(parsed.get_u64("trial_number"), Some(2));
        assert_eq!(parsed.get_str("trial_label"), Some("t2"));
        assert!(parsed.timestamp.is_some());
    }

    #[test]
    fn rejects_truncated_json() {
        let err = Command::parse(r#"{"command": "start_recording"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidJson(_)));
    }

    #[test]
    fn rejects_non_object_json() {
        let err = Command::parse("42").unwrap_err();
        assert!(matches!(err, ProtocolError::NotAnObject));
    }

    #[test]
    fn rejects_missing_command_key() {
        let err = Command::parse(r#"{"foo": "bar"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingCommand));
    }

    #[test]
    fn rejects_non_string_command_key() {
        let err = Command::parse(r#"{"command": 7}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingCommand));
    }
}
