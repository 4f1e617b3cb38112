// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! `key=value` configuration file parser.
//!
//! Booleans accept `true/false/yes/no/1/0` case-insensitively, numbers fall
//! back to int then float, everything else is kept as a string.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A single parsed configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ConfigValue {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" => return ConfigValue::Bool(true),
            "false" | "no" => return ConfigValue::Bool(false),
            _ => {}
        }
        if raw == "1" {
            return ConfigValue::Bool(true);
        }
        if raw == "0" {
            return ConfigValue::Bool(false);
        }
        if let Ok(i) = raw.parse::<i64>() {
            return ConfigValue::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return ConfigValue::Float(f);
        }
        ConfigValue::Str(raw.to_string())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ConfigValue::Str(s) => s.as_str(),
            _ => "",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ConfigValue::Bool(b) => serde_json::Value::Bool(*b),
            ConfigValue::Int(i) => serde_json::Value::from(*i),
            ConfigValue::Float(f) => serde_json::Value::from(*f),
            ConfigValue::Str(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Inverse of [`Self::parse`], used when a REST caller PUTs a JSON
    /// value for a single config key.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => ConfigValue::Bool(*b),
            serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => ConfigValue::Int(n.as_i64().unwrap_or_default()),
            serde_json::Value::Number(n) => ConfigValue::Float(n.as_f64().unwrap_or_default()),
            serde_json::Value::String(s) => ConfigValue::parse(s),
            other => ConfigValue::Str(other.to_string()),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Int(i) => write!(f, "{i}"),
            ConfigValue::Float(v) => write!(f, "{v}"),
            ConfigValue::Str(s) => write!(f, "{s}"),
        }
    }
}

/// A parsed `key=value` configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    values: BTreeMap<String, ConfigValue>,
}

impl ConfigFile {
    /// Parse `key=value` lines. Blank lines and lines starting with `#` are
    /// ignored. Leading/trailing whitespace around keys and values is
    /// trimmed. A line with no `=` is ignored (rather than erroring) so a
    /// missing config file can be treated as an empty one by the caller.
    pub fn parse(text: &str) -> Self {
        let mut values = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            values.insert(key.trim().to_string(), ConfigValue::parse(value.trim()));
        }
        Self { values }
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values.get(key).map(|v| v.as_str()).filter(|s| !s.is_empty()).unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values.get(key).and_then(ConfigValue::as_bool).unwrap_or(default)
    }

    pub fn get_int<T: FromStr>(&self, key: &str, default: T) -> T {
        self.values
            .get(key)
            .and_then(ConfigValue::as_i64)
            .and_then(|i| i.to_string().parse::<T>().ok())
            .unwrap_or(default)
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.values.get(key).and_then(ConfigValue::as_f64).unwrap_or(default)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), ConfigValue::parse(&value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.values.iter()
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: ConfigValue) {
        self.values.insert(key.into(), value);
    }

    pub fn to_json_map(&self) -> serde_json::Map<String, serde_json::Value> {
        self.values.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
    }

    /// Serialize back to the `key=value` text form `load`/`parse` read,
    /// sorted by key (the map is a `BTreeMap`) so repeated writes diff
    /// cleanly.
    pub fn to_text(&self) -> String {
        self.values.iter().map(|(k, v)| format!("{k}={v}\n")).collect()
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_booleans_ints_floats_and_strings() {
        let cfg = ConfigFile::parse(
            "sample_rate=48000\nauto_start_recording=true\ngain=0.75\noutput_dir=/data/out\n# comment\n\nenabled=0\n",
        );
        assert_eq!(cfg.get_int("sample_rate", 0i64), 48000);
        assert!(cfg.get_bool("auto_start_recording", false));
        assert_eq!(cfg.get_f64("gain", 0.0), 0.75);
        assert_eq!(cfg.get_str("output_dir", ""), "/data/out");
        assert!(!cfg.get_bool("enabled", true));
    }

    #[test]
    fn missing_file_is_treated_as_empty() {
        let cfg = ConfigFile::load(Path::new("/nonexistent/path/config.txt")).unwrap();
        assert_eq!(cfg.get_str("x", "default"), "default");
    }

    #[test]
    fn malformed_lines_are_skipped_not_errors() {
        let cfg = ConfigFile::parse("not_a_kv_line\nkey=value\n");
        assert_eq!(cfg.get_str("key", ""), "value");
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/module.conf");
        let mut cfg = ConfigFile::default();
        cfg.set_value("gain", ConfigValue::Float(0.5));
        cfg.set_value("auto_start_recording", ConfigValue::Bool(true));
        cfg.save(&path).unwrap();

        let reloaded = ConfigFile::load(&path).unwrap();
        assert_eq!(reloaded.get_f64("gain", 0.0), 0.5);
        assert!(reloaded.get_bool("auto_start_recording", false));
    }

    #[test]
    fn from_json_round_trips_through_to_json() {
        let value = ConfigValue::from_json(&serde_json::json!(true));
        assert_eq!(value.to_json(), serde_json::json!(true));
        let value = ConfigValue::from_json(&serde_json::json!("hello"));
        assert_eq!(value.to_json(), serde_json::json!("hello"));
    }
}
