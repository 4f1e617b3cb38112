// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Daemon configuration: file-backed defaults overridable by CLI flags and
//! environment variables, in that precedence order (lowest to highest).
//! Splits a state-directory root from the individually overridable knobs
//! layered on top of it.

use std::path::PathBuf;
use std::time::Duration;

use daq_core::ConfigFile;

const ENV_STATE_DIR: &str = "DAQ_STATE_DIR";
const ENV_DATA_DIR: &str = "DAQ_DATA_DIR";
const ENV_API_PORT: &str = "DAQ_API_PORT";

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub state_dir: PathBuf,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    /// The file `load` was given, kept around so `/config/reload` knows
    /// what to re-read.
    pub config_path: Option<PathBuf>,
    pub session_prefix: String,
    pub discovery_retry_interval: Duration,
    pub trial_start_timeout: Duration,
    pub trial_stop_timeout: Duration,
    pub init_timeout: Duration,
    pub gui_start_minimized: bool,
    pub api_host: String,
    pub api_port: u16,
    pub api_debug: bool,
}

impl DaemonConfig {
    /// Resolve the daemon's state directory: `$DAQ_STATE_DIR`, else
    /// `$XDG_STATE_HOME/daq`, else `~/.local/state/daq`.
    pub fn state_dir_default() -> PathBuf {
        if let Ok(dir) = std::env::var(ENV_STATE_DIR) {
            return PathBuf::from(dir);
        }
        if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            return PathBuf::from(xdg).join("daq");
        }
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".local/state/daq")
    }

    /// Load defaults, then overlay `config_path` (if present), then
    /// environment variables. CLI flags are applied by the caller after
    /// this returns (see `main.rs`), as the outermost override layer.
    pub fn load(config_path: Option<&PathBuf>) -> std::io::Result<Self> {
        let state_dir = Self::state_dir_default();
        let mut cfg = Self {
            log_dir: state_dir.join("logs"),
            data_dir: state_dir.join("data"),
            state_dir,
            config_path: config_path.cloned(),
            session_prefix: "session".to_string(),
            discovery_retry_interval: Duration::from_millis(500),
            trial_start_timeout: Duration::from_secs(3),
            trial_stop_timeout: Duration::from_secs(5),
            init_timeout: Duration::from_secs(15),
            gui_start_minimized: false,
            api_host: "127.0.0.1".to_string(),
            api_port: 8080,
            api_debug: false,
        };

        let file = match config_path {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        cfg.apply_file(&file);
        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_file(&mut self, file: &ConfigFile) {
        if let Some(v) = file.get("data_dir") {
            self.data_dir = PathBuf::from(v.as_str());
        }
        if let Some(v) = file.get("log_dir") {
            self.log_dir = PathBuf::from(v.as_str());
        }
        self.session_prefix = file.get_str("session_prefix", &self.session_prefix).to_string();
        self.discovery_retry_interval = Duration::from_millis(file.get_int("discovery_retry_interval_ms", self.discovery_retry_interval.as_millis() as u64));
        self.trial_start_timeout = Duration::from_millis(file.get_int("trial_start_timeout_ms", self.trial_start_timeout.as_millis() as u64));
        self.trial_stop_timeout = Duration::from_millis(file.get_int("trial_stop_timeout_ms", self.trial_stop_timeout.as_millis() as u64));
        self.init_timeout = Duration::from_millis(file.get_int("init_timeout_ms", self.init_timeout.as_millis() as u64));
        self.gui_start_minimized = file.get_bool("gui_start_minimized", self.gui_start_minimized);
        self.api_host = file.get_str("api_host", &self.api_host).to_string();
        self.api_port = file.get_int("api_port", self.api_port as i64) as u16;
        self.api_debug = file.get_bool("api_debug", self.api_debug);
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(port) = std::env::var(ENV_API_PORT) {
            if let Ok(port) = port.parse() {
                self.api_port = port;
            }
        }
    }

    /// The fields exposed and mutable through `/api/v1/config`. Excludes
    /// `state_dir`/`data_dir`/`log_dir`/`api_host`/`api_port`, which are
    /// bound once at process startup and cannot move underneath a running
    /// daemon.
    pub fn runtime_json(&self) -> serde_json::Value {
        serde_json::json!({
            "session_prefix": self.session_prefix,
            "discovery_retry_interval_ms": self.discovery_retry_interval.as_millis() as u64,
            "trial_start_timeout_ms": self.trial_start_timeout.as_millis() as u64,
            "trial_stop_timeout_ms": self.trial_stop_timeout.as_millis() as u64,
            "init_timeout_ms": self.init_timeout.as_millis() as u64,
            "gui_start_minimized": self.gui_start_minimized,
            "api_debug": self.api_debug,
        })
    }

    /// Apply a JSON object of runtime-safe overrides in place. Unrecognized
    /// keys and fields of the wrong JSON type are ignored rather than
    /// rejected, so a caller can PUT a partial patch.
    pub fn apply_runtime_json(&mut self, patch: &serde_json::Map<String, serde_json::Value>) {
        if let Some(v) = patch.get("session_prefix").and_then(|v| v.as_str()) {
            self.session_prefix = v.to_string();
        }
        if let Some(v) = patch.get("discovery_retry_interval_ms").and_then(|v| v.as_u64()) {
            self.discovery_retry_interval = Duration::from_millis(v);
        }
        if let Some(v) = patch.get("trial_start_timeout_ms").and_then(|v| v.as_u64()) {
            self.trial_start_timeout = Duration::from_millis(v);
        }
        if let Some(v) = patch.get("trial_stop_timeout_ms").and_then(|v| v.as_u64()) {
            self.trial_stop_timeout = Duration::from_millis(v);
        }
        if let Some(v) = patch.get("init_timeout_ms").and_then(|v| v.as_u64()) {
            self.init_timeout = Duration::from_millis(v);
        }
        if let Some(v) = patch.get("gui_start_minimized").and_then(|v| v.as_bool()) {
            self.gui_start_minimized = v;
        }
        if let Some(v) = patch.get("api_debug").and_then(|v| v.as_bool()) {
            self.api_debug = v;
        }
    }

    /// Re-read `config_path` (if any), refreshing the same runtime-safe
    /// fields `apply_runtime_json` covers. `state_dir`/`data_dir`/
    /// `log_dir`/`api_host`/`api_port` stay as they were at startup.
    pub fn reload(&mut self) -> std::io::Result<()> {
        let file = match &self.config_path {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        self.session_prefix = file.get_str("session_prefix", &self.session_prefix).to_string();
        self.discovery_retry_interval = Duration::from_millis(file.get_int("discovery_retry_interval_ms", self.discovery_retry_interval.as_millis() as u64));
        self.trial_start_timeout = Duration::from_millis(file.get_int("trial_start_timeout_ms", self.trial_start_timeout.as_millis() as u64));
        self.trial_stop_timeout = Duration::from_millis(file.get_int("trial_stop_timeout_ms", self.trial_stop_timeout.as_millis() as u64));
        self.init_timeout = Duration::from_millis(file.get_int("init_timeout_ms", self.init_timeout.as_millis() as u64));
        self.gui_start_minimized = file.get_bool("gui_start_minimized", self.gui_start_minimized);
        self.api_debug = file.get_bool("api_debug", self.api_debug);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_with_no_file_uses_defaults() {
        let cfg = DaemonConfig::load(None).unwrap();
        assert_eq!(cfg.api_port, 8080);
        assert_eq!(cfg.trial_start_timeout, Duration::from_secs(3));
        assert_eq!(cfg.init_timeout, Duration::from_secs(15));
    }

    #[test]
    fn load_with_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.conf");
        std::fs::write(&path, "api_port=9090\nsession_prefix=pilot\ntrial_start_timeout_ms=1500\n").unwrap();
        let cfg = DaemonConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.api_port, 9090);
        assert_eq!(cfg.session_prefix, "pilot");
        assert_eq!(cfg.trial_start_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn missing_config_file_is_not_an_error() {
        let cfg = DaemonConfig::load(Some(&PathBuf::from("/nonexistent/daemon.conf")));
        assert!(cfg.is_ok());
    }

    #[test]
    fn apply_runtime_json_updates_only_recognized_fields() {
        let mut cfg = DaemonConfig::load(None).unwrap();
        let original_api_port = cfg.api_port;
        let patch = serde_json::json!({
            "session_prefix": "pilot",
            "init_timeout_ms": 20_000,
            "api_port": 1234,
        });
        cfg.apply_runtime_json(patch.as_object().unwrap());
        assert_eq!(cfg.session_prefix, "pilot");
        assert_eq!(cfg.init_timeout, Duration::from_millis(20_000));
        assert_eq!(cfg.api_port, original_api_port, "api_port is not a runtime-safe field");
    }

    #[test]
    fn reload_picks_up_changes_written_to_the_config_file_after_startup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.conf");
        std::fs::write(&path, "session_prefix=first\n").unwrap();
        let mut cfg = DaemonConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.session_prefix, "first");

        std::fs::write(&path, "session_prefix=second\ninit_timeout_ms=9000\n").unwrap();
        cfg.reload().unwrap();
        assert_eq!(cfg.session_prefix, "second");
        assert_eq!(cfg.init_timeout, Duration::from_millis(9000));
    }
}
