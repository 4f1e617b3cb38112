//! Behavioral specifications for the data-acquisition orchestrator.
//!
//! These tests are black-box: they launch `daqd`, `daqctl`, and module
//! binaries as real child processes and assert on what they print, return
//! over the REST API, or write to disk.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// daemon/
#[path = "specs/daemon/health.rs"]
mod daemon_health;
#[path = "specs/daemon/session_trial.rs"]
mod daemon_session_trial;
#[path = "specs/daemon/boundary.rs"]
mod daemon_boundary;
#[path = "specs/daemon/config.rs"]
mod daemon_config;
#[path = "specs/daemon/extensions.rs"]
mod daemon_extensions;

// protocol/
#[path = "specs/protocol/malformed_command.rs"]
mod protocol_malformed_command;
