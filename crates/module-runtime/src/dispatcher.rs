// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! The command dispatcher every module shares: it owns the built-in
//! `start_recording`/`stop_recording`/`get_status`/`get_geometry`/
//! `take_snapshot`/`quit` contract and forwards anything else to the
//! module's own [`ModuleHandlers`] implementation.

use daq_core::WindowGeometry;
use daq_protocol::status::well_known;
use daq_protocol::{Command, StatusWriter};
use serde_json::Value;

use crate::error::RuntimeError;
use crate::system::System;

/// What a module does for each built-in command. A module crate (audio,
/// GPS, camera, ...) implements this once; the dispatcher handles the
/// surrounding contract (status emission, precondition checks, error
/// sanitisation) uniformly.
#[async_trait::async_trait]
pub trait ModuleHandlers: Send + Sync {
    /// Begin capture. Called only when not already recording.
    async fn start_recording(&self, sys: &System, cmd: &Command) -> Result<Value, RuntimeError>;

    /// Stop capture. Called only when currently recording.
    async fn stop_recording(&self, sys: &System, cmd: &Command) -> Result<Value, RuntimeError>;

    /// A module-specific status snapshot for `status_report`.
    async fn status_snapshot(&self, sys: &System) -> Value;

    /// The toolkit's current `WxH+X+Y` geometry string, if this module owns
    /// a GUI window.
    async fn geometry_string(&self, _sys: &System) -> Option<String> {
        None
    }

    async fn take_snapshot(&self, _sys: &System, _cmd: &Command) -> Result<Value, RuntimeError> {
        Err(RuntimeError::NotSupported { command: "take_snapshot".to_string() })
    }

    /// Anything not in the built-in set. `Ok(None)` means "unhandled" and
    /// the dispatcher emits the generic unknown-command error.
    async fn custom_command(&self, _sys: &System, _cmd: &Command) -> Result<Option<Value>, RuntimeError> {
        Ok(None)
    }
}

/// Result of dispatching one line: whether the event loop should continue
/// or the module received `quit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Continue,
    Stop,
}

pub struct Dispatcher;

impl Dispatcher {
    /// Parse and dispatch one command line. Never propagates handler
    /// errors: they are caught, sanitised, and sent as an `error` status.
    pub async fn dispatch_line(handlers: &dyn ModuleHandlers, sys: &System, line: &str) -> DispatchOutcome {
        let cmd = match Command::parse(line) {
            Ok(cmd) => cmd,
            Err(e) => {
                let _ = sys.status.send_error(e.to_string());
                return DispatchOutcome::Continue;
            }
        };
        Self::dispatch(handlers, sys, &cmd).await
    }

    pub async fn dispatch(handlers: &dyn ModuleHandlers, sys: &System, cmd: &Command) -> DispatchOutcome {
        let result = Self::run_command(handlers, sys, cmd).await;
        match result {
            Ok(Some(DispatchOutcome::Stop)) => return DispatchOutcome::Stop,
            Ok(_) => {}
            Err(e) => {
                let _ = sys.status.send_error(e.to_string());
            }
        }
        DispatchOutcome::Continue
    }

    async fn run_command(
        handlers: &dyn ModuleHandlers,
        sys: &System,
        cmd: &Command,
    ) -> Result<Option<DispatchOutcome>, RuntimeError> {
        match cmd.name.as_str() {
            "start_recording" => {
                Self::require_recording_state(sys, false)?;
                if let Some(dir) = cmd.get_str("session_dir") {
                    sys.set_session_dir(std::path::PathBuf::from(dir));
                }
                let data = handlers.start_recording(sys, cmd).await?;
                sys.set_recording(true);
                sys.status.send(well_known::RECORDING_STARTED, data)?;
            }
            "stop_recording" => {
                Self::require_recording_state(sys, true)?;
                let data = handlers.stop_recording(sys, cmd).await?;
                sys.set_recording(false);
                sys.status.send(well_known::RECORDING_STOPPED, data)?;
            }
            "get_status" => {
                let data = handlers.status_snapshot(sys).await;
                sys.status.send(well_known::STATUS_REPORT, data)?;
            }
            "set_window_geometry" => {
                let geom = cmd
                    .get_str("geometry")
                    .and_then(WindowGeometry::parse)
                    .or_else(|| {
                        Some(WindowGeometry {
                            width: cmd.get_u64("width")? as u32,
                            height: cmd.get_u64("height")? as u32,
                            x: cmd.get_i64("x")? as i32,
                            y: cmd.get_i64("y")? as i32,
                        })
                    })
                    .ok_or_else(|| RuntimeError::Other("missing geometry or x/y/width/height fields".to_string()))?;
                sys.set_window_geometry(geom);
                sys.status.send(
                    well_known::GEOMETRY_CHANGED,
                    serde_json::json!({"width": geom.width, "height": geom.height, "x": geom.x, "y": geom.y}),
                )?;
            }
            "get_geometry" => {
                let raw_geom = match handlers.geometry_string(sys).await {
                    Some(raw) => WindowGeometry::parse(&raw),
                    None => sys.window_geometry(),
                };
                if let Some(geom) = raw_geom {
                    sys.status.send(
                        well_known::GEOMETRY_CHANGED,
                        serde_json::json!({"width": geom.width, "height": geom.height, "x": geom.x, "y": geom.y}),
                    )?;
                }
            }
            "take_snapshot" => {
                let data = handlers.take_snapshot(sys, cmd).await?;
                sys.status.send(well_known::SNAPSHOT_TAKEN, data)?;
            }
            "quit" => {
                sys.status.send(well_known::QUITTING, Value::Null)?;
                sys.request_shutdown();
                return Ok(Some(DispatchOutcome::Stop));
            }
            _ => match handlers.custom_command(sys, cmd).await? {
                Some(_data) => {}
                None => return Err(RuntimeError::UnknownCommand(cmd.name.clone())),
            },
        }
        Ok(None)
    }

    fn require_recording_state(sys: &System, expected: bool) -> Result<(), RuntimeError> {
        if sys.is_recording() != expected {
            return Err(RuntimeError::PreconditionFailed { expected });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_core::ConfigFile;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RecordingBuf(Arc<parking_lot::Mutex<Vec<u8>>>);
    impl std::io::Write for RecordingBuf {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(data);
            Ok(data.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct TestHandlers {
        starts: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ModuleHandlers for TestHandlers {
        async fn start_recording(&self, _sys: &System, _cmd: &Command) -> Result<Value, RuntimeError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::json!({"file": "out.wav"}))
        }

        async fn stop_recording(&self, _sys: &System, _cmd: &Command) -> Result<Value, RuntimeError> {
            Ok(Value::Null)
        }

        async fn status_snapshot(&self, _sys: &System) -> Value {
            serde_json::json!({"starts": self.starts.load(Ordering::SeqCst)})
        }
    }

    fn test_system() -> (System, Arc<parking_lot::Mutex<Vec<u8>>>) {
        let buf = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let status = StatusWriter::new(RecordingBuf(Arc::clone(&buf)));
        (System::new(ConfigFile::default(), status), buf)
    }

    #[tokio::test]
    async fn start_recording_emits_recording_started_and_flips_flag() {
        let (sys, buf) = test_system();
        let handlers = TestHandlers { starts: AtomicUsize::new(0) };
        let cmd = daq_protocol::command!("start_recording");
        let outcome = Dispatcher::dispatch(&handlers, &sys, &cmd).await;
        assert_eq!(outcome, DispatchOutcome::Continue);
        assert!(sys.is_recording());
        let out = String::from_utf8(buf.lock().clone()).unwrap();
        assert!(out.contains("recording_started"));
    }

    #[tokio::test]
    async fn stop_recording_without_start_emits_error_not_panic() {
        let (sys, buf) = test_system();
        let handlers = TestHandlers { starts: AtomicUsize::new(0) };
        let cmd = daq_protocol::command!("stop_recording");
        let outcome = Dispatcher::dispatch(&handlers, &sys, &cmd).await;
        assert_eq!(outcome, DispatchOutcome::Continue);
        assert!(!sys.is_recording());
        let out = String::from_utf8(buf.lock().clone()).unwrap();
        assert!(out.contains("\"error\""));
    }

    #[tokio::test]
    async fn quit_requests_shutdown_and_stops_dispatch() {
        let (sys, _buf) = test_system();
        let handlers = TestHandlers { starts: AtomicUsize::new(0) };
        let cmd = daq_protocol::command!("quit");
        let outcome = Dispatcher::dispatch(&handlers, &sys, &cmd).await;
        assert_eq!(outcome, DispatchOutcome::Stop);
        assert!(sys.is_shutting_down());
    }

    #[tokio::test]
    async fn set_window_geometry_round_trips_through_get_geometry() {
        let (sys, buf) = test_system();
        let handlers = TestHandlers { starts: AtomicUsize::new(0) };
        let set_cmd = daq_protocol::command!(
            "set_window_geometry",
            "width" => 800,
            "height" => 600,
            "x" => 100,
            "y" => 100,
        );
        Dispatcher::dispatch(&handlers, &sys, &set_cmd).await;
        buf.lock().clear();

        let get_cmd = daq_protocol::command!("get_geometry");
        Dispatcher::dispatch(&handlers, &sys, &get_cmd).await;
        let out = String::from_utf8(buf.lock().clone()).unwrap();
        assert!(out.contains("geometry_changed"));
        assert!(out.contains("\"width\":800"));
        assert!(out.contains("\"x\":100"));
    }

    #[tokio::test]
    async fn unknown_command_emits_error() {
        let (sys, buf) = test_system();
        let handlers = TestHandlers { starts: AtomicUsize::new(0) };
        let cmd = daq_protocol::command!("frobnicate");
        Dispatcher::dispatch(&handlers, &sys, &cmd).await;
        let out = String::from_utf8(buf.lock().clone()).unwrap();
        assert!(out.contains("unknown command"));
    }
}
