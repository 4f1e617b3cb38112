// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Mode dispatch: slave (stdin-driven), headless (auto-start), and GUI
//! (cooperative toolkit pump) event loops, all built on the same
//! [`crate::dispatcher::Dispatcher`].

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::dispatcher::{Dispatcher, DispatchOutcome, ModuleHandlers};
use crate::system::System;

/// Bounded command queue depth for slave mode, so a burst of commands
/// cannot grow without limit while a handler is slow.
const SLAVE_QUEUE_CAPACITY: usize = 100;

/// Cooperative GUI-toolkit pump: drives the windowing toolkit's event
/// queue and reports whether the window is still alive. Implemented by the
/// platform-specific adapter outside this crate's scope.
#[async_trait::async_trait]
pub trait GuiPump: Send + Sync {
    /// Process pending toolkit events for one tick. Returns `false` once
    /// the window has been closed by the user.
    async fn pump_once(&self) -> bool;

    /// Refresh the preview surface (level meter, camera frame, ...).
    async fn update_preview(&self);
}

/// Read stdin line-by-line and dispatch each line, blocking the reader
/// task (not the dispatch loop) on each `readline`, so the loop stays idle
/// with no busy polling when no input arrives.
pub async fn run_slave(handlers: &dyn ModuleHandlers, sys: &System) {
    let (tx, mut rx) = mpsc::channel::<String>(SLAVE_QUEUE_CAPACITY);

    let reader_shutdown = sys.shutdown.clone();
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = reader_shutdown.cancelled() => break,
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(_) => break,
                },
            }
        }
    });

    loop {
        tokio::select! {
            _ = sys.shutdown.cancelled() => break,
            line = rx.recv() => match line {
                Some(line) => {
                    if Dispatcher::dispatch_line(handlers, sys, &line).await == DispatchOutcome::Stop {
                        break;
                    }
                }
                None => break, // stdin closed (EOF) and channel drained
            },
        }
    }
    reader.abort();
}

/// Auto-start a recording if configured, then idle until shutdown.
pub async fn run_headless(handlers: &dyn ModuleHandlers, sys: &System, auto_start_recording: bool) {
    if auto_start_recording {
        let cmd = daq_protocol::command!("start_recording");
        Dispatcher::dispatch(handlers, sys, &cmd).await;
    }
    sys.shutdown.cancelled().await;
}

/// Drive the GUI pump cooperatively alongside an optional stdin listener
/// (present when launched as a child of the orchestrator) and a preview
/// refresh task at `preview_hz`.
pub async fn run_gui(
    handlers: &dyn ModuleHandlers,
    sys: &System,
    pump: &dyn GuiPump,
    preview_hz: f64,
    stdin_is_pipe: bool,
) {
    const TICK: Duration = Duration::from_millis(10);
    let preview_interval = Duration::from_secs_f64(1.0 / preview_hz.max(0.1));

    let (tx, mut rx) = mpsc::channel::<String>(SLAVE_QUEUE_CAPACITY);
    let stdin_task = if stdin_is_pipe {
        let reader_shutdown = sys.shutdown.clone();
        Some(tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                tokio::select! {
                    _ = reader_shutdown.cancelled() => break,
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            if tx.send(line).await.is_err() {
                                break;
                            }
                        }
                        _ => break,
                    },
                }
            }
        }))
    } else {
        None
    };

    let mut tick = tokio::time::interval(TICK);
    let mut last_preview = tokio::time::Instant::now();

    loop {
        tokio::select! {
            _ = sys.shutdown.cancelled() => break,
            _ = tick.tick() => {
                if !pump.pump_once().await {
                    sys.request_shutdown();
                    break;
                }
                if last_preview.elapsed() >= preview_interval {
                    pump.update_preview().await;
                    last_preview = tokio::time::Instant::now();
                }
            }
            line = rx.recv(), if stdin_is_pipe => match line {
                Some(line) => {
                    if Dispatcher::dispatch_line(handlers, sys, &line).await == DispatchOutcome::Stop {
                        break;
                    }
                }
                None => {}
            },
        }
    }
    if let Some(task) = stdin_task {
        task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::ModuleHandlers;
    use daq_core::ConfigFile;
    use daq_protocol::{Command, StatusWriter};
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct NoopHandlers;
    #[async_trait::async_trait]
    impl ModuleHandlers for NoopHandlers {
        async fn start_recording(&self, _sys: &System, _cmd: &Command) -> Result<Value, crate::error::RuntimeError> {
            Ok(Value::Null)
        }
        async fn stop_recording(&self, _sys: &System, _cmd: &Command) -> Result<Value, crate::error::RuntimeError> {
            Ok(Value::Null)
        }
        async fn status_snapshot(&self, _sys: &System) -> Value {
            Value::Null
        }
    }

    #[tokio::test]
    async fn headless_auto_start_sets_recording_then_idles_until_shutdown() {
        let sys = System::new(ConfigFile::default(), StatusWriter::new(Vec::new()));
        let handlers = NoopHandlers;
        sys.request_shutdown(); // pre-cancel so run_headless returns immediately
        run_headless(&handlers, &sys, true).await;
        assert!(sys.is_recording());
    }

    struct CountingPump {
        ticks: std::sync::atomic::AtomicUsize,
        alive: AtomicBool,
    }

    #[async_trait::async_trait]
    impl GuiPump for CountingPump {
        async fn pump_once(&self) -> bool {
            let n = self.ticks.fetch_add(1, Ordering::SeqCst);
            if n >= 2 {
                self.alive.store(false, Ordering::SeqCst);
            }
            self.alive.load(Ordering::SeqCst)
        }
        async fn update_preview(&self) {}
    }

    #[tokio::test]
    async fn gui_loop_exits_when_window_closes() {
        let sys = System::new(ConfigFile::default(), StatusWriter::new(Vec::new()));
        let handlers = NoopHandlers;
        let pump = CountingPump { ticks: std::sync::atomic::AtomicUsize::new(0), alive: AtomicBool::new(true) };
        run_gui(&handlers, &sys, &pump, 10.0, false).await;
        assert!(sys.is_shutting_down());
    }

    #[tokio::test]
    async fn slave_mode_dispatches_until_quit() {
        // Exercised indirectly via Dispatcher tests; stdin plumbing itself
        // requires process-level stdin which isn't available under `cargo
        // test`, so this case focuses on the shutdown-triggered exit path.
        let sys = Arc::new(System::new(ConfigFile::default(), StatusWriter::new(Vec::new())));
        sys.request_shutdown();
        let handlers = NoopHandlers;
        run_slave(&handlers, &sys).await;
        assert!(sys.is_shutting_down());
    }
}
