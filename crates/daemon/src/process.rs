// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Module-process handle: the master-side object that owns one child
//! OS process embodying a sensor module, plus its stdio streams.
//!
//! State machine:
//!
//! ```text
//! Idle --enable--> Ready --start--> Spawning --"initialized"--> Running
//!                                      |
//!                                      +-- timeout/crash before init --> Crashed
//! ```
//!
//! A single writer task serialises commands onto the child's stdin so
//! concurrent callers never interleave partial lines; a single reader task
//! parses child stdout line-by-line into [`Status`] messages, updates the
//! cached instance state, and forwards interesting events to the
//! orchestrator's event channel.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use daq_core::module::{ModuleDescriptor, ModuleInstance, ModuleState, WindowGeometry};
use daq_core::Event;
use daq_protocol::status::well_known;
use daq_protocol::{Command, Status};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::{broadcast, mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("module is already running")]
    AlreadyRunning,
    #[error("module is not running")]
    NotRunning,
    #[error("failed to spawn child: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("child did not report 'initialized' within {0:?}")]
    InitTimeout(Duration),
    #[error("child exited before reporting 'initialized'")]
    ExitedBeforeInit,
    #[error("protocol error: {0}")]
    Protocol(#[from] daq_protocol::ProtocolError),
    #[error("command timed out waiting for a matching status")]
    CommandTimeout,
}

/// A live module-process handle. Exactly one per enabled module at a time.
pub struct ModuleProcess {
    descriptor: ModuleDescriptor,
    state: ModuleState,
    instance: Option<ModuleInstance>,
    /// Signals the exit-waiter task (which owns the actual `Child`) to
    /// `start_kill()` it. The task, not `stop()`, holds the `Child`, since
    /// `Child::wait`/`start_kill` both need `&mut self` and the waiter is
    /// already mid-`wait()` when a forced kill is needed.
    kill: Option<CancellationToken>,
    stdin: Option<Arc<AsyncMutex<ChildStdin>>>,
    status_tx: broadcast::Sender<Status>,
    reader_task: Option<tokio::task::JoinHandle<()>>,
    waiter_task: Option<tokio::task::JoinHandle<()>>,
    last_geometry: Option<WindowGeometry>,
}

impl ModuleProcess {
    pub fn new(descriptor: ModuleDescriptor) -> Self {
        let (status_tx, _rx) = broadcast::channel(256);
        Self {
            descriptor,
            state: ModuleState::Stopped,
            instance: None,
            kill: None,
            stdin: None,
            status_tx,
            reader_task: None,
            waiter_task: None,
            last_geometry: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn instance(&self) -> Option<&ModuleInstance> {
        self.instance.as_ref()
    }

    pub fn last_geometry(&self) -> Option<WindowGeometry> {
        self.last_geometry
    }

    /// Spawn the configured entry point. `session_dir` is forwarded as an
    /// argument when a session is already active at start time, since
    /// starting a module mid-session should pick up the current directory
    /// without a separate call; `remembered_geometry` is the last
    /// `geometry_changed` this module reported, sent back so the window
    /// reopens where the operator left it.
    pub async fn spawn(
        &mut self,
        session_dir: Option<&PathBuf>,
        remembered_geometry: Option<WindowGeometry>,
        log_path: &PathBuf,
        init_timeout: Duration,
        event_tx: mpsc::Sender<Event>,
    ) -> Result<(), ProcessError> {
        if matches!(self.state, ModuleState::Starting | ModuleState::Initialising | ModuleState::Ready | ModuleState::Recording) {
            return Err(ProcessError::AlreadyRunning);
        }

        let mut command = tokio::process::Command::new(&self.descriptor.entry_point);
        command.args(&self.descriptor.entry_args);
        command.arg("--config").arg(&self.descriptor.config_path);
        if let Some(dir) = session_dir {
            command.arg("--session-dir").arg(dir);
        }
        if let Some(g) = remembered_geometry {
            command.arg("--geometry").arg(format!("{}x{}+{}+{}", g.width, g.height, g.x, g.y));
        }
        let log_file = std::fs::File::create(log_path)?;
        command.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::from(log_file));

        let mut child = command.spawn()?;
        let pid = child.id();
        let stdin = child.stdin.take().ok_or_else(|| ProcessError::Spawn(std::io::Error::other("child spawned without a piped stdin")))?;
        let stdout = child.stdout.take().ok_or_else(|| ProcessError::Spawn(std::io::Error::other("child spawned without a piped stdout")))?;
        self.stdin = Some(Arc::new(AsyncMutex::new(stdin)));

        let mut instance = ModuleInstance::new(self.descriptor.name.clone());
        instance.pid = pid;
        instance.session_dir = session_dir.cloned();
        instance.state = ModuleState::Initialising;
        self.instance = Some(instance);
        self.state = ModuleState::Initialising;

        let status_tx = self.status_tx.clone();
        let module_name = self.descriptor.name.clone();
        let mut rx_for_init = status_tx.subscribe();
        self.reader_task = Some(tokio::spawn(run_reader(stdout, status_tx, module_name.clone(), event_tx.clone())));

        let init_result = tokio::time::timeout(init_timeout, async {
            loop {
                match rx_for_init.recv().await {
                    Ok(status) if status.status == well_known::INITIALIZED => return Ok(()),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return Err(ProcessError::ExitedBeforeInit),
                }
            }
        })
        .await;

        let kill = CancellationToken::new();
        self.kill = Some(kill.clone());
        self.waiter_task = Some(tokio::spawn(run_exit_waiter(child, event_tx, module_name, kill)));

        match init_result {
            Ok(Ok(())) => {
                self.state = ModuleState::Ready;
                if let Some(i) = &mut self.instance {
                    i.state = ModuleState::Ready;
                }
                Ok(())
            }
            Ok(Err(e)) => {
                self.state = ModuleState::Crashed;
                if let Some(i) = &mut self.instance {
                    i.state = ModuleState::Crashed;
                }
                Err(e)
            }
            Err(_elapsed) => {
                self.state = ModuleState::Crashed;
                if let Some(i) = &mut self.instance {
                    i.state = ModuleState::Crashed;
                }
                Err(ProcessError::InitTimeout(init_timeout))
            }
        }
    }

    /// Serialise a command onto the child's stdin. A single writer (this
    /// method, always awaited to completion before the next caller can
    /// acquire the lock) prevents interleaved partial lines.
    pub async fn send(&self, cmd: &Command) -> Result<(), ProcessError> {
        let stdin = self.stdin.as_ref().ok_or(ProcessError::NotRunning)?;
        let mut guard = stdin.lock().await;
        guard.write_all(cmd.encode().as_bytes()).await?;
        guard.flush().await?;
        Ok(())
    }

    /// Send a command and wait for the next status of `expected` (or an
    /// `error`), whichever comes first, within `timeout`. There is no
    /// correlation id on the wire, so this subscribes before sending so no
    /// status can be missed in the race.
    pub async fn send_and_await(&self, cmd: &Command, expected: &str, timeout: Duration) -> Result<Status, ProcessError> {
        let mut rx = self.status_tx.subscribe();
        self.send(cmd).await?;
        tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(status) if status.status == expected || status.is_error() => return Ok(status),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return Err(ProcessError::NotRunning),
                }
            }
        })
        .await
        .map_err(|_| ProcessError::CommandTimeout)?
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Status> {
        self.status_tx.subscribe()
    }

    /// Record a status-derived geometry change (called by the orchestrator
    /// as it folds statuses into session state), so the next `spawn` sends
    /// the window back to where the operator left it.
    pub fn record_geometry(&mut self, geometry: WindowGeometry) {
        self.last_geometry = Some(geometry);
        if let Some(i) = &mut self.instance {
            i.window_geometry = Some(geometry);
        }
    }

    pub fn set_recording(&mut self, recording: bool) {
        if let Some(i) = &mut self.instance {
            i.state = if recording { ModuleState::Recording } else { ModuleState::Ready };
        }
        self.state = if recording { ModuleState::Recording } else { ModuleState::Ready };
    }

    /// Stop: send `quit`, wait up to `budget` for graceful exit, else
    /// signal the exit-waiter to `start_kill()` the child.
    pub async fn stop(&mut self, budget: Duration) -> Result<(), ProcessError> {
        if self.stdin.is_some() {
            let _ = self.send(&daq_protocol::command!("quit")).await;
        }
        if let Some(waiter) = self.waiter_task.take() {
            if tokio::time::timeout(budget, waiter).await.is_err() {
                if let Some(kill) = self.kill.take() {
                    kill.cancel();
                }
            }
        }
        self.kill = None;
        if let Some(reader) = self.reader_task.take() {
            reader.abort();
        }
        self.stdin = None;
        self.state = ModuleState::Stopped;
        if let Some(i) = &mut self.instance {
            i.state = ModuleState::Stopped;
        }
        Ok(())
    }

    /// Operator acknowledges a crashed instance (`stop_module` on a
    /// crashed module), freeing the name for a new `start_module`.
    pub fn acknowledge_crash(&mut self) {
        if self.state == ModuleState::Crashed {
            self.state = ModuleState::Stopped;
            self.instance = None;
        }
    }
}

async fn run_reader(
    stdout: tokio::process::ChildStdout,
    status_tx: broadcast::Sender<Status>,
    module_name: String,
    event_tx: mpsc::Sender<Event>,
) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match Status::parse(&line) {
                Ok(status) => {
                    if status.status == well_known::GEOMETRY_CHANGED {
                        if let (Some(w), Some(h), Some(x), Some(y)) = (
                            status.data.get("width").and_then(|v| v.as_u64()),
                            status.data.get("height").and_then(|v| v.as_u64()),
                            status.data.get("x").and_then(|v| v.as_i64()),
                            status.data.get("y").and_then(|v| v.as_i64()),
                        ) {
                            let geometry = WindowGeometry { width: w as u32, height: h as u32, x: x as i32, y: y as i32 };
                            let _ = event_tx
                                .send(Event::GeometryChanged { module_name: module_name.clone(), geometry })
                                .await;
                        }
                    }
                    let _ = event_tx
                        .send(Event::ModuleStatus {
                            module_name: module_name.clone(),
                            status: status.status.clone(),
                            data: status.data.clone(),
                        })
                        .await;
                    let _ = status_tx.send(status);
                }
                Err(e) => warn!(module = %module_name, error = %e, "malformed status line from child"),
            },
            Ok(None) => break, // EOF
            Err(e) => {
                warn!(module = %module_name, error = %e, "error reading child stdout");
                break;
            }
        }
    }
}

async fn run_exit_waiter(mut child: Child, event_tx: mpsc::Sender<Event>, module_name: String, kill: CancellationToken) {
    tokio::select! {
        result = child.wait() => report_exit(result, event_tx, module_name).await,
        _ = kill.cancelled() => {
            if let Err(e) = child.start_kill() {
                warn!(module = %module_name, error = %e, "failed to send kill signal to child process");
            }
            let result = child.wait().await;
            report_exit(result, event_tx, module_name).await;
        }
    }
}

async fn report_exit(result: std::io::Result<std::process::ExitStatus>, event_tx: mpsc::Sender<Event>, module_name: String) {
    match result {
        Ok(status) => {
            let graceful = status.success();
            info!(module = %module_name, %status, "child process exited");
            let _ = event_tx.send(Event::ModuleExited { module_name, graceful }).await;
        }
        Err(e) => {
            warn!(module = %module_name, error = %e, "error waiting for child process");
            let _ = event_tx.send(Event::ModuleExited { module_name, graceful: false }).await;
        }
    }
}
