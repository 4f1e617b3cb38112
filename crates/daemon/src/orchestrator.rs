// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! The orchestrator core: session/trial lifecycle, module fan-out, the
//! device registry, and window geometry bookkeeping. One instance per
//! daemon process, wrapped in a `tokio::sync::Mutex` and shared with the
//! REST layer as [`SharedOrchestrator`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use daq_core::device::DeviceInterface;
use daq_core::module::{ModuleDescriptor, ModuleState, WindowGeometry};
use daq_core::{Clock, Device, DeviceId, Event, Session};
use daq_discovery::{DeviceRegistry, RegistryEvent};
use daq_protocol::{command, Command, Status};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::config::DaemonConfig;
use crate::process::{ModuleProcess, ProcessError};

pub type SharedOrchestrator<C> = Arc<Mutex<Orchestrator<C>>>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no such module: {0}")]
    UnknownModule(String),
    #[error("no such device: {0}")]
    UnknownDevice(String),
    #[error("device {0} is not a wireless device")]
    NotWireless(String),
    #[error("a session is already active")]
    SessionAlreadyActive,
    #[error("no session is active")]
    NoActiveSession,
    #[error("a trial is already active")]
    TrialAlreadyActive,
    #[error("no trial is active")]
    NoActiveTrial,
    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Outcome of a trial-wide fan-out: which modules acknowledged, which
/// timed out or errored. `success` is true only if every enabled, live
/// module acknowledged (resolved Open Question: partial success is
/// surfaced, not silently swallowed, and never reported as full success).
#[derive(Debug, Clone, serde::Serialize)]
pub struct TrialOutcome {
    pub trial_number: u32,
    pub trial_label: String,
    pub acknowledged: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub success: bool,
}

/// A rectangular arrangement request for the windowed modules.
#[derive(Debug, Clone, Copy)]
pub enum WindowLayout {
    Grid,
    Cascade,
    TileHorizontal,
    TileVertical,
}

pub struct Orchestrator<C: Clock> {
    config: DaemonConfig,
    descriptors: HashMap<String, ModuleDescriptor>,
    modules: HashMap<String, ModuleProcess>,
    registry: DeviceRegistry,
    session: Option<Session>,
    event_tx: mpsc::Sender<Event>,
    clock: C,
}

impl<C: Clock> Orchestrator<C> {
    pub fn new(
        config: DaemonConfig,
        descriptors: Vec<ModuleDescriptor>,
        clock: C,
    ) -> (Self, mpsc::Receiver<Event>) {
        let (event_tx, event_rx) = mpsc::channel(1024);
        let descriptors = descriptors.into_iter().map(|d| (d.name.clone(), d)).collect();
        let orchestrator = Self {
            config,
            descriptors,
            modules: HashMap::new(),
            registry: DeviceRegistry::new(),
            session: None,
            event_tx,
            clock,
        };
        (orchestrator, event_rx)
    }

    pub fn event_sender(&self) -> mpsc::Sender<Event> {
        self.event_tx.clone()
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DaemonConfig {
        &mut self.config
    }

    pub fn descriptor(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.descriptors.get(name)
    }

    // ---- module lifecycle -------------------------------------------------

    pub fn list_modules(&self) -> Vec<(&str, ModuleState)> {
        self.descriptors
            .keys()
            .map(|name| {
                let state = self.modules.get(name).map(|m| m.state()).unwrap_or(ModuleState::Stopped);
                (name.as_str(), state)
            })
            .collect()
    }

    pub fn module_state(&self, name: &str) -> Option<ModuleState> {
        self.modules.get(name).map(|m| m.state())
    }

    pub async fn start_module(&mut self, name: &str) -> Result<(), OrchestratorError> {
        let descriptor = self
            .descriptors
            .get(name)
            .cloned()
            .ok_or_else(|| OrchestratorError::UnknownModule(name.to_string()))?;

        let entry = self.modules.entry(name.to_string()).or_insert_with(|| ModuleProcess::new(descriptor));
        if entry.state() == ModuleState::Crashed {
            entry.acknowledge_crash();
        }

        let session_dir = self.session.as_ref().filter(|s| s.active).map(|s| s.session_dir.clone());
        let geometry = entry.last_geometry();
        let log_path = self.config.log_dir.join(format!("{name}.log"));
        entry
            .spawn(session_dir.as_ref(), geometry, &log_path, self.config.init_timeout, self.event_tx.clone())
            .await?;
        info!(module = name, "module started");
        Ok(())
    }

    pub async fn stop_module(&mut self, name: &str) -> Result<(), OrchestratorError> {
        let process = self.modules.get_mut(name).ok_or_else(|| OrchestratorError::UnknownModule(name.to_string()))?;
        if process.state() == ModuleState::Crashed {
            process.acknowledge_crash();
            return Ok(());
        }
        process.stop(self.config.trial_stop_timeout).await?;
        Ok(())
    }

    /// Send a command to a running module and wait for its matching status
    /// (or an `error`), used by the REST layer's per-module extension
    /// queries to read back real device state instead of a stub.
    pub async fn query_module(&self, name: &str, cmd: &Command, expected: &str, timeout: Duration) -> Result<Status, OrchestratorError> {
        let process = self.modules.get(name).ok_or_else(|| OrchestratorError::UnknownModule(name.to_string()))?;
        Ok(process.send_and_await(cmd, expected, timeout).await?)
    }

    // ---- session/trial lifecycle -------------------------------------------

    pub fn start_session(&mut self, explicit_dir: Option<PathBuf>) -> Result<&Session, OrchestratorError> {
        if self.session.as_ref().is_some_and(|s| s.active) {
            return Err(OrchestratorError::SessionAlreadyActive);
        }
        let unix_time = self.clock.unix_time();
        let session = Session::start(&self.config.data_dir, &self.config.session_prefix, unix_time, explicit_dir);
        std::fs::create_dir_all(&session.session_dir).ok();
        Ok(self.session.insert(session))
    }

    pub fn stop_session(&mut self) -> Result<(), OrchestratorError> {
        let session = self.session.as_mut().ok_or(OrchestratorError::NoActiveSession)?;
        if !session.active {
            return Err(OrchestratorError::NoActiveSession);
        }
        session.reset_for_stop();
        Ok(())
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref().filter(|s| s.active)
    }

    /// Fan `start_recording` out to every live module, waiting up to
    /// `trial_start_timeout` per module. Best-effort: a module that fails
    /// or times out is recorded in `failed`, not treated as a hard error,
    /// but `success` is false whenever any module failed to ack.
    pub async fn start_trial(&mut self, label: Option<String>) -> Result<TrialOutcome, OrchestratorError> {
        let session = self.session.as_mut().ok_or(OrchestratorError::NoActiveSession)?;
        if !session.active {
            return Err(OrchestratorError::NoActiveSession);
        }
        if session.trial_active {
            return Err(OrchestratorError::TrialAlreadyActive);
        }
        let trial_number = session.begin_trial(label);
        let trial_label = session.trial_label.clone();
        let session_dir = session.session_dir.clone();
        let timeout = self.config.trial_start_timeout;

        let mut acknowledged = Vec::new();
        let mut failed = Vec::new();
        for (name, process) in self.modules.iter() {
            if process.state() != ModuleState::Ready {
                continue;
            }
            let cmd = command!(
                "start_recording",
                "trial_number" => trial_number,
                "trial_label" => trial_label.clone(),
                "session_dir" => session_dir.to_string_lossy().to_string(),
            );
            match process.send_and_await(&cmd, "recording_started", timeout).await {
                Ok(status) if !status.is_error() => acknowledged.push(name.clone()),
                Ok(status) => failed.push((name.clone(), status.error_message().unwrap_or("unknown error").to_string())),
                Err(e) => failed.push((name.clone(), e.to_string())),
            }
        }
        for name in &acknowledged {
            if let Some(p) = self.modules.get_mut(name) {
                p.set_recording(true);
            }
        }
        if !failed.is_empty() {
            warn!(trial = trial_number, ?failed, "some modules failed to start recording");
        }
        Ok(TrialOutcome { trial_number, trial_label, success: failed.is_empty(), acknowledged, failed })
    }

    pub async fn stop_trial(&mut self) -> Result<TrialOutcome, OrchestratorError> {
        let session = self.session.as_mut().ok_or(OrchestratorError::NoActiveSession)?;
        if !session.trial_active {
            return Err(OrchestratorError::NoActiveTrial);
        }
        let trial_number = session.trial_counter;
        let trial_label = session.trial_label.clone();
        let timeout = self.config.trial_stop_timeout;

        let mut acknowledged = Vec::new();
        let mut failed = Vec::new();
        for (name, process) in self.modules.iter() {
            if process.state() != ModuleState::Recording {
                continue;
            }
            let cmd = command!("stop_recording");
            match process.send_and_await(&cmd, "recording_stopped", timeout).await {
                Ok(status) if !status.is_error() => acknowledged.push(name.clone()),
                Ok(status) => failed.push((name.clone(), status.error_message().unwrap_or("unknown error").to_string())),
                Err(e) => failed.push((name.clone(), e.to_string())),
            }
        }
        for name in &acknowledged {
            if let Some(p) = self.modules.get_mut(name) {
                p.set_recording(false);
            }
        }
        if let Some(session) = self.session.as_mut() {
            session.end_trial();
        }
        if !failed.is_empty() {
            warn!(trial = trial_number, ?failed, "some modules failed to stop recording cleanly");
        }
        Ok(TrialOutcome { trial_number, trial_label, success: failed.is_empty(), acknowledged, failed })
    }

    // ---- device registry ----------------------------------------------------

    pub fn devices(&self) -> Vec<&Device> {
        self.registry.all().collect()
    }

    pub fn device(&self, id: &DeviceId) -> Option<&Device> {
        self.registry.get(id)
    }

    pub fn apply_sweep(&mut self, sighted: Vec<Device>, interface: DeviceInterface) -> Vec<RegistryEvent> {
        self.registry.apply_sweep(sighted, interface)
    }

    /// Connect a discovered (possibly wireless) device to its owning
    /// module. Wireless-only operations (e.g. XBee pairing) reject wired
    /// devices with [`OrchestratorError::NotWireless`].
    pub fn begin_connecting(&mut self, id: &DeviceId, require_wireless: bool) -> Result<(), OrchestratorError> {
        let device = self.registry.get(id).ok_or_else(|| OrchestratorError::UnknownDevice(id.as_str().to_string()))?;
        if require_wireless && !device.is_wireless() {
            return Err(OrchestratorError::NotWireless(id.as_str().to_string()));
        }
        self.registry.begin_connecting(id);
        Ok(())
    }

    pub fn mark_connected(&mut self, id: &DeviceId) {
        self.registry.mark_connected(id);
    }

    pub fn mark_disconnected(&mut self, id: &DeviceId) {
        self.registry.mark_disconnected(id);
    }

    // ---- event folding --------------------------------------------------

    /// Fold one event from the shared event bus into orchestrator state.
    /// Run from a background task pumping the channel returned by
    /// [`Orchestrator::new`].
    pub fn apply_event(&mut self, event: Event) {
        match event {
            Event::GeometryChanged { module_name, geometry } => {
                if let Some(p) = self.modules.get_mut(&module_name) {
                    p.record_geometry(geometry);
                }
            }
            Event::ModuleExited { module_name, graceful } => {
                if !graceful {
                    warn!(module = %module_name, "module process exited unexpectedly");
                }
            }
            Event::ModuleStatus { .. } | Event::DeviceDiscovered(_) | Event::DeviceRemoved { .. } => {}
        }
    }

    // ---- window geometry -------------------------------------------------

    pub fn geometry_cache(&self) -> HashMap<String, WindowGeometry> {
        self.modules
            .iter()
            .filter_map(|(name, p)| p.last_geometry().map(|g| (name.clone(), g)))
            .collect()
    }

    /// Compute and push a bulk window arrangement to every live, GUI-bearing
    /// module, over a `screen_width x screen_height` virtual canvas.
    pub async fn arrange_windows(&mut self, layout: WindowLayout, screen_width: u32, screen_height: u32) -> Vec<(String, Result<(), OrchestratorError>)> {
        let live: Vec<String> = self
            .modules
            .iter()
            .filter(|(name, p)| p.state() != ModuleState::Stopped && self.descriptors.get(*name).map(|d| d.has_gui).unwrap_or(false))
            .map(|(name, _)| name.clone())
            .collect();
        let geometries = compute_layout(layout, live.len(), screen_width, screen_height);

        let mut results = Vec::new();
        for (name, geometry) in live.into_iter().zip(geometries) {
            let process = match self.modules.get(&name) {
                Some(p) => p,
                None => continue,
            };
            let cmd = command!(
                "set_window_geometry",
                "width" => geometry.width,
                "height" => geometry.height,
                "x" => geometry.x,
                "y" => geometry.y,
            );
            let result = process.send(&cmd).await.map_err(OrchestratorError::from);
            if result.is_ok() {
                if let Some(p) = self.modules.get_mut(&name) {
                    p.record_geometry(geometry);
                }
            }
            results.push((name, result));
        }
        results
    }
}

fn compute_layout(layout: WindowLayout, count: usize, screen_width: u32, screen_height: u32) -> Vec<WindowGeometry> {
    if count == 0 {
        return Vec::new();
    }
    match layout {
        WindowLayout::Grid => {
            let cols = (count as f64).sqrt().ceil() as u32;
            let rows = (count as u32).div_ceil(cols.max(1));
            let cell_w = screen_width / cols.max(1);
            let cell_h = screen_height / rows.max(1);
            (0..count)
                .map(|i| {
                    let col = i as u32 % cols;
                    let row = i as u32 / cols;
                    WindowGeometry { width: cell_w, height: cell_h, x: (col * cell_w) as i32, y: (row * cell_h) as i32 }
                })
                .collect()
        }
        WindowLayout::Cascade => {
            let step = 32i32;
            let w = (screen_width * 2 / 3).max(200);
            let h = (screen_height * 2 / 3).max(150);
            (0..count).map(|i| WindowGeometry { width: w, height: h, x: i as i32 * step, y: i as i32 * step }).collect()
        }
        WindowLayout::TileHorizontal => {
            let w = screen_width / count as u32;
            (0..count).map(|i| WindowGeometry { width: w, height: screen_height, x: (i as u32 * w) as i32, y: 0 }).collect()
        }
        WindowLayout::TileVertical => {
            let h = screen_height / count as u32;
            (0..count).map(|i| WindowGeometry { width: screen_width, height: h, x: 0, y: (i as u32 * h) as i32 }).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_layout_covers_every_window_without_overlap_in_distinct_cells() {
        let geoms = compute_layout(WindowLayout::Grid, 4, 1000, 1000);
        assert_eq!(geoms.len(), 4);
        let mut xs: Vec<i32> = geoms.iter().map(|g| g.x).collect();
        xs.sort();
        xs.dedup();
        assert!(xs.len() >= 2, "grid of 4 should span at least 2 distinct columns");
    }

    #[test]
    fn tile_horizontal_splits_full_width_evenly() {
        let geoms = compute_layout(WindowLayout::TileHorizontal, 2, 1000, 500);
        assert_eq!(geoms.len(), 2);
        assert_eq!(geoms[0].x, 0);
        assert_eq!(geoms[1].x, 500);
        assert_eq!(geoms[0].height, 500);
    }

    #[test]
    fn empty_module_set_yields_no_geometries() {
        assert!(compute_layout(WindowLayout::Grid, 0, 800, 600).is_empty());
    }
}
