// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! `System`: the per-child-process state every mode and handler shares —
//! configuration, the status sink, the shutdown signal, and the module's
//! own recording flag.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use daq_core::{ConfigFile, WindowGeometry};
use daq_protocol::StatusWriter;
use tokio_util::sync::CancellationToken;

pub struct System {
    pub config: ConfigFile,
    pub status: StatusWriter,
    pub shutdown: CancellationToken,
    recording: AtomicBool,
    session_dir: parking_lot::Mutex<Option<PathBuf>>,
    window_geometry: parking_lot::Mutex<Option<WindowGeometry>>,
}

impl System {
    pub fn new(config: ConfigFile, status: StatusWriter) -> Self {
        Self {
            config,
            status,
            shutdown: CancellationToken::new(),
            recording: AtomicBool::new(false),
            session_dir: parking_lot::Mutex::new(None),
            window_geometry: parking_lot::Mutex::new(None),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    pub fn set_recording(&self, value: bool) {
        self.recording.store(value, Ordering::SeqCst);
    }

    pub fn session_dir(&self) -> Option<PathBuf> {
        self.session_dir.lock().clone()
    }

    /// A command carrying a `session_dir` field updates the module's own
    /// output paths before the handler acts on it.
    pub fn set_session_dir(&self, dir: PathBuf) {
        *self.session_dir.lock() = Some(dir);
    }

    /// The most recently applied window geometry, whether it came from a
    /// `set_window_geometry` command or a toolkit that reports its own
    /// layout via [`crate::dispatcher::ModuleHandlers::geometry_string`].
    pub fn window_geometry(&self) -> Option<WindowGeometry> {
        *self.window_geometry.lock()
    }

    pub fn set_window_geometry(&self, geometry: WindowGeometry) {
        *self.window_geometry.lock() = Some(geometry);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_recording_and_session_dir() {
        let sys = System::new(ConfigFile::default(), StatusWriter::new(Vec::new()));
        assert!(!sys.is_recording());
        sys.set_recording(true);
        assert!(sys.is_recording());

        assert!(sys.session_dir().is_none());
        sys.set_session_dir(PathBuf::from("/data/session_1"));
        assert_eq!(sys.session_dir(), Some(PathBuf::from("/data/session_1")));
    }

    #[test]
    fn window_geometry_starts_unset_and_is_settable() {
        let sys = System::new(ConfigFile::default(), StatusWriter::new(Vec::new()));
        assert!(sys.window_geometry().is_none());
        sys.set_window_geometry(daq_core::WindowGeometry { width: 800, height: 600, x: 100, y: 100 });
        assert_eq!(sys.window_geometry(), Some(daq_core::WindowGeometry { width: 800, height: 600, x: 100, y: 100 }));
    }

    #[test]
    fn shutdown_is_observable() {
        let sys = System::new(ConfigFile::default(), StatusWriter::new(Vec::new()));
        assert!(!sys.is_shutting_down());
        sys.request_shutdown();
        assert!(sys.is_shutting_down());
    }
}
