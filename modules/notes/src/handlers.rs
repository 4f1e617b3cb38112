// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Notes module command handlers. There is no continuous capture here:
//! `start_recording` opens a trial CSV, `add_note` (a custom command)
//! appends one free-text row to it, and `stop_recording` flushes and
//! closes it. Grounded in
//! `examples/original_source/Modules/NoteTaker/notes_core/commands/handler.py`,
//! which reports `note_count` on both `recording_started`/`recording_stopped`
//! and `status_report`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use daq_core::Clock;
use daq_module_runtime::{ModuleHandlers, RuntimeError, System};
use daq_protocol::csv_schema::{NotesRow, StandardPrefix};
use daq_protocol::Command;
use serde_json::{json, Value};

struct RunningRecording {
    writer: csv::Writer<std::fs::File>,
    csv_path: PathBuf,
    trial_number: u32,
    trial_label: String,
}

pub struct NotesModule {
    output_dir: PathBuf,
    started_at: Instant,
    note_count: AtomicU32,
    running: parking_lot::Mutex<Option<RunningRecording>>,
}

impl NotesModule {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir, started_at: Instant::now(), note_count: AtomicU32::new(0), running: parking_lot::Mutex::new(None) }
    }

    fn output_root(&self, sys: &System) -> PathBuf {
        sys.session_dir().unwrap_or_else(|| self.output_dir.clone()).join("Notes")
    }

    /// Flush and close any open trial CSV. Shared by `stop_recording` and
    /// shutdown cleanup.
    pub async fn stop_if_recording(&self) -> Option<Result<Value, RuntimeError>> {
        let mut running = self.running.lock().take()?;
        let result = running.writer.flush().map_err(|e| RuntimeError::Other(format!("flushing notes CSV: {e}")));
        Some(result.map(|_| json!({"file": running.csv_path, "note_count": self.note_count.load(Ordering::SeqCst)})))
    }
}

#[async_trait::async_trait]
impl ModuleHandlers for NotesModule {
    async fn start_recording(&self, sys: &System, cmd: &Command) -> Result<Value, RuntimeError> {
        if self.running.lock().is_some() {
            return Err(RuntimeError::Other("already recording".to_string()));
        }

        let dir = self.output_root(sys);
        std::fs::create_dir_all(&dir).map_err(RuntimeError::Io)?;

        let trial_number = cmd.get_u64("trial_number").unwrap_or(0) as u32;
        let trial_label = cmd.get_str("trial_label").unwrap_or("recording").to_string();
        let csv_path = dir.join(format!("trial_{trial_number:04}_{trial_label}.csv"));

        let writer = csv::Writer::from_path(&csv_path)
            .map_err(|e| RuntimeError::Other(format!("creating notes CSV {}: {e}", csv_path.display())))?;

        self.note_count.store(0, Ordering::SeqCst);
        self.running.lock().replace(RunningRecording { writer, csv_path: csv_path.clone(), trial_number, trial_label });
        Ok(json!({"file": csv_path, "note_count": 0}))
    }

    async fn stop_recording(&self, _sys: &System, _cmd: &Command) -> Result<Value, RuntimeError> {
        match self.stop_if_recording().await {
            Some(result) => result,
            None => Err(RuntimeError::Other("not recording".to_string())),
        }
    }

    async fn status_snapshot(&self, _sys: &System) -> Value {
        let recording = self.running.lock().is_some();
        json!({
            "recording": recording,
            "note_count": self.note_count.load(Ordering::SeqCst),
            "session_elapsed_s": self.started_at.elapsed().as_secs_f64(),
        })
    }

    async fn custom_command(&self, _sys: &System, cmd: &Command) -> Result<Option<Value>, RuntimeError> {
        if cmd.name != "add_note" {
            return Ok(None);
        }
        let text = cmd.get_str("text").unwrap_or("").to_string();
        let author = cmd.get_str("author").unwrap_or("operator").to_string();

        let mut guard = self.running.lock();
        let running = guard.as_mut().ok_or_else(|| RuntimeError::Other("not recording".to_string()))?;

        let record_time_unix = daq_core::SystemClock.unix_time().as_secs_f64();
        let record_time_mono = self.started_at.elapsed().as_secs_f64();
        let row = NotesRow {
            prefix: StandardPrefix {
                trial: running.trial_number,
                module: "Notes".to_string(),
                device_id: "notes-0".to_string(),
                label: running.trial_label.clone(),
                record_time_unix,
                record_time_mono,
            },
            note_text: text,
            author,
        };
        running.writer.serialize(&row).map_err(|e| RuntimeError::Other(format!("writing note: {e}")))?;
        running.writer.flush().map_err(|e| RuntimeError::Other(format!("flushing note: {e}")))?;

        let count = self.note_count.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Some(json!({"note_count": count})))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_core::ConfigFile;
    use daq_protocol::StatusWriter;
    use tempfile::tempdir;

    fn test_system() -> System {
        System::new(ConfigFile::default(), StatusWriter::new(Vec::new()))
    }

    #[tokio::test]
    async fn add_note_appends_a_row_and_increments_count() {
        let dir = tempdir().unwrap();
        let module = NotesModule::new(dir.path().to_path_buf());
        let sys = test_system();

        let start = daq_protocol::command!("start_recording", "trial_number" => 1, "trial_label" => "t1");
        module.start_recording(&sys, &start).await.unwrap();

        let note = daq_protocol::command!("add_note", "text" => "subject blinked, redo", "author" => "operator");
        let result = module.custom_command(&sys, &note).await.unwrap().unwrap();
        assert_eq!(result["note_count"], 1);

        let stop = module.stop_if_recording().await.unwrap().unwrap();
        assert_eq!(stop["note_count"], 1);
    }

    #[tokio::test]
    async fn add_note_without_recording_is_an_error() {
        let dir = tempdir().unwrap();
        let module = NotesModule::new(dir.path().to_path_buf());
        let sys = test_system();
        let note = daq_protocol::command!("add_note", "text" => "x");
        assert!(module.custom_command(&sys, &note).await.is_err());
    }

    #[tokio::test]
    async fn double_start_recording_rejected() {
        let dir = tempdir().unwrap();
        let module = NotesModule::new(dir.path().to_path_buf());
        let sys = test_system();
        let start = daq_protocol::command!("start_recording", "trial_number" => 1, "trial_label" => "t1");
        module.start_recording(&sys, &start).await.unwrap();
        assert!(module.start_recording(&sys, &start).await.is_err());
    }
}
