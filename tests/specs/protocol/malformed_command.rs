//! Exercises the child-process command protocol directly, bypassing the
//! daemon entirely: a module must survive a truncated/invalid command line
//! by reporting a single `error` status and continuing to serve valid
//! commands afterward.

use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::prelude::*;

struct StatusLines {
    reader: BufReader<std::process::ChildStdout>,
}

impl StatusLines {
    fn next(&mut self) -> serde_json::Value {
        let mut line = String::new();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            line.clear();
            let read = self.reader.read_line(&mut line).expect("read status line");
            assert!(read > 0, "module exited before sending the expected status line");
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(line.trim()) {
                return value;
            }
            assert!(std::time::Instant::now() < deadline, "timed out waiting for a status line, got: {line}");
        }
    }
}

#[test]
fn truncated_command_line_yields_a_single_error_status_and_module_keeps_serving() {
    let config_path = tempfile::NamedTempFile::new().expect("tempfile").into_temp_path();

    let mut child = Command::new(module_binary("notes"))
        .arg("--config")
        .arg(config_path.to_path_buf())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("daq-notes should spawn");

    let mut stdin = child.stdin.take().expect("stdin");
    let stdout = child.stdout.take().expect("stdout");
    let mut lines = StatusLines { reader: BufReader::new(stdout) };

    let initialized = lines.next();
    assert_eq!(initialized["status"].as_str(), Some("initialized"));

    // Not valid JSON at all: a dropped closing brace.
    writeln!(stdin, "{{\"command\": \"get_status\"").expect("write truncated line");

    let error_status = lines.next();
    assert_eq!(error_status["type"].as_str(), Some("status"));
    assert_eq!(error_status["status"].as_str(), Some("error"));

    // The reader loop must still be alive: a well-formed command right
    // after the bad line gets a normal response, not silence.
    writeln!(stdin, "{{\"command\": \"get_status\", \"timestamp\": \"2026-01-01T00:00:00Z\"}}").expect("write get_status");
    let status_report = lines.next();
    assert_eq!(status_report["status"].as_str(), Some("status_report"));

    writeln!(stdin, "{{\"command\": \"quit\", \"timestamp\": \"2026-01-01T00:00:00Z\"}}").expect("write quit");
    let quitting = lines.next();
    assert_eq!(quitting["status"].as_str(), Some("quitting"));

    drop(stdin);
    let exit = child.wait().expect("module should exit after quit");
    assert!(exit.success(), "daq-notes did not exit cleanly after quit");
}
