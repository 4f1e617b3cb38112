//! Shared harness for black-box specifications.
//!
//! Every test here launches real child processes (`daqd`, `daqctl`, or a
//! module binary directly) and asserts on what they print or write to
//! disk, never on their internals.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::Duration;

pub const WAIT_POLL_MS: u64 = 20;
pub const WAIT_MAX_MS: u64 = 5000;

/// Resolves a workspace binary, falling back to the test binary's own
/// directory when `CARGO_MANIFEST_DIR` points at a stale build.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }
    standard
}

pub fn daqd_binary() -> PathBuf {
    binary_path("daqd")
}

pub fn daqctl_binary() -> PathBuf {
    binary_path("daqctl")
}

pub fn module_binary(module: &str) -> PathBuf {
    binary_path(&format!("daq-{module}"))
}

/// Binds an ephemeral port, then releases it so `daqd` can bind it itself.
/// Leaves a small race against other processes on the machine, same
/// tradeoff any test harness picking a free TCP port accepts.
fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local_addr").port()
}

pub fn wait_for<F: FnMut() -> bool>(timeout_ms: u64, mut condition: F) -> bool {
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(WAIT_POLL_MS));
    }
    false
}

/// Fluent builder for one `daqctl` invocation against a fixed base URL.
pub struct CliBuilder {
    url: String,
    args: Vec<String>,
}

impl CliBuilder {
    fn new(url: &str) -> Self {
        Self { url: url.to_string(), args: Vec::new() }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Request `--format json` so the result can be parsed back out.
    pub fn json(mut self) -> Self {
        self.args.push("--format".into());
        self.args.push("json".into());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(daqctl_binary());
        cmd.arg("--url").arg(&self.url);
        cmd.args(&self.args);
        cmd
    }

    pub fn run(self) -> RunAssert {
        let output = self.command().output().expect("daqctl should run");
        RunAssert { output }
    }

    pub fn passes(self) -> RunAssert {
        let assert = self.run();
        assert!(
            assert.output.status.success(),
            "expected daqctl to succeed\nstdout: {}\nstderr: {}",
            assert.stdout(),
            assert.stderr()
        );
        assert
    }

    pub fn fails(self) -> RunAssert {
        let assert = self.run();
        assert!(
            !assert.output.status.success(),
            "expected daqctl to fail, but it passed\nstdout: {}",
            assert.stdout()
        );
        assert
    }
}

/// Result of one `daqctl` run, for fluent assertions.
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    /// Parse stdout as the single JSON value a `--format json` run prints.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(self.stdout().trim()).expect("daqctl --format json should print one JSON value")
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        assert!(self.stdout().contains(expected), "stdout does not contain '{expected}'\nstdout: {}", self.stdout());
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        assert!(self.stderr().contains(expected), "stderr does not contain '{expected}'\nstderr: {}", self.stderr());
        self
    }
}

/// A `daqd` instance bound to an isolated state/data directory and an
/// OS-assigned port, stopped (or killed) on drop.
pub struct Daemon {
    child: Option<Child>,
    url: String,
    state_dir: tempfile::TempDir,
    data_dir: tempfile::TempDir,
}

impl Daemon {
    /// Spawn `daqd` and block until its REST API answers a status request.
    pub fn start() -> Self {
        Self::start_with_config(None)
    }

    /// Like [`Self::start`], but pointed at an on-disk `--config` file, for
    /// tests exercising config-reload behavior.
    pub fn start_with_config(config_path: Option<&Path>) -> Self {
        let state_dir = tempfile::tempdir().expect("tempdir");
        let data_dir = tempfile::tempdir().expect("tempdir");
        let port = free_port();
        let url = format!("http://127.0.0.1:{port}");

        let mut cmd = Command::new(daqd_binary());
        cmd.arg("--port").arg(port.to_string()).arg("--data-dir").arg(data_dir.path());
        if let Some(path) = config_path {
            cmd.arg("--config").arg(path);
        }
        let child = cmd
            .env("DAQ_STATE_DIR", state_dir.path())
            .env("RUST_LOG", "error")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .expect("daqd should spawn");

        let daemon = Self { child: Some(child), url, state_dir, data_dir };

        assert!(
            wait_for(WAIT_MAX_MS, || std::net::TcpStream::connect(format!("127.0.0.1:{port}")).is_ok()),
            "daqd never opened its listening socket"
        );
        assert!(
            wait_for(WAIT_MAX_MS, || daemon.ctl().args(&["status"]).run().code() == Some(0)),
            "daqd never answered a status request"
        );
        daemon
    }

    /// Base URL of the REST API, for tests that reach routes `daqctl` has
    /// no subcommand for yet.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn data_dir(&self) -> &Path {
        self.data_dir.path()
    }

    pub fn state_dir(&self) -> &Path {
        self.state_dir.path()
    }

    /// Build a `daqctl` invocation targeting this daemon.
    pub fn ctl(&self) -> CliBuilder {
        CliBuilder::new(&self.url)
    }

    pub fn pid(&self) -> u32 {
        self.child.as_ref().expect("daemon still running").id()
    }

    /// Send SIGTERM, the only thing that actually triggers the daemon's
    /// graceful-shutdown path (the `/shutdown` route only acknowledges).
    pub fn terminate(&self) {
        let _ = Command::new("kill").arg("-TERM").arg(self.pid().to_string()).status();
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.ctl().args(&["shutdown"]).run();
        if let Some(mut child) = self.child.take() {
            let exited = wait_for(1000, || matches!(child.try_wait(), Ok(Some(_))));
            if !exited {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

/// Reads a named column out of a CSV artifact, in row order.
pub fn read_csv_column(path: &Path, column: &str) -> Vec<String> {
    let mut reader = csv::Reader::from_path(path).unwrap_or_else(|e| panic!("reading {}: {e}", path.display()));
    let headers = reader.headers().expect("csv headers").clone();
    let index = headers.iter().position(|h| h == column).unwrap_or_else(|| panic!("no '{column}' column in {}", path.display()));
    reader
        .records()
        .map(|record| record.expect("csv record").get(index).unwrap_or_default().to_string())
        .collect()
}
