// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Session state: the monotonically labelled recording container that owns
//! the trial counter and the on-disk directory a session's data lands in.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A monotonically labelled recording container.
///
/// Invariants: exactly one session may be active at a time (enforced by the
/// orchestrator, not by this type); `trial_active => active`; `trial_counter`
/// is append-only until [`Session::reset_for_stop`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub session_label: String,
    pub session_dir: PathBuf,
    pub active: bool,
    pub trial_counter: u32,
    pub trial_active: bool,
    pub trial_label: String,
}

impl Session {
    /// Build a new session rooted at `data_root/<prefix>_<YYYYmmdd_HHMMSS>`,
    /// or at `explicit_dir` when the caller supplied one.
    pub fn start(data_root: &Path, prefix: &str, unix_time: Duration, explicit_dir: Option<PathBuf>) -> Self {
        let label = format!("{}_{}", prefix, format_session_timestamp(unix_time));
        let session_dir = explicit_dir.unwrap_or_else(|| data_root.join(&label));
        Self {
            session_label: label,
            session_dir,
            active: true,
            trial_counter: 0,
            trial_active: false,
            trial_label: String::new(),
        }
    }

    /// Reset counters on `stop_session`.
    pub fn reset_for_stop(&mut self) {
        self.active = false;
        self.trial_active = false;
        self.trial_counter = 0;
        self.trial_label.clear();
    }

    pub fn begin_trial(&mut self, label: Option<String>) -> u32 {
        self.trial_counter += 1;
        self.trial_label = label.filter(|l| !l.is_empty()).unwrap_or_else(|| format!("trial_{}", self.trial_counter));
        self.trial_active = true;
        self.trial_counter
    }

    pub fn end_trial(&mut self) {
        self.trial_active = false;
    }
}

/// Renders `unix_time` as `YYYYmmdd_HHMMSS` in UTC — a sortable,
/// filesystem-safe label. Takes the offset explicitly (rather than calling
/// `chrono::Utc::now()` directly) so callers can drive it from a [`Clock`]
/// for deterministic tests.
///
/// [`Clock`]: crate::clock::Clock
fn format_session_timestamp(unix_time: Duration) -> String {
    let dt = chrono::DateTime::<chrono::Utc>::from_timestamp(unix_time.as_secs() as i64, unix_time.subsec_nanos()).unwrap_or_default();
    dt.format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_builds_default_session_dir() {
        let s = Session::start(Path::new("/data"), "session", Duration::from_secs(1_700_000_000), None);
        assert!(s.active);
        assert_eq!(s.trial_counter, 0);
        assert!(s.session_dir.starts_with("/data"));
        assert!(s.session_label.starts_with("session_"));
    }

    #[test]
    fn explicit_dir_overrides_default() {
        let s = Session::start(
            Path::new("/data"),
            "session",
            Duration::from_secs(0),
            Some(PathBuf::from("/tmp/s1")),
        );
        assert_eq!(s.session_dir, PathBuf::from("/tmp/s1"));
    }

    #[test]
    fn trial_lifecycle_increments_and_resets() {
        let mut s = Session::start(Path::new("/data"), "session", Duration::from_secs(0), None);
        let n1 = s.begin_trial(Some("t1".into()));
        assert_eq!(n1, 1);
        assert!(s.trial_active);
        assert_eq!(s.trial_label, "t1");
        s.end_trial();
        assert!(!s.trial_active);
        let n2 = s.begin_trial(None);
        assert_eq!(n2, 2);
        assert_eq!(s.trial_label, "trial_2");
        s.reset_for_stop();
        assert!(!s.active);
        assert_eq!(s.trial_counter, 0);
    }

    #[test]
    fn format_session_timestamp_matches_known_epoch_offset() {
        // 1_700_000_000 unix seconds is 2023-11-14 22:13:20 UTC.
        assert_eq!(format_session_timestamp(Duration::from_secs(1_700_000_000)), "20231114_221320");
    }
}
