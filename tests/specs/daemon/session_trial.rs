//! End-to-end session/trial lifecycle: start a session, bring up two
//! modules, record two trials, and check the artifacts each module leaves
//! behind carry the right trial numbering.

use std::path::PathBuf;
use std::time::Duration;

use crate::prelude::*;

#[test]
fn two_trial_session_with_audio_and_gps_writes_numbered_artifacts() {
    let daemon = Daemon::start();

    let session = daemon.ctl().args(&["session", "start"]).json().passes().json();
    let session_dir = PathBuf::from(session["session_dir"].as_str().expect("session_dir"));

    daemon.ctl().args(&["module", "start", "Audio"]).passes();
    daemon.ctl().args(&["module", "start", "Gps"]).passes();

    let status = daemon.ctl().args(&["status"]).json().passes().json();
    let modules = status["modules"].as_array().expect("modules array");
    for name in ["Audio", "Gps"] {
        let entry = modules.iter().find(|m| m["name"].as_str() == Some(name)).unwrap_or_else(|| panic!("no {name} entry in status"));
        assert_eq!(entry["state"].as_str(), Some("Ready"));
    }

    run_trial(&daemon, "baseline");
    run_trial(&daemon, "followup");

    daemon.ctl().args(&["session", "stop"]).passes();

    let gps_trial_1 = session_dir.join("Gps/trial_0001_baseline.csv");
    let gps_trial_2 = session_dir.join("Gps/trial_0002_followup.csv");
    assert!(gps_trial_1.exists(), "missing {}", gps_trial_1.display());
    assert!(gps_trial_2.exists(), "missing {}", gps_trial_2.display());

    let audio_trial_1 = session_dir.join("Audio/trial_0001_baseline.wav");
    let audio_trial_2 = session_dir.join("Audio/trial_0002_followup.wav");
    assert!(audio_trial_1.exists(), "missing {}", audio_trial_1.display());
    assert!(audio_trial_2.exists(), "missing {}", audio_trial_2.display());

    let audio_timing_1 = session_dir.join("Audio/trial_0001_baseline_timing.csv");
    assert!(audio_timing_1.exists(), "missing {}", audio_timing_1.display());
}

fn run_trial(daemon: &Daemon, label: &str) {
    let outcome = daemon.ctl().args(&["trial", "start", "--label", label]).json().passes().json();
    assert_eq!(outcome["success"].as_bool(), Some(true), "trial start was not fully acknowledged: {outcome}");

    // Let both modules capture at least a couple of samples.
    std::thread::sleep(Duration::from_millis(1500));

    let outcome = daemon.ctl().args(&["trial", "stop"]).json().passes().json();
    assert_eq!(outcome["success"].as_bool(), Some(true), "trial stop was not fully acknowledged: {outcome}");
}
