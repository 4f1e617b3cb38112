//! Boundary behaviors around session/trial/module lifecycle errors.

use crate::prelude::*;

#[test]
fn starting_a_session_twice_is_rejected() {
    let daemon = Daemon::start();
    daemon.ctl().args(&["session", "start"]).passes();
    let second = daemon.ctl().args(&["session", "start"]).run();
    assert_ne!(second.code(), Some(0), "starting a second session should fail");
}

#[test]
fn unknown_module_name_is_a_client_error() {
    let daemon = Daemon::start();
    let result = daemon.ctl().args(&["module", "show", "NotARealModule"]).run();
    assert_ne!(result.code(), Some(0));
    assert!(
        result.stderr().contains("no such module") || result.stderr().contains("NotARealModule"),
        "stderr: {}",
        result.stderr()
    );
}

#[test]
fn stopping_a_trial_with_none_active_is_rejected() {
    let daemon = Daemon::start();
    daemon.ctl().args(&["session", "start"]).passes();
    let result = daemon.ctl().args(&["trial", "stop"]).run();
    assert_ne!(result.code(), Some(0), "stopping a trial with none active should fail");
}

#[test]
fn starting_a_trial_without_a_session_is_rejected() {
    let daemon = Daemon::start();
    let result = daemon.ctl().args(&["trial", "start"]).run();
    assert_ne!(result.code(), Some(0), "starting a trial with no active session should fail");
}

#[test]
fn session_show_reports_inactive_with_no_session() {
    let daemon = Daemon::start();
    let result = daemon.ctl().args(&["session", "show"]).json().passes().json();
    assert_eq!(result["active"].as_bool(), Some(false));
}

