//! Per-module extension queries: `GET /api/v1/modules/{family}/extension/{key}`
//! should report "not running" before a module is started, and forward a
//! real `get_status` to the module (not a stub null) once it is.

use crate::prelude::*;

fn get(daemon: &Daemon, path: &str) -> serde_json::Value {
    reqwest::blocking::get(format!("{}{path}", daemon.url())).expect("GET should succeed").json().expect("response should be JSON")
}

#[test]
fn unknown_family_is_a_404() {
    let daemon = Daemon::start();
    let response = reqwest::blocking::get(format!("{}/api/v1/modules/not-a-family/extension/whatever", daemon.url())).expect("GET should succeed");
    assert_eq!(response.status().as_u16(), 404);
}

#[test]
fn unknown_key_for_a_known_family_is_a_404() {
    let daemon = Daemon::start();
    let response = reqwest::blocking::get(format!("{}/api/v1/modules/gps/extension/not-a-key", daemon.url())).expect("GET should succeed");
    assert_eq!(response.status().as_u16(), 404);
}

#[test]
fn extension_reports_unavailable_before_the_module_is_started() {
    let daemon = Daemon::start();
    let body = get(&daemon, "/api/v1/modules/gps/extension/fix");
    assert_eq!(body["available"].as_bool(), Some(false));
}

#[test]
fn extension_forwards_to_the_running_module_and_returns_real_state() {
    let daemon = Daemon::start();
    daemon.ctl().args(&["module", "start", "Gps"]).passes();

    let body = get(&daemon, "/api/v1/modules/gps/extension/fix");
    assert_eq!(body["available"].as_bool(), Some(true));
    assert!(body["data"].as_f64().is_some(), "expected a numeric fix rate, got {body}");
}
