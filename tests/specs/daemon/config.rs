//! Runtime configuration routes: `daqctl` has no subcommand for these yet,
//! so these tests talk to the REST API directly with a blocking client.

use crate::prelude::*;

fn get(daemon: &Daemon, path: &str) -> serde_json::Value {
    reqwest::blocking::get(format!("{}{path}", daemon.url())).expect("GET should succeed").json().expect("response should be JSON")
}

fn put(daemon: &Daemon, path: &str, body: serde_json::Value) -> reqwest::blocking::Response {
    reqwest::blocking::Client::new()
        .put(format!("{}{path}", daemon.url()))
        .json(&body)
        .send()
        .expect("PUT should succeed")
}

#[test]
fn get_config_reports_runtime_defaults() {
    let daemon = Daemon::start();
    let config = get(&daemon, "/api/v1/config");
    assert_eq!(config["session_prefix"].as_str(), Some("session"));
    assert_eq!(config["init_timeout_ms"].as_u64(), Some(15_000));
    // startup-bound fields never appear on this surface.
    assert!(config.get("api_port").is_none());
    assert!(config.get("data_dir").is_none());
}

#[test]
fn put_config_updates_session_prefix_and_is_visible_on_the_next_session() {
    let daemon = Daemon::start();
    let response = put(&daemon, "/api/v1/config", serde_json::json!({ "session_prefix": "pilot", "api_port": 1 }));
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().expect("PUT response should be JSON");
    assert_eq!(body["session_prefix"].as_str(), Some("pilot"));

    let session = daemon.ctl().args(&["session", "start"]).json().passes().json();
    let dir = session["session_dir"].as_str().expect("session_dir");
    assert!(dir.contains("pilot"), "session dir should use the new prefix: {dir}");
}

#[test]
fn reload_config_rereads_the_file_written_after_startup() {
    let config_dir = tempfile::tempdir().unwrap();
    let config_path = config_dir.path().join("daemon.conf");
    std::fs::write(&config_path, "session_prefix=first\n").unwrap();
    let daemon = Daemon::start_with_config(Some(&config_path));

    let before = get(&daemon, "/api/v1/config");
    assert_eq!(before["session_prefix"].as_str(), Some("first"));

    std::fs::write(&config_path, "session_prefix=second\ninit_timeout_ms=9000\n").unwrap();
    let reloaded = reqwest::blocking::Client::new()
        .post(format!("{}/api/v1/config/reload", daemon.url()))
        .send()
        .expect("reload should succeed");
    assert!(reloaded.status().is_success());
    let after: serde_json::Value = reloaded.json().expect("reload response should be JSON");
    assert_eq!(after["session_prefix"].as_str(), Some("second"));
    assert_eq!(after["init_timeout_ms"].as_u64(), Some(9000));
}

#[test]
fn module_config_round_trips_through_get_and_put() {
    let daemon = Daemon::start();
    let written = put(&daemon, "/api/v1/modules/Audio/config", serde_json::json!({ "gain": 0.5, "sample_rate": 48000 }));
    assert!(written.status().is_success());

    let read_back = get(&daemon, "/api/v1/modules/Audio/config");
    assert_eq!(read_back["gain"].as_f64(), Some(0.5));
    assert_eq!(read_back["sample_rate"].as_i64(), Some(48000));
}

#[test]
fn unknown_module_config_is_a_404() {
    let daemon = Daemon::start();
    let response = reqwest::blocking::get(format!("{}/api/v1/modules/NotARealModule/config", daemon.url())).unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[test]
fn module_preference_round_trips_through_get_and_put() {
    let daemon = Daemon::start();
    let response = put(&daemon, "/api/v1/modules/Gps/preferences/baud_rate", serde_json::json!({ "value": 9600 }));
    assert!(response.status().is_success());

    let read_back = get(&daemon, "/api/v1/modules/Gps/preferences/baud_rate");
    assert_eq!(read_back["value"].as_i64(), Some(9600));
}

#[test]
fn unset_module_preference_is_a_404() {
    let daemon = Daemon::start();
    let response = reqwest::blocking::get(format!("{}/api/v1/modules/Gps/preferences/never_set", daemon.url())).unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
