// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! `DaemonClient`: a thin `reqwest` wrapper over `daqd`'s localhost REST
//! API. One method per route; each decodes the daemon's error envelope
//! (`daq_protocol::rest::ApiErrorBody`) into a `ClientError` on any non-2xx
//! response.

use std::path::PathBuf;

use daq_protocol::rest::ApiErrorBody;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach daqd at {url}: {source}")]
    Connect { url: String, #[source] source: reqwest::Error },
    #[error("daqd returned malformed JSON: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("{code}: {message}")]
    Api { status: u16, code: String, message: String },
}

impl ClientError {
    pub fn status(&self) -> u16 {
        match self {
            ClientError::Api { status, .. } => *status,
            _ => 0,
        }
    }
}

pub struct DaemonClient {
    http: reqwest::Client,
    base_url: String,
}

impl DaemonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn handle(&self, response: reqwest::Result<reqwest::Response>, url: &str) -> Result<Value, ClientError> {
        let response = response.map_err(|source| ClientError::Connect { url: url.to_string(), source })?;
        let status = response.status();
        if status.is_success() {
            if status.as_u16() == 204 {
                return Ok(Value::Null);
            }
            let text = response.text().await.map_err(ClientError::Decode)?;
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|_| ClientError::Api {
                status: status.as_u16(),
                code: "NON_JSON_RESPONSE".to_string(),
                message: text,
            });
        }
        let body: ApiErrorBody = response
            .json()
            .await
            .map_err(|_| ClientError::Api { status: status.as_u16(), code: "UNKNOWN".to_string(), message: status.to_string() })?;
        Err(ClientError::Api { status: body.status, code: body.error.code, message: body.error.message })
    }

    pub async fn health(&self) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/health");
        self.handle(self.http.get(&url).send().await, &url).await
    }

    pub async fn status(&self) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/status");
        self.handle(self.http.get(&url).send().await, &url).await
    }

    pub async fn platform(&self) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/platform");
        self.handle(self.http.get(&url).send().await, &url).await
    }

    pub async fn info_system(&self) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/info/system");
        self.handle(self.http.get(&url).send().await, &url).await
    }

    pub async fn shutdown(&self) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/shutdown");
        self.handle(self.http.post(&url).send().await, &url).await
    }

    pub async fn list_modules(&self) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/modules");
        self.handle(self.http.get(&url).send().await, &url).await
    }

    pub async fn module_detail(&self, name: &str) -> Result<Value, ClientError> {
        let url = self.url(&format!("/api/v1/modules/{name}"));
        self.handle(self.http.get(&url).send().await, &url).await
    }

    pub async fn start_module(&self, name: &str) -> Result<Value, ClientError> {
        let url = self.url(&format!("/api/v1/modules/{name}/start"));
        self.handle(self.http.post(&url).send().await, &url).await
    }

    pub async fn stop_module(&self, name: &str) -> Result<Value, ClientError> {
        let url = self.url(&format!("/api/v1/modules/{name}/stop"));
        self.handle(self.http.post(&url).send().await, &url).await
    }

    pub async fn list_instances(&self) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/instances");
        self.handle(self.http.get(&url).send().await, &url).await
    }

    pub async fn get_session(&self) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/session");
        self.handle(self.http.get(&url).send().await, &url).await
    }

    pub async fn start_session(&self, session_dir: Option<PathBuf>) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/session");
        self.handle(self.http.post(&url).json(&json!({ "session_dir": session_dir })).send().await, &url).await
    }

    pub async fn stop_session(&self) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/session");
        self.handle(self.http.delete(&url).send().await, &url).await
    }

    pub async fn trial_status(&self) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/trial");
        self.handle(self.http.get(&url).send().await, &url).await
    }

    pub async fn start_trial(&self, trial_label: Option<String>) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/trial");
        self.handle(self.http.post(&url).json(&json!({ "trial_label": trial_label })).send().await, &url).await
    }

    pub async fn stop_trial(&self) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/trial");
        self.handle(self.http.delete(&url).send().await, &url).await
    }

    pub async fn list_devices(&self) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/devices");
        self.handle(self.http.get(&url).send().await, &url).await
    }

    pub async fn connect_device(&self, id: &str) -> Result<Value, ClientError> {
        let url = self.url(&format!("/api/v1/devices/{id}/connect"));
        self.handle(self.http.post(&url).send().await, &url).await
    }

    pub async fn disconnect_device(&self, id: &str) -> Result<Value, ClientError> {
        let url = self.url(&format!("/api/v1/devices/{id}/disconnect"));
        self.handle(self.http.post(&url).send().await, &url).await
    }

    pub async fn scanning_status(&self) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/devices/scanning/status");
        self.handle(self.http.get(&url).send().await, &url).await
    }

    pub async fn arrange_windows(&self, layout: &str, screen_width: u32, screen_height: u32) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/windows/arrange");
        let body = json!({ "layout": layout, "screen_width": screen_width, "screen_height": screen_height });
        self.handle(self.http.post(&url).json(&body).send().await, &url).await
    }

    pub async fn logs_paths(&self) -> Result<Value, ClientError> {
        let url = self.url("/api/v1/logs/paths");
        self.handle(self.http.get(&url).send().await, &url).await
    }

    pub async fn logs_master(&self) -> Result<String, ClientError> {
        self.fetch_text("/api/v1/logs/master").await
    }

    pub async fn logs_module(&self, name: &str) -> Result<String, ClientError> {
        self.fetch_text(&format!("/api/v1/logs/modules/{name}")).await
    }

    pub async fn logs_tail(&self, path: &str) -> Result<String, ClientError> {
        self.fetch_text(&format!("/api/v1/logs/tail/{path}")).await
    }

    async fn fetch_text(&self, path: &str) -> Result<String, ClientError> {
        let url = self.url(path);
        let response = self.http.get(&url).send().await.map_err(|source| ClientError::Connect { url: url.clone(), source })?;
        let status = response.status();
        if status.is_success() {
            return response.text().await.map_err(ClientError::Decode);
        }
        let body: ApiErrorBody = response
            .json()
            .await
            .map_err(|_| ClientError::Api { status: status.as_u16(), code: "UNKNOWN".to_string(), message: status.to_string() })?;
        Err(ClientError::Api { status: body.status, code: body.error.code, message: body.error.message })
    }

    pub async fn extension_query(&self, family: &str, key: &str) -> Result<Value, ClientError> {
        let url = self.url(&format!("/api/v1/modules/{family}/extension/{key}"));
        self.handle(self.http.get(&url).send().await, &url).await
    }
}
