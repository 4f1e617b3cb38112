// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! The REST control plane: a localhost-only HTTP server whose routes
//! are thin façades over the orchestrator. Middleware order, outermost
//! first: localhost-peer filter (403 for anything non-loopback) -> request
//! logging (verbose in debug mode) -> per-handler error conversion (each
//! handler returns `Result<_, ApiError>`, so axum applies it per-response
//! without a dedicated layer).

pub mod config;
pub mod devices;
pub mod error;
pub mod extensions;
pub mod logs;
pub mod modules;
pub mod session;
pub mod state;
pub mod system;
pub mod windows;

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use daq_core::Clock;
use daq_protocol::rest::ErrorCode;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

pub use error::ApiError;
pub use state::AppState;

pub fn build_router<C: Clock>(state: AppState<C>) -> Router {
    Router::<AppState<C>>::new()
        .route("/api/v1/health", get(system::health::<C>))
        .route("/api/v1/status", get(system::status::<C>))
        .route("/api/v1/platform", get(system::platform::<C>))
        .route("/api/v1/info/system", get(system::info_system::<C>))
        .route("/api/v1/shutdown", post(system::shutdown::<C>))
        .route("/api/v1/modules", get(modules::list_modules::<C>))
        .route("/api/v1/modules/{name}", get(modules::module_detail::<C>))
        .route("/api/v1/modules/{name}/start", post(modules::start_module::<C>))
        .route("/api/v1/modules/{name}/stop", post(modules::stop_module::<C>))
        .route("/api/v1/instances", get(modules::list_instances::<C>))
        .route(
            "/api/v1/session",
            get(session::get_session::<C>).post(session::start_session::<C>).delete(session::stop_session::<C>),
        )
        .route(
            "/api/v1/trial",
            get(session::trial_status::<C>).post(session::start_trial::<C>).delete(session::stop_trial::<C>),
        )
        .route("/api/v1/devices", get(devices::list_devices::<C>))
        .route("/api/v1/devices/{id}/connect", post(devices::connect_device::<C>))
        .route("/api/v1/devices/{id}/disconnect", post(devices::disconnect_device::<C>))
        .route("/api/v1/devices/scanning/status", get(devices::scanning_status::<C>))
        .route("/api/v1/windows/arrange", post(windows::arrange::<C>))
        .route("/api/v1/logs/paths", get(logs::paths::<C>))
        .route("/api/v1/logs/master", get(logs::master::<C>))
        .route("/api/v1/logs/modules/{name}", get(logs::module_log::<C>))
        .route("/api/v1/logs/tail/{*path}", get(logs::tail::<C>))
        .route("/api/v1/modules/{family}/extension/{key}", get(extensions::query::<C>))
        .route("/api/v1/config", get(config::get_config::<C>).put(config::put_config::<C>))
        .route("/api/v1/config/reload", post(config::reload_config::<C>))
        .route("/api/v1/modules/{name}/config", get(config::get_module_config::<C>).put(config::put_module_config::<C>))
        .route(
            "/api/v1/modules/{name}/preferences/{key}",
            get(config::get_module_preference::<C>).put(config::put_module_preference::<C>),
        )
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(localhost_only))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject any peer whose address isn't loopback with a 403.
async fn localhost_only(ConnectInfo(addr): ConnectInfo<SocketAddr>, req: Request, next: Next) -> Response {
    if !addr.ip().is_loopback() {
        warn!(peer = %addr, "rejected non-loopback peer");
        return ApiError::forbidden("only localhost clients may use this API").into_response_compat();
    }
    next.run(req).await
}

async fn request_logging(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;
    debug!(%method, %uri, status = response.status().as_u16(), "handled request");
    response
}

impl ApiError {
    /// `middleware::from_fn` handlers return a concrete `Response`, not
    /// `impl IntoResponse`, so this adapts the error type inline.
    fn into_response_compat(self) -> Response {
        use axum::response::IntoResponse;
        self.into_response()
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PathTraversalGuardError;

/// Reject any path containing `..` components or resolving outside `root`.
pub fn reject_path_traversal(root: &std::path::Path, candidate: &str) -> Result<std::path::PathBuf, ApiError> {
    if candidate.split('/').any(|segment| segment == "..") {
        return Err(ApiError::new(ErrorCode::ValidationError, "path traversal is not permitted"));
    }
    let joined = root.join(candidate.trim_start_matches('/'));
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_dotdot_segments() {
        let err = reject_path_traversal(std::path::Path::new("/var/log"), "../../etc/passwd");
        assert!(err.is_err());
    }

    #[test]
    fn accepts_plain_relative_path() {
        let path = reject_path_traversal(std::path::Path::new("/var/log"), "audio.log").unwrap();
        assert_eq!(path, std::path::PathBuf::from("/var/log/audio.log"));
    }
}
