//! Health and version endpoints
//!
//! - /health, /healthz - liveness: 200 while the process runs, with the
//!   backend's reachability reported in the body.
//! - /ready, /readyz - readiness: 200 only when the key-value backend
//!   answers a ping; use this for load balancer checks.
//! - /version - build information for deployment verification.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::json_response;
use crate::server::AppState;

#[derive(Serialize)]
struct HealthResponse {
    /// True while the registry process is running
    healthy: bool,
    /// 'online' when the backend answers, 'degraded' otherwise
    status: &'static str,
    version: &'static str,
    timestamp: String,
    node_id: String,
    backend: BackendHealth,
}

#[derive(Serialize)]
struct BackendHealth {
    connected: bool,
}

async fn build_health_response(state: &AppState) -> HealthResponse {
    let connected = state.kv.ping().await.is_ok();

    HealthResponse {
        healthy: true,
        status: if connected { "online" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        node_id: state.args.node_id.to_string(),
        backend: BackendHealth { connected },
    }
}

/// Handle liveness probe (/health, /healthz)
pub async fn health_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let response = build_health_response(&state).await;
    json_response(StatusCode::OK, &response)
}

/// Handle readiness probe (/ready, /readyz)
pub async fn readiness_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let response = build_health_response(&state).await;
    let status = if response.backend.connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    json_response(status, &response)
}

#[derive(Serialize)]
struct VersionResponse {
    service: String,
    version: &'static str,
    commit: &'static str,
    commit_full: &'static str,
    build_time: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info(state: &AppState) -> Response<Full<Bytes>> {
    let response = VersionResponse {
        service: state.args.app_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
    };
    json_response(StatusCode::OK, &response)
}
