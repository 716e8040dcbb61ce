//! Heartbeat endpoint
//!
//! POST /heartbeat: a service proves liveness by UUID. An accepted beat
//! moves the entry to `healthy` and refreshes its TTL; a service whose
//! report count exceeded the tolerance gets a 403 and stays suspicious
//! until it re-registers.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::{error, warn};

use super::dto::ServiceUuidRequest;
use super::{json_response, StatusMessage};
use crate::error::RegistryError;
use crate::server::AppState;

#[derive(Debug, Serialize)]
struct HeartbeatResponse {
    status: &'static str,
    message: String,
    #[serde(rename = "serviceUUID")]
    service_uuid: String,
    #[serde(rename = "serviceStatus")]
    service_status: String,
    #[serde(rename = "heardCount")]
    heard_count: i64,
}

pub async fn handle_heartbeat(state: Arc<AppState>, body: Bytes) -> Response<Full<Bytes>> {
    let request: ServiceUuidRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!("heartbeat body parse error: {e}");
            return json_response(
                StatusCode::BAD_REQUEST,
                &StatusMessage::error("Invalid request body"),
            );
        }
    };

    let uuid = match request.parsed_uuid() {
        Ok(uuid) => uuid,
        Err(message) => {
            return json_response(StatusCode::BAD_REQUEST, &StatusMessage::error(message));
        }
    };

    match state.store.heartbeat(&uuid).await {
        Ok(entry) => json_response(
            StatusCode::OK,
            &HeartbeatResponse {
                status: "success",
                message: "Heartbeat accepted".to_string(),
                service_uuid: entry.service_uuid,
                service_status: entry.status.to_string(),
                heard_count: entry.heard_count,
            },
        ),
        Err(RegistryError::NotFound(_)) => json_response(
            StatusCode::NOT_FOUND,
            &StatusMessage::error("Service not found"),
        ),
        Err(RegistryError::Suspicious(_)) => json_response(
            StatusCode::FORBIDDEN,
            &StatusMessage::error(
                "Service is marked suspicious; re-registration is required",
            ),
        ),
        Err(RegistryError::Conflict(reason)) => {
            warn!("heartbeat conflict: {reason}");
            json_response(
                StatusCode::CONFLICT,
                &StatusMessage::error("Multiple entries found for this UUID"),
            )
        }
        Err(e) => {
            error!("heartbeat failed: {e}");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &StatusMessage::error("Failed to record heartbeat"),
            )
        }
    }
}
