//! Deregistration endpoint
//!
//! POST /deregister: remove a service by UUID. Deleting an absent entry
//! is still a success so clients can retry freely; an ambiguous UUID is a
//! conflict and nothing is deleted.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::{debug, error, warn};

use super::dto::ServiceUuidRequest;
use super::{json_response, StatusMessage};
use crate::error::RegistryError;
use crate::server::AppState;

pub async fn handle_deregister(state: Arc<AppState>, body: Bytes) -> Response<Full<Bytes>> {
    let request: ServiceUuidRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!("deregister body parse error: {e}");
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

    match state.store.deregister(&uuid).await {
        Ok(deleted) => {
            if !deleted {
                debug!(uuid = %uuid, "deregister for absent service, reporting success");
            }
            json_response(
                StatusCode::OK,
                &StatusMessage::success("Service deregistered successfully"),
            )
        }
        Err(RegistryError::Conflict(reason)) => {
            warn!("deregister conflict: {reason}");
            json_response(
                StatusCode::CONFLICT,
                &StatusMessage::error("Multiple entries found for this UUID"),
            )
        }
        Err(e) => {
            error!("deregister failed: {e}");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &StatusMessage::error("Failed to deregister service"),
            )
        }
    }
}
