//! Service registration endpoint
//!
//! POST /register: decode the registration payload, validate it against
//! the vocabulary, then hand the entry to the store. Duplicate placements
//! are a conflict; the assigned UUID comes back to the caller, who needs
//! it for every subsequent heartbeat.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::{error, warn};

use super::dto::RegisterRequest;
use super::json_response;
use crate::error::RegistryError;
use crate::server::AppState;

#[derive(Debug, Serialize)]
struct RegisterResponse {
    status: &'static str,
    message: String,
    #[serde(rename = "serviceUUID", skip_serializing_if = "Option::is_none")]
    service_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

impl RegisterResponse {
    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            service_uuid: None,
            errors: None,
        }
    }
}

pub async fn handle_register(state: Arc<AppState>, body: Bytes) -> Response<Full<Bytes>> {
    let request: RegisterRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!("register body parse error: {e}");
            return json_response(
                StatusCode::BAD_REQUEST,
                &RegisterResponse::error("Invalid request body"),
            );
        }
    };

    let errors = request.validate(&state.vocab);
    if !errors.is_empty() {
        return json_response(
            StatusCode::BAD_REQUEST,
            &RegisterResponse {
                status: "error",
                message: "Validation failed".to_string(),
                service_uuid: None,
                errors: Some(errors),
            },
        );
    }

    match state.store.register(request.into_entry()).await {
        Ok(entry) => json_response(
            StatusCode::OK,
            &RegisterResponse {
                status: "success",
                message: "Service registered successfully".to_string(),
                service_uuid: Some(entry.service_uuid),
                errors: None,
            },
        ),
        Err(RegistryError::Conflict(reason)) => {
            warn!("registration conflict: {reason}");
            json_response(
                StatusCode::CONFLICT,
                &RegisterResponse::error("Service already registered for this placement"),
            )
        }
        Err(RegistryError::Validation(errors)) => json_response(
            StatusCode::BAD_REQUEST,
            &RegisterResponse {
                status: "error",
                message: "Validation failed".to_string(),
                service_uuid: None,
                errors: Some(errors),
            },
        ),
        Err(e) => {
            error!("registration failed: {e}");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &RegisterResponse::error("Failed to register service"),
            )
        }
    }
}
