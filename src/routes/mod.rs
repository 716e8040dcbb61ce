//! HTTP routes for Waypost

pub mod deregister;
pub mod discover;
pub mod dto;
pub mod health;
pub mod heartbeat;
pub mod register;

pub use deregister::handle_deregister;
pub use discover::handle_discover;
pub use health::{health_check, readiness_check, version_info};
pub use heartbeat::handle_heartbeat;
pub use register::handle_register;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Serialize `body` into a JSON response with CORS headers
pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let payload = serde_json::to_string(body)
        .unwrap_or_else(|_| r#"{"status":"error","message":"Serialization failed"}"#.to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(payload)))
        .unwrap()
}

/// Standard `{status, message}` envelope used by the mutation routes
#[derive(Debug, Serialize)]
pub(crate) struct StatusMessage {
    pub status: &'static str,
    pub message: String,
}

impl StatusMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}
