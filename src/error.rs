//! Error taxonomy for registry operations
//!
//! Validation, conflict, not-found and suspicious rejections map directly
//! to HTTP responses; store failures surface as internal errors and are
//! never retried by the registry itself.

use thiserror::Error;

use crate::kv::KvError;

/// Errors produced by registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Request rejected before touching the store; carries one message per
    /// offending field
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Duplicate identity tuple on register, or an ambiguous multi-match
    /// where exactly one record was expected
    #[error("conflict: {0}")]
    Conflict(String),

    /// Heartbeat or lookup target is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Heartbeat refused because accumulated reports exceeded tolerance
    #[error("service {0} is marked suspicious")]
    Suspicious(String),

    /// Stored value under `key` could not be decoded
    #[error("malformed entry under key {key}: {reason}")]
    Decode { key: String, reason: String },

    /// JSON encode/decode failure outside the stored-entry path
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Key-value backend failure
    #[error(transparent)]
    Store(#[from] KvError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// Single-message validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
