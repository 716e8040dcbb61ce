//! Discovery endpoint
//!
//! GET /discover: filtered, paginated lookup. `servicetype` is mandatory
//! and must belong to the vocabulary; a rejected enum value comes back
//! with the allowed set so the caller can correct itself. Every other
//! filter is optional and wildcarded when absent.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::json_response;
use crate::registry::discovery::{DiscoverQuery, ServiceInfo, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::registry::entry::ServiceStatus;
use crate::server::AppState;

/// Raw query parameters, all optional strings until validated
#[derive(Debug, Default, Deserialize)]
struct DiscoverParams {
    servicetype: Option<String>,
    status: Option<String>,
    provider: Option<String>,
    region: Option<String>,
    zone: Option<String>,
    networkid: Option<String>,
    subnetid: Option<String>,
    instanceid: Option<String>,
    version: Option<String>,
    pagesize: Option<String>,
    pageoffset: Option<String>,
}

#[derive(Debug, Serialize)]
struct DiscoverResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    message: String,
    #[serde(rename = "serviceTypes", skip_serializing_if = "Option::is_none")]
    service_types: Option<Vec<String>>,
    #[serde(rename = "providerTypes", skip_serializing_if = "Option::is_none")]
    provider_types: Option<Vec<String>>,
    #[serde(rename = "statusTypes", skip_serializing_if = "Option::is_none")]
    status_types: Option<Vec<String>>,
    services: Vec<ServiceInfo>,
}

impl DiscoverResponse {
    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            service_types: None,
            provider_types: None,
            status_types: None,
            services: Vec::new(),
        }
    }
}

pub async fn handle_discover(state: Arc<AppState>, raw_query: &str) -> Response<Full<Bytes>> {
    let params: DiscoverParams = match serde_urlencoded::from_str(raw_query) {
        Ok(p) => p,
        Err(e) => {
            warn!("discover query parse error: {e}");
            return json_response(
                StatusCode::BAD_REQUEST,
                &DiscoverResponse::error("Malformed query string"),
            );
        }
    };

    // Pagination bounds are a client contract: out-of-range values are
    // rejected, not clamped
    let page_size = match &params.pagesize {
        None => DEFAULT_PAGE_SIZE,
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if (1..=MAX_PAGE_SIZE).contains(&n) => n,
            _ => {
                return json_response(
                    StatusCode::BAD_REQUEST,
                    &DiscoverResponse::error(format!(
                        "Invalid 'pagesize' query parameter (must be 1-{MAX_PAGE_SIZE})"
                    )),
                );
            }
        },
    };

    let page_offset = match &params.pageoffset {
        None => 0,
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                return json_response(
                    StatusCode::BAD_REQUEST,
                    &DiscoverResponse::error(
                        "Invalid 'pageoffset' query parameter (must be >= 0)",
                    ),
                );
            }
        },
    };

    let service_type = match params.servicetype.filter(|s| !s.is_empty()) {
        Some(t) => t,
        None => {
            return json_response(
                StatusCode::BAD_REQUEST,
                &DiscoverResponse::error("Missing 'servicetype' query parameter"),
            );
        }
    };

    if !state.vocab.is_valid_type(&service_type) {
        return json_response(
            StatusCode::BAD_REQUEST,
            &DiscoverResponse {
                service_types: Some(state.vocab.all_types()),
                ..DiscoverResponse::error("Invalid 'servicetype' query parameter")
            },
        );
    }

    if let Some(provider) = params.provider.as_deref().filter(|s| !s.is_empty()) {
        if !state.vocab.is_valid_provider(provider) {
            return json_response(
                StatusCode::BAD_REQUEST,
                &DiscoverResponse {
                    provider_types: Some(state.vocab.all_providers()),
                    ..DiscoverResponse::error("Invalid 'provider' query parameter")
                },
            );
        }
    }

    let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
        None => ServiceStatus::Any,
        Some(raw) => {
            if !ServiceStatus::is_valid(raw) {
                return json_response(
                    StatusCode::BAD_REQUEST,
                    &DiscoverResponse {
                        status_types: Some(
                            ServiceStatus::all().iter().map(|s| s.to_string()).collect(),
                        ),
                        ..DiscoverResponse::error("Invalid 'status' query parameter")
                    },
                );
            }
            ServiceStatus::from(raw)
        }
    };

    let non_empty = |field: Option<String>| field.filter(|s| !s.is_empty());
    let query = DiscoverQuery {
        status,
        provider: non_empty(params.provider),
        region: non_empty(params.region),
        zone: non_empty(params.zone),
        network_id: non_empty(params.networkid),
        subnet_id: non_empty(params.subnetid),
        instance_id: non_empty(params.instanceid),
        version: non_empty(params.version),
        page_size,
        page_offset,
        ..DiscoverQuery::new(service_type.clone())
    };

    match state.store.list_filtered(&query).await {
        Ok(entries) => {
            let services: Vec<ServiceInfo> = entries.iter().map(ServiceInfo::from).collect();
            info!(
                service_type = %service_type,
                count = services.len(),
                "discovery request served"
            );
            json_response(
                StatusCode::OK,
                &DiscoverResponse {
                    status: "success",
                    message: "Services discovered successfully".to_string(),
                    service_types: None,
                    provider_types: None,
                    status_types: None,
                    services,
                },
            )
        }
        Err(e) => {
            error!("discovery failed: {e}");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &DiscoverResponse::error("Failed to retrieve services"),
            )
        }
    }
}
