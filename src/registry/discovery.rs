//! Discovery query engine
//!
//! Turns a set of optional filter fields plus pagination parameters into a
//! wildcard key scan, pages the key list, then fetches and decodes the
//! selected entries. Pagination is applied to the keys before any value
//! fetch, so an over-the-end offset costs one scan and nothing more.
//!
//! A corrupt or just-expired record is skipped rather than failing the
//! page; discovery is best effort by contract.

use futures::future;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::RegistryError;
use crate::kv::KvStore;
use crate::registry::entry::{ServiceEntry, ServiceStatus};
use crate::registry::keys::{KeyFields, WILDCARD};

pub const MIN_PAGE_SIZE: usize = 1;
pub const MAX_PAGE_SIZE: usize = 10;
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A validated discovery request
///
/// `service_type` is mandatory; every `None` filter is wildcarded.
#[derive(Debug, Clone)]
pub struct DiscoverQuery {
    pub service_type: String,
    pub status: ServiceStatus,
    pub provider: Option<String>,
    pub region: Option<String>,
    pub zone: Option<String>,
    pub network_id: Option<String>,
    pub subnet_id: Option<String>,
    pub instance_id: Option<String>,
    pub version: Option<String>,
    pub page_size: usize,
    pub page_offset: usize,
}

impl DiscoverQuery {
    pub fn new(service_type: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            status: ServiceStatus::Any,
            provider: None,
            region: None,
            zone: None,
            network_id: None,
            subnet_id: None,
            instance_id: None,
            version: None,
            page_size: DEFAULT_PAGE_SIZE,
            page_offset: 0,
        }
    }

    /// Scan pattern for this query: UUID and name wildcarded, filters fixed
    pub fn search_key(&self) -> String {
        let or_any = |field: &Option<String>| {
            field.clone().unwrap_or_else(|| WILDCARD.to_string())
        };
        KeyFields {
            service_type: self.service_type.clone(),
            status: self.status.as_str().to_string(),
            provider: or_any(&self.provider),
            region: or_any(&self.region),
            zone: or_any(&self.zone),
            network_id: or_any(&self.network_id),
            subnet_id: or_any(&self.subnet_id),
            instance_id: or_any(&self.instance_id),
            version: or_any(&self.version),
            ..Default::default()
        }
        .encode()
    }
}

/// Slice the scanned key list down to the requested page
///
/// An offset past the end yields an empty page, never an error.
pub fn paginate(keys: &[String], page_size: usize, page_offset: usize) -> &[String] {
    let start = page_offset.saturating_mul(page_size);
    if start >= keys.len() {
        return &[];
    }
    let end = (start + page_size).min(keys.len());
    &keys[start..end]
}

/// Run a discovery query against the backend
pub async fn discover(
    kv: &dyn KvStore,
    query: &DiscoverQuery,
) -> Result<Vec<ServiceEntry>, RegistryError> {
    let pattern = query.search_key();
    let keys = kv.scan(&pattern).await?;
    let page = paginate(&keys, query.page_size, query.page_offset);

    // Fetch the page concurrently; a failed or undecodable record is
    // dropped from the page, not an error for the whole query
    let fetches = page.iter().map(|key| async move {
        let raw = match kv.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                // Expired between scan and fetch
                debug!(key = %key, "entry vanished before fetch, skipping");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "entry fetch failed, skipping");
                return None;
            }
        };
        match serde_json::from_slice::<ServiceEntry>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key = %key, error = %e, "undecodable entry, skipping");
                None
            }
        }
    });
    let services: Vec<ServiceEntry> = future::join_all(fetches)
        .await
        .into_iter()
        .flatten()
        .collect();

    info!(
        service_type = %query.service_type,
        status = %query.status,
        matched = keys.len(),
        returned = services.len(),
        "discovery scan complete"
    );
    Ok(services)
}

/// Discovery result item: identity plus resolved address
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    #[serde(rename = "serviceID")]
    pub service_id: String,
    #[serde(rename = "serviceAddr")]
    pub service_addr: String,
}

impl From<&ServiceEntry> for ServiceInfo {
    fn from(entry: &ServiceEntry) -> Self {
        Self {
            service_id: entry.service_uuid.clone(),
            service_addr: entry.resolved_addr().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("key-{i:03}")).collect()
    }

    #[test]
    fn test_paginate_counts() {
        // For N keys, page (size, offset) returns max(0, min(size, N - offset*size))
        let cases = [
            (25usize, 10usize, 0usize, 10usize),
            (25, 10, 1, 10),
            (25, 10, 2, 5),
            (25, 10, 3, 0),
            (25, 10, 100, 0),
            (3, 10, 0, 3),
            (0, 10, 0, 0),
            (10, 1, 9, 1),
            (10, 1, 10, 0),
        ];
        for (n, size, offset, expected) in cases {
            let all = keys(n);
            assert_eq!(
                paginate(&all, size, offset).len(),
                expected,
                "n={n} size={size} offset={offset}"
            );
        }
    }

    #[test]
    fn test_paginate_slices_in_order() {
        let all = keys(25);
        let page = paginate(&all, 10, 1);
        assert_eq!(page.first().unwrap(), "key-010");
        assert_eq!(page.last().unwrap(), "key-019");
    }

    #[test]
    fn test_search_key_wildcards_unset_filters() {
        let query = DiscoverQuery::new("gw");
        assert_eq!(query.search_key(), "*:*:gw:*:*:*:*:*:*:*:*");
    }

    #[test]
    fn test_search_key_fixes_set_filters() {
        let mut query = DiscoverQuery::new("gw");
        query.status = ServiceStatus::Healthy;
        query.provider = Some("aws".to_string());
        query.region = Some("us-east-1".to_string());
        assert_eq!(query.search_key(), "*:*:gw:healthy:aws:us-east-1:*:*:*:*:*");
    }
}
