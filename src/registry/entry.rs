//! Service entry data model
//!
//! One entry per registered service instance. The stored record is the full
//! entry serialized as JSON; the storage key embeds the identity fields plus
//! the current status (see [`super::keys`]), so a status transition always
//! rotates the key.

use std::collections::HashMap;
use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a registered service
///
/// `Any` is a search-predicate pseudo-value and is never stored; `Unknown`
/// is the fallback for unrecognized input and is never produced by a
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ServiceStatus {
    #[serde(rename = "*")]
    Any,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "registered")]
    Registered,
    #[serde(rename = "healthy")]
    Healthy,
    #[serde(rename = "suspicious")]
    Suspicious,
    #[serde(rename = "deregistered")]
    Deregistered,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Any => "*",
            ServiceStatus::Unknown => "unknown",
            ServiceStatus::Registered => "registered",
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Suspicious => "suspicious",
            ServiceStatus::Deregistered => "deregistered",
        }
    }

    /// Whether `input` names a known status (including the `*` wildcard)
    pub fn is_valid(input: &str) -> bool {
        Self::all().contains(&input)
    }

    /// Every accepted status string, for validation guidance responses
    pub fn all() -> [&'static str; 6] {
        [
            "healthy",
            "unknown",
            "suspicious",
            "*",
            "registered",
            "deregistered",
        ]
    }
}

impl From<&str> for ServiceStatus {
    /// Unrecognized input decodes to `Unknown`
    fn from(input: &str) -> Self {
        match input {
            "*" => ServiceStatus::Any,
            "registered" => ServiceStatus::Registered,
            "healthy" => ServiceStatus::Healthy,
            "suspicious" => ServiceStatus::Suspicious,
            "deregistered" => ServiceStatus::Deregistered,
            _ => ServiceStatus::Unknown,
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registered service instance
///
/// Identity and placement fields are immutable for the entry's life;
/// `status`, `last_heard_at` and `heard_count` mutate on heartbeats.
/// `report_count`, `last_report_at` and `metadata` are written by an
/// external reporting path and only read here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    #[serde(rename = "serviceUUID")]
    pub service_uuid: String,
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub version: String,
    pub provider: String,
    pub region: String,
    pub zone: String,
    pub cluster: String,
    #[serde(rename = "instanceID")]
    pub instance_id: String,
    #[serde(rename = "networkID")]
    pub network_id: String,
    #[serde(rename = "subnetID")]
    pub subnet_id: String,
    pub network_domain: String,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub addr4: String,
    #[serde(default)]
    pub port4: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub addr6: String,
    #[serde(default)]
    pub port6: u16,

    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_heard_at: String,
    #[serde(default)]
    pub status: ServiceStatus,
    #[serde(default)]
    pub heard_count: i64,
    #[serde(default)]
    pub report_count: i64,
    #[serde(default)]
    pub last_report_at: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    /// Store expiration in seconds, distinct from the lifecycle status
    #[serde(default)]
    pub ttl: i64,
}

impl ServiceEntry {
    /// Resolved network address: the IPv4 pair when present, else the
    /// bracketed IPv6 pair, else `None`
    pub fn resolved_addr(&self) -> Option<String> {
        if !self.addr4.is_empty() {
            Some(format!("{}:{}", self.addr4, self.port4))
        } else if !self.addr6.is_empty() {
            Some(format!("[{}]:{}", self.addr6, self.port6))
        } else {
            None
        }
    }
}

/// Current time as an RFC 3339 string, the entry timestamp format
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::testutil::sample_entry;

    #[test]
    fn test_status_string_round_trip() {
        for s in ServiceStatus::all() {
            assert_eq!(ServiceStatus::from(s).as_str(), s);
        }
        assert_eq!(ServiceStatus::from("bogus"), ServiceStatus::Unknown);
    }

    #[test]
    fn test_status_validity() {
        assert!(ServiceStatus::is_valid("healthy"));
        assert!(ServiceStatus::is_valid("*"));
        assert!(!ServiceStatus::is_valid("online"));
    }

    #[test]
    fn test_resolved_addr_prefers_ipv4() {
        let mut entry = sample_entry();
        entry.addr6 = "fd00::1".to_string();
        entry.port6 = 9090;
        assert_eq!(entry.resolved_addr().unwrap(), "10.0.0.1:8080");

        entry.addr4.clear();
        assert_eq!(entry.resolved_addr().unwrap(), "[fd00::1]:9090");

        entry.addr6.clear();
        assert!(entry.resolved_addr().is_none());
    }

    #[test]
    fn test_entry_json_field_names() {
        let entry = sample_entry();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["serviceUUID"], "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(json["type"], "gw");
        assert_eq!(json["instanceID"], "i-1234567890abcdef0");
        assert_eq!(json["networkID"], "vpc-12345678");
        assert_eq!(json["subnetID"], "subnet-87654321");
        assert_eq!(json["networkDomain"], "internal");
        assert_eq!(json["status"], "unknown");

        let back: ServiceEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
