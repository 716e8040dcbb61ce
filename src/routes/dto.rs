//! Registration request payload and validation
//!
//! Validation runs before anything touches the store and collects every
//! offending field, so a client fixes one round trip instead of five.
//! Identity fields are restricted to `[A-Za-z0-9_-]`, which also keeps the
//! key codec's delimiter and wildcard characters out of key material.

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use serde::Deserialize;
use uuid::Uuid;

use crate::registry::entry::{ServiceEntry, ServiceStatus};
use crate::vocab::Vocabulary;

/// Registration payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub service_type: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub cluster: String,
    #[serde(rename = "instanceID", default)]
    pub instance_id: String,
    #[serde(rename = "networkID", default)]
    pub network_id: String,
    #[serde(rename = "subnetID", default)]
    pub subnet_id: String,
    #[serde(default)]
    pub network_domain: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub addr4: String,
    #[serde(default)]
    pub port4: u16,
    #[serde(default)]
    pub addr6: String,
    #[serde(default)]
    pub port6: u16,
}

impl RegisterRequest {
    /// Validate every field, returning one message per problem; an empty
    /// list means the request is acceptable
    pub fn validate(&self, vocab: &Vocabulary) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.len() < 3 || self.name.len() > 64 {
            errors.push("name must be between 3 and 64 characters".to_string());
        } else if self.name.contains(':') || self.name.contains('*') {
            errors.push("name must not contain ':' or '*'".to_string());
        }

        if self.service_type.is_empty() {
            errors.push("type is required".to_string());
        } else if !is_identifier(&self.service_type) {
            errors.push("type may only contain letters, digits, '-' and '_'".to_string());
        } else if !vocab.is_valid_type(&self.service_type) {
            errors.push("type is not a recognized service type".to_string());
        }

        if !is_version(&self.version) {
            errors.push("version must be dot-separated numbers, e.g. 1.2.3".to_string());
        }

        if self.provider.is_empty() {
            errors.push("provider is required".to_string());
        } else if !is_identifier(&self.provider) {
            errors.push("provider may only contain letters, digits, '-' and '_'".to_string());
        } else if !vocab.is_valid_provider(&self.provider) {
            errors.push("provider is not a recognized provider".to_string());
        }

        for (field, value) in [
            ("region", &self.region),
            ("zone", &self.zone),
            ("cluster", &self.cluster),
            ("instanceID", &self.instance_id),
            ("networkID", &self.network_id),
            ("subnetID", &self.subnet_id),
            ("networkDomain", &self.network_domain),
        ] {
            if value.is_empty() {
                errors.push(format!("{field} is required"));
            } else if !is_identifier(value) {
                errors.push(format!(
                    "{field} may only contain letters, digits, '-' and '_'"
                ));
            }
        }

        if !self.addr4.is_empty() && self.addr4.parse::<Ipv4Addr>().is_err() {
            errors.push("addr4 must be a valid IPv4 address".to_string());
        }
        if !self.addr6.is_empty() && self.addr6.parse::<Ipv6Addr>().is_err() {
            errors.push("addr6 must be a valid IPv6 address".to_string());
        }

        let addr4_ok = !self.addr4.is_empty() && self.port4 > 0;
        let addr6_ok = !self.addr6.is_empty() && self.port6 > 0;
        if !addr4_ok && !addr6_ok {
            errors.push(
                "either (addr4 and port4) or (addr6 and port6) must be provided".to_string(),
            );
        }

        errors
    }

    /// Build the entry to register, with a freshly generated UUID.
    /// Lifecycle fields are stamped by the store.
    pub fn into_entry(self) -> ServiceEntry {
        ServiceEntry {
            service_uuid: Uuid::new_v4().to_string(),
            name: self.name,
            service_type: self.service_type,
            version: self.version,
            provider: self.provider,
            region: self.region,
            zone: self.zone,
            cluster: self.cluster,
            instance_id: self.instance_id,
            network_id: self.network_id,
            subnet_id: self.subnet_id,
            network_domain: self.network_domain,
            tags: self.tags,
            addr4: self.addr4,
            port4: self.port4,
            addr6: self.addr6,
            port6: self.port6,
            created_at: String::new(),
            last_heard_at: String::new(),
            status: ServiceStatus::Unknown,
            heard_count: 0,
            report_count: 0,
            last_report_at: String::new(),
            metadata: HashMap::new(),
            ttl: 0,
        }
    }
}

/// Request body carrying just a service UUID (heartbeat, deregister)
#[derive(Debug, Deserialize)]
pub struct ServiceUuidRequest {
    #[serde(rename = "serviceUUID", default)]
    pub service_uuid: String,
}

impl ServiceUuidRequest {
    /// The UUID when present and well-formed, else an error message
    pub fn parsed_uuid(&self) -> Result<String, String> {
        if self.service_uuid.is_empty() {
            return Err("serviceUUID is required".to_string());
        }
        Uuid::parse_str(&self.service_uuid)
            .map(|u| u.to_string())
            .map_err(|_| "invalid serviceUUID format".to_string())
    }
}

fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_version(value: &str) -> bool {
    !value.is_empty()
        && value
            .split('.')
            .all(|run| !run.is_empty() && run.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary::from_json(
            r#"{
                "service_types": {
                    "gateway": {
                        "name": "Gateway",
                        "services": [{ "name": "API Gateway", "short": "gw", "description": "" }]
                    }
                },
                "providers": {
                    "aws": { "name": "Amazon Web Services", "short": "aws" }
                }
            }"#,
        )
        .unwrap()
    }

    fn valid_request() -> RegisterRequest {
        RegisterRequest {
            name: "api-gateway".to_string(),
            service_type: "gw".to_string(),
            version: "1.2.3".to_string(),
            provider: "aws".to_string(),
            region: "us-east-1".to_string(),
            zone: "us-east-1a".to_string(),
            cluster: "edge".to_string(),
            instance_id: "i-1234".to_string(),
            network_id: "vpc-1".to_string(),
            subnet_id: "subnet-1".to_string(),
            network_domain: "internal".to_string(),
            addr4: "10.0.0.1".to_string(),
            port4: 8080,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(valid_request().validate(&vocab()).is_empty());
    }

    #[test]
    fn test_all_errors_are_collected() {
        let mut req = valid_request();
        req.name = "ab".to_string();
        req.service_type = "nosuch".to_string();
        req.version = "1.x".to_string();
        req.region = String::new();
        let errors = req.validate(&vocab());
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_unknown_type_and_provider_are_rejected() {
        let mut req = valid_request();
        req.service_type = "teleport".to_string();
        req.provider = "ibm".to_string();
        let errors = req.validate(&vocab());
        assert!(errors.iter().any(|e| e.contains("service type")));
        assert!(errors.iter().any(|e| e.contains("provider")));
    }

    #[test]
    fn test_delimiter_in_name_is_rejected() {
        let mut req = valid_request();
        req.name = "api:gateway".to_string();
        let errors = req.validate(&vocab());
        assert_eq!(errors, vec!["name must not contain ':' or '*'"]);
    }

    #[test]
    fn test_version_format() {
        assert!(is_version("1"));
        assert!(is_version("1.0"));
        assert!(is_version("2.3.4.5"));
        assert!(!is_version("1."));
        assert!(!is_version("v1.0"));
        assert!(!is_version(""));
    }

    #[test]
    fn test_address_pair_is_required() {
        let mut req = valid_request();
        req.addr4 = String::new();
        let errors = req.validate(&vocab());
        assert_eq!(
            errors,
            vec!["either (addr4 and port4) or (addr6 and port6) must be provided"]
        );

        // An IPv6 pair alone satisfies the requirement
        req.addr6 = "fd00::1".to_string();
        req.port6 = 9090;
        assert!(req.validate(&vocab()).is_empty());
    }

    #[test]
    fn test_bad_ip_is_rejected() {
        let mut req = valid_request();
        req.addr4 = "300.1.1.1".to_string();
        let errors = req.validate(&vocab());
        assert!(errors.iter().any(|e| e.contains("IPv4")));
    }

    #[test]
    fn test_uuid_request_parsing() {
        let ok = ServiceUuidRequest {
            service_uuid: "550e8400-e29b-41d4-a716-446655440000".to_string(),
        };
        assert!(ok.parsed_uuid().is_ok());

        let empty = ServiceUuidRequest {
            service_uuid: String::new(),
        };
        assert!(empty.parsed_uuid().is_err());

        let bad = ServiceUuidRequest {
            service_uuid: "not-a-uuid".to_string(),
        };
        assert!(bad.parsed_uuid().is_err());
    }
}
