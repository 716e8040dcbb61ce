//! Composite storage keys for service entries
//!
//! Every entry is stored under a single colon-delimited key:
//!
//! ```text
//! <uuid>:<name>:<type>:<status>:<provider>:<region>:<zone>:<networkID>:<subnetID>:<instanceID>:<version>
//! ```
//!
//! Exact lookups and wildcard scans both rely on positional matching, so
//! the field order never changes without a data migration. Replacing any
//! field with `*` yields a glob search key; a key with only the UUID fixed
//! is a point lookup, a key with only filter fields fixed is a scan.
//!
//! Field values must not contain the delimiter or the wildcard token; the
//! request validator rejects them first and [`validate_entry_fields`] is
//! the codec-side backstop.

use crate::error::RegistryError;
use crate::registry::entry::ServiceEntry;

/// Separator between key fields
pub const DELIMITER: char = ':';

/// Wildcard token for unconstrained fields in search keys
pub const WILDCARD: &str = "*";

/// Number of positional fields in a key
pub const FIELD_COUNT: usize = 11;

/// The ordered fields embedded in a storage key
///
/// Everything not listed here (tags, timestamps, counts, addresses) is
/// recoverable only from the stored value, never from the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFields {
    pub uuid: String,
    pub name: String,
    pub service_type: String,
    pub status: String,
    pub provider: String,
    pub region: String,
    pub zone: String,
    pub network_id: String,
    pub subnet_id: String,
    pub instance_id: String,
    pub version: String,
}

impl Default for KeyFields {
    /// All fields wildcarded, the match-everything search key
    fn default() -> Self {
        let any = || WILDCARD.to_string();
        Self {
            uuid: any(),
            name: any(),
            service_type: any(),
            status: any(),
            provider: any(),
            region: any(),
            zone: any(),
            network_id: any(),
            subnet_id: any(),
            instance_id: any(),
            version: any(),
        }
    }
}

impl KeyFields {
    /// Join the fields into a storage key (or search pattern)
    pub fn encode(&self) -> String {
        [
            self.uuid.as_str(),
            self.name.as_str(),
            self.service_type.as_str(),
            self.status.as_str(),
            self.provider.as_str(),
            self.region.as_str(),
            self.zone.as_str(),
            self.network_id.as_str(),
            self.subnet_id.as_str(),
            self.instance_id.as_str(),
            self.version.as_str(),
        ]
        .join(&DELIMITER.to_string())
    }

    /// Split a key back into its positional fields; wrong arity is an error
    pub fn decode(key: &str) -> Result<Self, RegistryError> {
        let parts: Vec<&str> = key.split(DELIMITER).collect();
        if parts.len() != FIELD_COUNT {
            return Err(RegistryError::Decode {
                key: key.to_string(),
                reason: format!("expected {FIELD_COUNT} key fields, found {}", parts.len()),
            });
        }
        Ok(Self {
            uuid: parts[0].to_string(),
            name: parts[1].to_string(),
            service_type: parts[2].to_string(),
            status: parts[3].to_string(),
            provider: parts[4].to_string(),
            region: parts[5].to_string(),
            zone: parts[6].to_string(),
            network_id: parts[7].to_string(),
            subnet_id: parts[8].to_string(),
            instance_id: parts[9].to_string(),
            version: parts[10].to_string(),
        })
    }
}

impl From<&ServiceEntry> for KeyFields {
    fn from(entry: &ServiceEntry) -> Self {
        Self {
            uuid: entry.service_uuid.clone(),
            name: entry.name.clone(),
            service_type: entry.service_type.clone(),
            status: entry.status.as_str().to_string(),
            provider: entry.provider.clone(),
            region: entry.region.clone(),
            zone: entry.zone.clone(),
            network_id: entry.network_id.clone(),
            subnet_id: entry.subnet_id.clone(),
            instance_id: entry.instance_id.clone(),
            version: entry.version.clone(),
        }
    }
}

/// Storage key for an entry under its current status
pub fn entry_key(entry: &ServiceEntry) -> String {
    KeyFields::from(entry).encode()
}

/// Point-lookup pattern with only the UUID fixed
pub fn uuid_search_key(uuid: &str) -> String {
    KeyFields {
        uuid: uuid.to_string(),
        ..Default::default()
    }
    .encode()
}

/// Duplicate-detection pattern: identity tuple fixed, UUID/name/status
/// wildcarded
pub fn identity_search_key(entry: &ServiceEntry) -> String {
    KeyFields {
        service_type: entry.service_type.clone(),
        provider: entry.provider.clone(),
        region: entry.region.clone(),
        zone: entry.zone.clone(),
        network_id: entry.network_id.clone(),
        subnet_id: entry.subnet_id.clone(),
        instance_id: entry.instance_id.clone(),
        version: entry.version.clone(),
        ..Default::default()
    }
    .encode()
}

/// Reject field values that would corrupt the positional scheme
pub fn validate_entry_fields(entry: &ServiceEntry) -> Result<(), RegistryError> {
    let fields = [
        ("serviceUUID", entry.service_uuid.as_str()),
        ("name", entry.name.as_str()),
        ("type", entry.service_type.as_str()),
        ("provider", entry.provider.as_str()),
        ("region", entry.region.as_str()),
        ("zone", entry.zone.as_str()),
        ("networkID", entry.network_id.as_str()),
        ("subnetID", entry.subnet_id.as_str()),
        ("instanceID", entry.instance_id.as_str()),
        ("version", entry.version.as_str()),
    ];
    let bad: Vec<String> = fields
        .iter()
        .filter(|(_, value)| value.contains(DELIMITER) || value.contains(WILDCARD))
        .map(|(name, _)| format!("{name} must not contain '{DELIMITER}' or '{WILDCARD}'"))
        .collect();
    if bad.is_empty() {
        Ok(())
    } else {
        Err(RegistryError::Validation(bad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::entry::ServiceStatus;
    use crate::registry::testutil::sample_entry;

    #[test]
    fn test_entry_key_field_order() {
        let mut entry = sample_entry();
        entry.status = ServiceStatus::Healthy;
        assert_eq!(
            entry_key(&entry),
            "550e8400-e29b-41d4-a716-446655440000:api-gateway:gw:healthy:aws:\
             us-east-1:us-east-1a:vpc-12345678:subnet-87654321:i-1234567890abcdef0:1.2.3"
        );
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let mut entry = sample_entry();
        entry.status = ServiceStatus::Registered;
        let fields = KeyFields::from(&entry);
        let decoded = KeyFields::decode(&fields.encode()).unwrap();
        assert_eq!(decoded, fields);
    }

    #[test]
    fn test_decode_rejects_wrong_arity() {
        assert!(KeyFields::decode("a:b:c").is_err());
        let too_many = vec!["x"; FIELD_COUNT + 1].join(":");
        assert!(KeyFields::decode(&too_many).is_err());
    }

    #[test]
    fn test_uuid_search_key_fixes_only_uuid() {
        assert_eq!(uuid_search_key("u-1"), "u-1:*:*:*:*:*:*:*:*:*:*");
    }

    #[test]
    fn test_identity_search_key_wildcards_uuid_name_status() {
        let entry = sample_entry();
        assert_eq!(
            identity_search_key(&entry),
            "*:*:gw:*:aws:us-east-1:us-east-1a:vpc-12345678:subnet-87654321:\
             i-1234567890abcdef0:1.2.3"
        );
    }

    #[test]
    fn test_validate_entry_fields_rejects_delimiter_and_wildcard() {
        let mut entry = sample_entry();
        entry.name = "api:gateway".to_string();
        entry.region = "us-*".to_string();
        let err = validate_entry_fields(&entry).unwrap_err();
        match err {
            RegistryError::Validation(messages) => {
                assert_eq!(messages.len(), 2);
                assert!(messages[0].contains("name"));
                assert!(messages[1].contains("region"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        assert!(validate_entry_fields(&sample_entry()).is_ok());
    }
}
