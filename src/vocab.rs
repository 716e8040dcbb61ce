//! Service type and provider vocabulary
//!
//! The closed vocabulary the registry validates against, loaded once at
//! startup from a JSON config file and passed around as an immutable
//! `Arc<Vocabulary>`. Service types come grouped for human organization;
//! lookups go through flat short-name indexes.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::RegistryError;

/// One service type definition
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceTypeDef {
    pub name: String,
    pub short: String,
    #[serde(default)]
    pub description: String,
}

/// A named group of service types
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceTypeGroup {
    pub name: String,
    pub services: Vec<ServiceTypeDef>,
}

/// One provider definition
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderDef {
    pub name: String,
    pub short: String,
}

#[derive(Debug, Deserialize)]
struct VocabFile {
    service_types: HashMap<String, ServiceTypeGroup>,
    providers: HashMap<String, ProviderDef>,
}

/// Immutable vocabulary lookup service
#[derive(Debug)]
pub struct Vocabulary {
    types: HashMap<String, ServiceTypeDef>,
    providers: HashMap<String, ProviderDef>,
}

impl Vocabulary {
    /// Load the vocabulary from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    /// Parse the vocabulary from JSON text
    pub fn from_json(raw: &str) -> Result<Self, RegistryError> {
        let file: VocabFile = serde_json::from_str(raw)?;

        let mut types = HashMap::new();
        for group in file.service_types.into_values() {
            for def in group.services {
                types.insert(def.short.clone(), def);
            }
        }
        let providers = file
            .providers
            .into_values()
            .map(|def| (def.short.clone(), def))
            .collect();

        Ok(Self { types, providers })
    }

    pub fn is_valid_type(&self, short: &str) -> bool {
        self.types.contains_key(short)
    }

    pub fn is_valid_provider(&self, short: &str) -> bool {
        self.providers.contains_key(short)
    }

    /// Full name and description for a service type short name
    pub fn type_info(&self, short: &str) -> Option<(&str, &str)> {
        self.types
            .get(short)
            .map(|def| (def.name.as_str(), def.description.as_str()))
    }

    /// All service type short names, sorted for stable guidance responses
    pub fn all_types(&self) -> Vec<String> {
        let mut shorts: Vec<String> = self.types.keys().cloned().collect();
        shorts.sort();
        shorts
    }

    /// All provider short names, sorted
    pub fn all_providers(&self) -> Vec<String> {
        let mut shorts: Vec<String> = self.providers.keys().cloned().collect();
        shorts.sort();
        shorts
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "service_types": {
            "gateway": {
                "name": "Gateway & Edge",
                "services": [
                    { "name": "API Gateway", "short": "gw", "description": "Edge API gateway" },
                    { "name": "REST API", "short": "rest", "description": "REST API service" }
                ]
            },
            "data": {
                "name": "Data & Storage",
                "services": [
                    { "name": "Database", "short": "db", "description": "Primary database" }
                ]
            }
        },
        "providers": {
            "aws": { "name": "Amazon Web Services", "short": "aws" },
            "gcp": { "name": "Google Cloud Platform", "short": "gcp" }
        }
    }"#;

    #[test]
    fn test_type_lookup_across_groups() {
        let vocab = Vocabulary::from_json(SAMPLE).unwrap();
        assert!(vocab.is_valid_type("gw"));
        assert!(vocab.is_valid_type("db"));
        assert!(!vocab.is_valid_type("cache"));
        assert_eq!(
            vocab.type_info("gw"),
            Some(("API Gateway", "Edge API gateway"))
        );
    }

    #[test]
    fn test_provider_lookup() {
        let vocab = Vocabulary::from_json(SAMPLE).unwrap();
        assert!(vocab.is_valid_provider("aws"));
        assert!(!vocab.is_valid_provider("ibm"));
    }

    #[test]
    fn test_all_lists_are_sorted() {
        let vocab = Vocabulary::from_json(SAMPLE).unwrap();
        assert_eq!(vocab.all_types(), vec!["db", "gw", "rest"]);
        assert_eq!(vocab.all_providers(), vec!["aws", "gcp"]);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(Vocabulary::from_json("{").is_err());
    }

    #[test]
    fn test_shipped_config_parses() {
        let vocab = Vocabulary::load(concat!(env!("CARGO_MANIFEST_DIR"), "/conf.json")).unwrap();
        assert!(vocab.is_valid_type("gw"));
        assert!(vocab.is_valid_provider("aws"));
    }
}
