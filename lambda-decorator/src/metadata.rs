//! Metadata Registry
//!
//! Per-method key/value store shared by the independently declared layers of
//! an endpoint. Layers record what they know about a method (its endpoint
//! binding, its error kind, the request schema) and the export builder reads
//! the accumulated entries back to build the dispatch table.
//!
//! The registry is written only while controllers register, then frozen into
//! a read-only [`FrozenRegistry`] before any request is served.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};
use validator::Validate;

use crate::endpoint::EndpointDescriptor;
use crate::error::ErrorKind;

/// Identifies a method within the controller set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MethodKey {
    /// Owning controller
    pub controller: &'static str,

    /// Method name, unique within its controller
    pub method: String,
}

impl MethodKey {
    pub fn new(controller: &'static str, method: impl Into<String>) -> Self {
        Self {
            controller,
            method: method.into(),
        }
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.controller, self.method)
    }
}

/// One field recorded against a method.
#[derive(Debug, Clone)]
pub enum MetadataField {
    /// HTTP binding; settable once
    Endpoint(EndpointDescriptor),
    /// Error constructor override; later records win
    ErrorKind(ErrorKind),
    /// Open-ended named value; later records win
    Extension(String, Value),
}

impl MetadataField {
    fn name(&self) -> &str {
        match self {
            Self::Endpoint(_) => "endpoint",
            Self::ErrorKind(_) => "errorKind",
            Self::Extension(name, _) => name,
        }
    }
}

/// Everything recorded about one method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodMetadata {
    endpoint: Option<EndpointDescriptor>,
    error_kind: Option<ErrorKind>,
    extensions: Map<String, Value>,
}

impl MethodMetadata {
    /// HTTP binding, when the method is an endpoint.
    pub fn endpoint(&self) -> Option<&EndpointDescriptor> {
        self.endpoint.as_ref()
    }

    /// Recorded error kind override.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    /// Error kind to use for framework-raised errors.
    pub fn error_kind_or_default(&self) -> ErrorKind {
        self.error_kind.unwrap_or_default()
    }

    /// Named extension value.
    pub fn extension(&self, name: &str) -> Option<&Value> {
        self.extensions.get(name)
    }

    /// All extension values in record order.
    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }

    fn merge(&mut self, key: &MethodKey, field: MetadataField) -> Result<(), RegistryError> {
        match field {
            MetadataField::Endpoint(descriptor) => {
                descriptor.validate().map_err(|e| RegistryError::InvalidEndpoint {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;

                match &self.endpoint {
                    Some(existing) if *existing == descriptor => {}
                    Some(existing) => {
                        return Err(RegistryError::EndpointRedefined {
                            key: key.to_string(),
                            existing: existing.path.clone(),
                            requested: descriptor.path,
                        });
                    }
                    None => self.endpoint = Some(descriptor),
                }
            }
            MetadataField::ErrorKind(kind) => self.error_kind = Some(kind),
            MetadataField::Extension(name, value) => {
                self.extensions.insert(name, value);
            }
        }
        Ok(())
    }
}

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("endpoint of {key} is already registered as '{existing}', cannot rebind to '{requested}'")]
    EndpointRedefined {
        key: String,
        existing: String,
        requested: String,
    },

    #[error("invalid endpoint for {key}: {reason}")]
    InvalidEndpoint { key: String, reason: String },

    #[error("Duplicate endpoint found: {endpoint} (declared by {first} and {second})")]
    DuplicateEndpoint {
        endpoint: String,
        first: String,
        second: String,
    },

    #[error("method {0} is registered more than once")]
    DuplicateMethod(String),
}

/// Write phase of the registry.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entries: Vec<(MethodKey, MethodMetadata)>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `field` into the metadata of `key`, creating the entry if needed.
    pub fn record(&mut self, key: &MethodKey, field: MetadataField) -> Result<(), RegistryError> {
        trace!(method = %key, field = field.name(), "recording metadata");

        let position = match self.entries.iter().position(|(existing, _)| existing == key) {
            Some(position) => position,
            None => {
                self.entries.push((key.clone(), MethodMetadata::default()));
                self.entries.len() - 1
            }
        };

        self.entries[position].1.merge(key, field)
    }

    /// Metadata recorded for `key`.
    pub fn read(&self, key: &MethodKey) -> Option<&MethodMetadata> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, metadata)| metadata)
    }

    /// Keys recorded for `controller`, in registration order.
    pub fn keys<'a>(&'a self, controller: &'a str) -> impl Iterator<Item = &'a MethodKey> + 'a {
        self.entries
            .iter()
            .map(|(key, _)| key)
            .filter(move |key| key.controller == controller)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// End the write phase. Fails if two methods anywhere in the registry
    /// declare the same endpoint path.
    pub fn freeze(self) -> Result<FrozenRegistry, RegistryError> {
        let mut seen: HashMap<&str, &MethodKey> = HashMap::new();
        for (key, metadata) in &self.entries {
            let Some(endpoint) = metadata.endpoint() else {
                continue;
            };
            if let Some(first) = seen.insert(endpoint.path.as_str(), key) {
                return Err(RegistryError::DuplicateEndpoint {
                    endpoint: endpoint.path.clone(),
                    first: first.to_string(),
                    second: key.to_string(),
                });
            }
        }

        debug!(methods = self.entries.len(), endpoints = seen.len(), "metadata registry frozen");

        let entries = self
            .entries
            .into_iter()
            .map(|(key, metadata)| (key, Arc::new(metadata)))
            .collect();

        Ok(FrozenRegistry {
            entries: Arc::new(entries),
        })
    }
}

/// Read-only registry shared with the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct FrozenRegistry {
    entries: Arc<Vec<(MethodKey, Arc<MethodMetadata>)>>,
}

impl FrozenRegistry {
    /// Metadata recorded for `key`.
    pub fn read(&self, key: &MethodKey) -> Option<Arc<MethodMetadata>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, metadata)| Arc::clone(metadata))
    }

    /// Keys recorded for `controller`, in registration order.
    pub fn keys<'a>(&'a self, controller: &'a str) -> impl Iterator<Item = &'a MethodKey> + 'a {
        self.entries
            .iter()
            .map(|(key, _)| key)
            .filter(move |key| key.controller == controller)
    }

    /// Every method carrying an endpoint, in registration order.
    pub fn endpoints(&self) -> impl Iterator<Item = (&MethodKey, &EndpointDescriptor)> {
        self.entries
            .iter()
            .filter_map(|(key, metadata)| metadata.endpoint().map(|endpoint| (key, endpoint)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::HttpMethod;
    use serde_json::json;

    fn key(method: &str) -> MethodKey {
        MethodKey::new("TodoController", method)
    }

    #[test]
    fn test_record_creates_and_merges_entries() {
        let mut registry = MetadataRegistry::new();
        let create = key("create");

        registry
            .record(&create, MetadataField::Endpoint(EndpointDescriptor::new("create", HttpMethod::Post)))
            .unwrap();
        registry
            .record(&create, MetadataField::ErrorKind(ErrorKind::JSON))
            .unwrap();
        registry
            .record(&create, MetadataField::Extension("request".into(), json!("json")))
            .unwrap();

        let metadata = registry.read(&create).unwrap();
        assert_eq!(metadata.endpoint().unwrap().http_method, HttpMethod::Post);
        assert_eq!(metadata.error_kind(), Some(ErrorKind::JSON));
        assert_eq!(metadata.extension("request"), Some(&json!("json")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_read_unknown_key_is_none() {
        let registry = MetadataRegistry::new();
        assert!(registry.read(&key("missing")).is_none());
    }

    #[test]
    fn test_identical_endpoint_is_idempotent() {
        let mut registry = MetadataRegistry::new();
        let get = key("get");
        let descriptor = EndpointDescriptor::new("get", HttpMethod::Get);

        registry.record(&get, MetadataField::Endpoint(descriptor.clone())).unwrap();
        registry.record(&get, MetadataField::Endpoint(descriptor)).unwrap();

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_endpoint_cannot_be_rebound() {
        let mut registry = MetadataRegistry::new();
        let get = key("get");

        registry
            .record(&get, MetadataField::Endpoint(EndpointDescriptor::new("get", HttpMethod::Get)))
            .unwrap();
        let result = registry.record(&get, MetadataField::Endpoint(EndpointDescriptor::new("fetch", HttpMethod::Get)));

        assert!(matches!(result, Err(RegistryError::EndpointRedefined { .. })));
    }

    #[test]
    fn test_error_kind_override_wins() {
        let mut registry = MetadataRegistry::new();
        let delete = key("delete");

        registry.record(&delete, MetadataField::ErrorKind(ErrorKind::JSON)).unwrap();
        registry.record(&delete, MetadataField::ErrorKind(ErrorKind::PLAIN)).unwrap();

        assert_eq!(registry.read(&delete).unwrap().error_kind(), Some(ErrorKind::PLAIN));
    }

    #[test]
    fn test_invalid_path_is_rejected() {
        let mut registry = MetadataRegistry::new();
        let result = registry.record(
            &key("create"),
            MetadataField::Endpoint(EndpointDescriptor::new("lists/create", HttpMethod::Post)),
        );
        assert!(matches!(result, Err(RegistryError::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_keys_are_scoped_and_ordered() {
        let mut registry = MetadataRegistry::new();
        for method in ["create", "get", "delete"] {
            registry
                .record(&key(method), MetadataField::ErrorKind(ErrorKind::JSON))
                .unwrap();
        }
        registry
            .record(&MethodKey::new("Other", "ping"), MetadataField::ErrorKind(ErrorKind::JSON))
            .unwrap();

        let methods: Vec<&str> = registry.keys("TodoController").map(|k| k.method.as_str()).collect();
        assert_eq!(methods, vec!["create", "get", "delete"]);
    }

    #[test]
    fn test_freeze_rejects_duplicate_endpoints() {
        let mut registry = MetadataRegistry::new();
        registry
            .record(&key("get"), MetadataField::Endpoint(EndpointDescriptor::new("get", HttpMethod::Get)))
            .unwrap();
        registry
            .record(
                &MethodKey::new("Other", "fetch"),
                MetadataField::Endpoint(EndpointDescriptor::new("get", HttpMethod::Post)),
            )
            .unwrap();

        let result = registry.freeze();
        assert_eq!(
            result.unwrap_err(),
            RegistryError::DuplicateEndpoint {
                endpoint: "get".to_string(),
                first: "TodoController.get".to_string(),
                second: "Other.fetch".to_string(),
            }
        );
    }

    #[test]
    fn test_frozen_registry_lists_endpoints() {
        let mut registry = MetadataRegistry::new();
        registry
            .record(&key("get"), MetadataField::Endpoint(EndpointDescriptor::new("get", HttpMethod::Get)))
            .unwrap();
        registry
            .record(&key("helper"), MetadataField::ErrorKind(ErrorKind::JSON))
            .unwrap();

        let frozen = registry.freeze().unwrap();
        let endpoints: Vec<&str> = frozen.endpoints().map(|(_, e)| e.path.as_str()).collect();

        assert_eq!(endpoints, vec!["get"]);
        assert_eq!(frozen.len(), 2);
        assert!(frozen.read(&key("helper")).is_some());
    }
}
