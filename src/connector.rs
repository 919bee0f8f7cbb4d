//! Backend connectors and the runtime connector registry.
//!
//! A [`Connector`] turns user-supplied settings into a connected
//! [`RemoteFilesystem`] handle plus a root path. The registry maps a
//! backend identifier (`"sshfs"`, `"s3fs"`) to a factory, so the UI can
//! offer backends by name without compile-time knowledge of them.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::BrowserError;
use crate::fs::RemoteFilesystem;

/// Factory function that creates a new connector instance.
pub type ConnectorFactory = Box<dyn Fn() -> Box<dyn Connector> + Send + Sync>;

/// Produces connected filesystem handles from user-supplied settings.
///
/// # Failure policy
///
/// `connect()` must catch every connection error (bad credentials,
/// unreachable host, handshake failure) at this boundary, log it, and
/// return `None`. Callers treat `None` as "stay on the disconnected
/// state" — a failed connection attempt is never fatal.
pub trait Connector: Send {
    /// Machine-readable backend identifier (e.g., `"sshfs"`).
    fn type_id(&self) -> &str;

    /// Human-readable display name (e.g., `"SSH"`).
    fn display_name(&self) -> &str;

    /// Connect using the provided settings JSON.
    ///
    /// Returns the shared filesystem handle and the root path to browse
    /// from, or `None` when no connection could be established.
    fn connect(&self, settings: &serde_json::Value) -> Option<(Arc<dyn RemoteFilesystem>, String)>;
}

/// Metadata about a registered connector for UI discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorInfo {
    pub type_id: String,
    pub display_name: String,
}

struct RegistryEntry {
    info: ConnectorInfo,
    factory: ConnectorFactory,
}

/// Runtime registry of available backend connectors.
///
/// Hosts register connector factories at startup; the registry provides
/// discovery (listing types for a selection combo) and creation.
pub struct ConnectorRegistry {
    factories: HashMap<String, RegistryEntry>,
    /// Insertion order for deterministic iteration.
    order: Vec<String>,
}

impl ConnectorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a connector factory under the given identifier.
    ///
    /// The `factory` is called each time [`create()`](Self::create) is
    /// invoked for this `type_id`.
    pub fn register(&mut self, type_id: &str, display_name: &str, factory: ConnectorFactory) {
        let info = ConnectorInfo {
            type_id: type_id.to_string(),
            display_name: display_name.to_string(),
        };
        if !self.factories.contains_key(type_id) {
            self.order.push(type_id.to_string());
        }
        self.factories
            .insert(type_id.to_string(), RegistryEntry { info, factory });
    }

    /// List all registered connectors in registration order.
    pub fn available_types(&self) -> Vec<ConnectorInfo> {
        self.order
            .iter()
            .filter_map(|id| self.factories.get(id).map(|e| e.info.clone()))
            .collect()
    }

    /// Create a new connector instance by type ID.
    pub fn create(&self, type_id: &str) -> Result<Box<dyn Connector>, BrowserError> {
        self.factories
            .get(type_id)
            .map(|entry| (entry.factory)())
            .ok_or_else(|| BrowserError::Config(format!("Unknown backend type: {type_id}")))
    }

    /// Check whether a backend type is registered.
    pub fn has_type(&self, type_id: &str) -> bool {
        self.factories.contains_key(type_id)
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a registry with the built-in backends registered.
pub fn default_registry() -> ConnectorRegistry {
    #[allow(unused_mut)]
    let mut registry = ConnectorRegistry::new();
    #[cfg(feature = "ssh")]
    registry.register(
        "sshfs",
        "SSH",
        Box::new(|| Box::new(crate::backends::ssh::SshConnector::new())),
    );
    #[cfg(feature = "s3")]
    registry.register(
        "s3fs",
        "S3",
        Box::new(|| Box::new(crate::backends::s3::S3Connector::new())),
    );
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal mock connector for registry tests.
    struct MockConnector {
        id: &'static str,
    }

    impl Connector for MockConnector {
        fn type_id(&self) -> &str {
            self.id
        }
        fn display_name(&self) -> &str {
            "Mock"
        }
        fn connect(
            &self,
            _settings: &serde_json::Value,
        ) -> Option<(Arc<dyn RemoteFilesystem>, String)> {
            None
        }
    }

    fn mock_factory(id: &'static str) -> ConnectorFactory {
        Box::new(move || Box::new(MockConnector { id }))
    }

    #[test]
    fn register_and_create() {
        let mut registry = ConnectorRegistry::new();
        registry.register("mock", "Mock", mock_factory("mock"));

        let conn = registry.create("mock").unwrap();
        assert_eq!(conn.type_id(), "mock");
        assert_eq!(conn.display_name(), "Mock");
    }

    #[test]
    fn unknown_type_returns_error() {
        let registry = ConnectorRegistry::new();
        match registry.create("nonexistent") {
            Err(err) => {
                let msg = err.to_string();
                assert!(msg.contains("Unknown backend type"));
                assert!(msg.contains("nonexistent"));
            }
            Ok(_) => panic!("expected error for unknown type"),
        }
    }

    #[test]
    fn available_types_preserves_registration_order() {
        let mut registry = ConnectorRegistry::new();
        registry.register("c", "C", mock_factory("c"));
        registry.register("a", "A", mock_factory("a"));
        registry.register("b", "B", mock_factory("b"));

        let ids: Vec<String> = registry
            .available_types()
            .into_iter()
            .map(|t| t.type_id)
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn has_type_returns_correct_results() {
        let mut registry = ConnectorRegistry::new();
        registry.register("sshfs", "SSH", mock_factory("sshfs"));

        assert!(registry.has_type("sshfs"));
        assert!(!registry.has_type("s3fs"));
    }

    #[test]
    fn failed_connect_is_none_not_panic() {
        let registry_entry = MockConnector { id: "mock" };
        assert!(registry_entry.connect(&serde_json::json!({})).is_none());
    }

    #[cfg(all(feature = "ssh", feature = "s3"))]
    #[test]
    fn default_registry_has_builtin_backends() {
        let registry = default_registry();
        assert!(registry.has_type("sshfs"));
        assert!(registry.has_type("s3fs"));

        let ids: Vec<String> = registry
            .available_types()
            .into_iter()
            .map(|t| t.type_id)
            .collect();
        assert_eq!(ids, vec!["sshfs", "s3fs"]);
    }
}
