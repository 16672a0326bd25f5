//! Connector registry
//!
//! In-memory store of named, pre-configured connectors. Application code
//! registers connectors once at startup and looks them up by alias (or takes
//! the default one) instead of passing credentials through every call site.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::connectors::basic::{BasicConnector, ConnectorOptions};
use crate::connectors::metadata::{ConnectorKind, IntegrationLevel};
use crate::connectors::model::ModelConnector;
use crate::connectors::standard::StandardConnector;
use crate::error::ApiError;

/// Key used for registrations made without an alias
pub const DEFAULT_ALIAS: &str = "default";

/// A connector of any integration level
#[derive(Debug, Clone)]
pub enum Connector {
    Basic(Arc<BasicConnector>),
    Standard(StandardConnector),
    Model(ModelConnector),
}

impl Connector {
    /// Build the connector selected by `kind`. The kind's API version takes
    /// precedence over a version set in `options`.
    pub fn build(kind: ConnectorKind, options: ConnectorOptions) -> Result<Self, ApiError> {
        let options = options.api_version(kind.version());
        Ok(match kind.level() {
            IntegrationLevel::Basic => Connector::Basic(Arc::new(BasicConnector::new(options)?)),
            IntegrationLevel::Standard => Connector::Standard(StandardConnector::new(options)?),
            IntegrationLevel::Model => Connector::Model(ModelConnector::new(options)?),
        })
    }

    pub fn kind(&self) -> ConnectorKind {
        self.basic().kind()
    }

    /// Raw-parameter layer, available at every level
    pub fn basic(&self) -> &BasicConnector {
        match self {
            Connector::Basic(basic) => basic,
            Connector::Standard(standard) => standard.basic(),
            Connector::Model(model) => model.standard().basic(),
        }
    }

    /// Typed-parameter layer, available for standard and model connectors
    pub fn standard(&self) -> Result<&StandardConnector, ApiError> {
        match self {
            Connector::Basic(basic) => Err(ApiError::UnsupportedIntegrationLevel {
                required: IntegrationLevel::Standard,
                actual: basic.kind(),
            }),
            Connector::Standard(standard) => Ok(standard),
            Connector::Model(model) => Ok(model.standard()),
        }
    }

    /// Model layer, available for model connectors only
    pub fn model(&self) -> Result<&ModelConnector, ApiError> {
        match self {
            Connector::Model(model) => Ok(model),
            other => Err(ApiError::UnsupportedIntegrationLevel {
                required: IntegrationLevel::Model,
                actual: other.kind(),
            }),
        }
    }
}

impl From<BasicConnector> for Connector {
    fn from(connector: BasicConnector) -> Self {
        Connector::Basic(Arc::new(connector))
    }
}

impl From<StandardConnector> for Connector {
    fn from(connector: StandardConnector) -> Self {
        Connector::Standard(connector)
    }
}

impl From<ModelConnector> for Connector {
    fn from(connector: ModelConnector) -> Self {
        Connector::Model(connector)
    }
}

/// Parameters of a single registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub alias: Option<String>,
    pub default: bool,
    pub kind: ConnectorKind,
    pub options: ConnectorOptions,
}

impl Registration {
    pub fn new(options: ConnectorOptions) -> Self {
        Self {
            alias: None,
            default: false,
            kind: ConnectorKind::default(),
            options,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    pub fn kind(mut self, kind: ConnectorKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Snapshot of one registered configuration
#[derive(Debug, Clone)]
pub struct ConfigurationEntry {
    pub alias: String,
    pub connector: Arc<Connector>,
    pub is_default: bool,
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: HashMap<String, Arc<Connector>>,
    default_alias: Option<String>,
}

/// Registry of connectors keyed by alias
#[derive(Debug, Default)]
pub struct Registry {
    state: RwLock<RegistryState>,
}

/// Aliases are trimmed and matched case-insensitively
fn normalize_alias(alias: Option<&str>) -> Option<String> {
    alias
        .map(str::trim)
        .filter(|alias| !alias.is_empty())
        .map(str::to_ascii_lowercase)
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry populated from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        let registry = Self::new();
        registry.initialize(config)?;
        Ok(registry)
    }

    /// Register the base connector and every configured alias. A base
    /// configuration lacking credentials is logged and skipped; any other
    /// failure, including a configured alias lacking credentials, is returned.
    /// Every connector is built before the first one is stored, so a failure
    /// leaves the registry untouched.
    pub fn initialize(&self, config: &AppConfig) -> Result<(), ApiError> {
        let aliases = config.aliases.keys().map(|name| Some(name.as_str()));
        let mut built = Vec::new();

        for alias in std::iter::once(None).chain(aliases) {
            let registration = config.registration(alias)?;
            match Connector::build(registration.kind, registration.options) {
                Ok(connector) => built.push((registration.alias, registration.default, connector)),
                Err(ApiError::MissingCredential { field }) if alias.is_none() => {
                    warn!(
                        alias = DEFAULT_ALIAS,
                        field, "Base connector not registered: missing credential"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        for (alias, default, connector) in built {
            self.register_connector(alias.as_deref(), default, connector);
        }

        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build a connector and store it. The connector is built before the
    /// registry is locked, so a failed build leaves the registry untouched.
    pub fn register(&self, registration: Registration) -> Result<Arc<Connector>, ApiError> {
        let connector = Connector::build(registration.kind, registration.options)?;
        Ok(self.register_connector(
            registration.alias.as_deref(),
            registration.default,
            connector,
        ))
    }

    /// Store an already built connector. It becomes the default when
    /// `default` is set, when no alias is given, or when the registry is empty.
    pub fn register_connector(
        &self,
        alias: Option<&str>,
        default: bool,
        connector: impl Into<Connector>,
    ) -> Arc<Connector> {
        let alias = normalize_alias(alias);
        let key = alias.clone().unwrap_or_else(|| DEFAULT_ALIAS.to_string());
        let connector = Arc::new(connector.into());

        let is_default = {
            let mut state = self.write();
            let is_default = default || alias.is_none() || state.entries.is_empty();
            state.entries.insert(key.clone(), Arc::clone(&connector));
            if is_default {
                state.default_alias = Some(key.clone());
            }
            is_default
        };

        info!(
            alias = %key,
            kind = %connector.kind(),
            is_default,
            "Registered diagnostic API connector"
        );
        connector
    }

    /// Get the connector registered under `alias`, or the default connector
    /// when no alias is given
    pub fn lookup(&self, alias: Option<&str>) -> Result<Arc<Connector>, ApiError> {
        self.entry(alias).map(|entry| entry.connector)
    }

    /// Get the full configuration entry for `alias` (or the default)
    pub fn entry(&self, alias: Option<&str>) -> Result<ConfigurationEntry, ApiError> {
        let state = self.read();
        let alias = normalize_alias(alias);

        let key = match &alias {
            Some(alias) => alias.clone(),
            None => state
                .default_alias
                .clone()
                .ok_or(ApiError::MissingConfiguration { alias: None })?,
        };

        let connector = state
            .entries
            .get(&key)
            .cloned()
            .ok_or(ApiError::MissingConfiguration { alias })?;

        Ok(ConfigurationEntry {
            is_default: state.default_alias.as_deref() == Some(key.as_str()),
            alias: key,
            connector,
        })
    }

    /// Registered aliases, sorted for stable ordering
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<_> = self.read().entries.keys().cloned().collect();
        aliases.sort();
        aliases
    }

    pub fn default_alias(&self) -> Option<String> {
        self.read().default_alias.clone()
    }

    pub fn contains(&self, alias: &str) -> bool {
        normalize_alias(Some(alias))
            .is_some_and(|alias| self.read().entries.contains_key(&alias))
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(app_key: &str) -> ConnectorOptions {
        ConnectorOptions::new().app_id("app-id").app_key(app_key)
    }

    #[test]
    fn test_registry_unknown_alias() {
        let registry = Registry::new();

        match registry.lookup(Some("unknown")) {
            Err(ApiError::MissingConfiguration { alias }) => {
                assert_eq!(alias.as_deref(), Some("unknown"));
            }
            other => panic!("Expected MissingConfiguration error, got {:?}", other),
        }

        match registry.lookup(None) {
            Err(ApiError::MissingConfiguration { alias }) => assert!(alias.is_none()),
            other => panic!("Expected MissingConfiguration error, got {:?}", other),
        }
        assert!(registry.default_alias().is_none());
    }

    #[test]
    fn test_registry_without_alias_becomes_default() {
        let registry = Registry::new();
        let registered = registry.register(Registration::new(options("key"))).unwrap();

        let found = registry.lookup(None).unwrap();
        assert!(Arc::ptr_eq(&registered, &found));
        assert_eq!(registry.default_alias().as_deref(), Some(DEFAULT_ALIAS));

        let blank = registry.lookup(Some("  ")).unwrap();
        assert!(Arc::ptr_eq(&registered, &blank));
    }

    #[test]
    fn test_registry_explicit_default_demotes_previous() {
        let registry = Registry::new();
        let first = registry
            .register(Registration::new(options("one")).alias("first"))
            .unwrap();
        let second = registry
            .register(Registration::new(options("two")).alias("second").default(true))
            .unwrap();

        assert!(Arc::ptr_eq(&registry.lookup(None).unwrap(), &second));
        assert!(!registry.entry(Some("first")).unwrap().is_default);
        assert!(registry.entry(Some("second")).unwrap().is_default);
        assert!(Arc::ptr_eq(&registry.lookup(Some("first")).unwrap(), &first));
    }

    #[test]
    fn test_registry_alias_lookup_ignores_case() {
        let registry = Registry::new();
        let registered = registry
            .register(Registration::new(options("key")).alias("PL"))
            .unwrap();

        assert_eq!(registry.aliases(), vec!["pl"]);
        assert!(Arc::ptr_eq(&registry.lookup(Some("pl")).unwrap(), &registered));
        assert!(Arc::ptr_eq(&registry.lookup(Some(" Pl ")).unwrap(), &registered));
        assert!(registry.contains("PL"));
        assert_eq!(registry.entry(Some("PL")).unwrap().alias, "pl");
    }

    #[test]
    fn test_registry_list_ordering() {
        let registry = Registry::new();
        for alias in ["zebra", "apple", "banana"] {
            registry
                .register(Registration::new(options("key")).alias(alias))
                .unwrap();
        }

        assert_eq!(registry.aliases(), vec!["apple", "banana", "zebra"]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.default_alias().as_deref(), Some("zebra"));
    }

    #[test]
    fn test_failed_build_leaves_registry_untouched() {
        let registry = Registry::new();
        let err = registry
            .register(
                Registration::new(ConnectorOptions::new().app_id("app-id")).alias("broken"),
            )
            .unwrap_err();

        assert!(matches!(err, ApiError::MissingCredential { field: "app_key" }));
        assert!(registry.is_empty());
        assert!(!registry.contains("broken"));
    }

    #[test]
    fn test_connector_layers_by_kind() {
        let basic = Connector::build(ConnectorKind::BasicV2, options("key")).unwrap();
        assert_eq!(basic.kind(), ConnectorKind::BasicV2);
        assert!(matches!(
            basic.standard(),
            Err(ApiError::UnsupportedIntegrationLevel {
                required: IntegrationLevel::Standard,
                actual: ConnectorKind::BasicV2,
            })
        ));

        let standard = Connector::build(ConnectorKind::StandardV3, options("key")).unwrap();
        assert!(standard.standard().is_ok());
        assert!(standard.model().is_err());

        let model = Connector::build(ConnectorKind::ModelV2, options("key")).unwrap();
        assert_eq!(model.basic().kind(), ConnectorKind::ModelV2);
        assert!(model.standard().is_ok());
        assert!(model.model().is_ok());
    }

    #[test]
    fn test_kind_selects_api_version() {
        let connector = Connector::build(
            ConnectorKind::StandardV2,
            options("key").api_version(crate::connectors::ApiVersion::V3),
        )
        .unwrap();
        assert_eq!(
            connector.basic().api_version(),
            crate::connectors::ApiVersion::V2
        );
    }
}
