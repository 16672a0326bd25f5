//! Connectors module
//!
//! Clients for the remote diagnostic API at three integration levels:
//! - [`BasicConnector`]: raw query parameters and JSON bodies
//! - [`StandardConnector`]: typed parameters, JSON responses
//! - [`ModelConnector`]: typed parameters and typed response models
//!
//! Each level wraps the one below it. The [`Registry`] stores configured
//! connectors by alias.

pub mod basic;
pub mod metadata;
pub mod model;
pub mod registry;
pub mod standard;
pub mod transport;

pub use basic::{BasicConnector, ConnectorOptions, DEFAULT_API_ENDPOINT, RequestOptions};
pub use metadata::{ApiDefinitions, ApiMethod, ApiVersion, ConnectorKind, IntegrationLevel};
pub use model::ModelConnector;
pub use registry::{ConfigurationEntry, Connector, DEFAULT_ALIAS, Registration, Registry};
pub use standard::{DEFAULT_MAX_RESULTS, StandardConnector};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
