//! # Infermedica API Client Library
//!
//! Client for the Infermedica medical diagnosis API. Connectors come in three
//! integration levels (basic, standard, model) for API versions v2 and v3 and
//! are kept in an alias-keyed [`Registry`] built from configuration.

pub mod config;
pub mod connectors;
pub mod error;
pub mod models;
pub mod telemetry;

pub use config::{AppConfig, ConfigLoader};
pub use connectors::{
    BasicConnector, Connector, ConnectorKind, ConnectorOptions, ModelConnector, Registry,
    RequestOptions, StandardConnector,
};
pub use error::ApiError;
