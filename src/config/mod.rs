//! Configuration loading for the diagnostic API client.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `INFERMEDICA_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connectors::{
    ApiVersion, ConnectorKind, ConnectorOptions, IntegrationLevel, Registration,
};
use crate::error::ApiError;

const ENV_PREFIX: &str = "INFERMEDICA_";
const ALIAS_PREFIX: &str = "ALIAS_";
const REDACTED: &str = "[REDACTED]";

/// Settings accepted in `INFERMEDICA_ALIAS_<NAME>_<SETTING>`
const ALIAS_SETTINGS: [&str; 8] = [
    "APP_ID",
    "APP_KEY",
    "ENDPOINT",
    "API_VERSION",
    "LEVEL",
    "MODEL",
    "DEV_MODE",
    "DEFAULT",
];

/// Application configuration derived from `INFERMEDICA_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_version: ApiVersion,
    #[serde(default)]
    pub integration_level: IntegrationLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub dev_mode: bool,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Named connector configurations, keyed by lowercase alias
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, AliasConfig>,
}

/// Alias-specific overrides. Unset values inherit from the base configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AliasConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<ApiVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_level: Option<IntegrationLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_mode: Option<bool>,
    #[serde(default)]
    pub default: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            app_id: None,
            app_key: None,
            endpoint: None,
            api_version: ApiVersion::default(),
            integration_level: IntegrationLevel::default(),
            model: None,
            dev_mode: false,
            request_timeout_ms: default_request_timeout_ms(),
            aliases: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Returns a redacted JSON representation (secrets are redacted).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        if config.app_key.is_some() {
            config.app_key = Some(REDACTED.to_string());
        }
        for alias in config.aliases.values_mut() {
            if alias.app_key.is_some() {
                alias.app_key = Some(REDACTED.to_string());
            }
        }
        serde_json::to_string_pretty(&config)
    }

    /// Validates value ranges that cannot be expressed by parsing alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        if !(MIN_REQUEST_TIMEOUT_MS..=MAX_REQUEST_TIMEOUT_MS).contains(&self.request_timeout_ms) {
            return Err(ConfigError::InvalidRequestTimeout {
                value: self.request_timeout_ms,
            });
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn alias_config(&self, alias: Option<&str>) -> Result<Option<&AliasConfig>, ApiError> {
        match alias {
            None => Ok(None),
            Some(name) => self
                .aliases
                .get(&name.to_ascii_lowercase())
                .map(Some)
                .ok_or_else(|| ApiError::MissingConfiguration {
                    alias: Some(name.to_string()),
                }),
        }
    }

    /// Connector kind of the base configuration or of a configured alias
    pub fn connector_kind(&self, alias: Option<&str>) -> Result<ConnectorKind, ApiError> {
        let overrides = self.alias_config(alias)?;
        let level = overrides
            .and_then(|alias| alias.integration_level)
            .unwrap_or(self.integration_level);
        let version = overrides
            .and_then(|alias| alias.api_version)
            .unwrap_or(self.api_version);
        Ok(ConnectorKind::from_parts(level, version))
    }

    /// Connector options of the base configuration or of a configured alias.
    /// Builder calls made on the result override the configured values.
    pub fn connector_options(&self, alias: Option<&str>) -> Result<ConnectorOptions, ApiError> {
        let overrides = self.alias_config(alias)?;
        let pick = |alias_value: Option<&String>, base: &Option<String>| {
            alias_value.or(base.as_ref()).cloned()
        };

        let mut options = ConnectorOptions::new()
            .api_version(self.connector_kind(alias)?.version())
            .timeout(self.request_timeout())
            .dev_mode(
                overrides
                    .and_then(|alias| alias.dev_mode)
                    .unwrap_or(self.dev_mode),
            );

        if let Some(app_id) = pick(overrides.and_then(|a| a.app_id.as_ref()), &self.app_id) {
            options = options.app_id(app_id);
        }
        if let Some(app_key) = pick(overrides.and_then(|a| a.app_key.as_ref()), &self.app_key) {
            options = options.app_key(app_key);
        }
        if let Some(endpoint) = pick(overrides.and_then(|a| a.endpoint.as_ref()), &self.endpoint)
        {
            options = options.endpoint(endpoint);
        }
        if let Some(model) = pick(overrides.and_then(|a| a.model.as_ref()), &self.model) {
            options = options.model(model);
        }

        Ok(options)
    }

    /// Registry registration for the base configuration or a configured alias
    pub fn registration(&self, alias: Option<&str>) -> Result<Registration, ApiError> {
        let mut registration = Registration::new(self.connector_options(alias)?)
            .kind(self.connector_kind(alias)?);
        if let Some(name) = alias {
            let is_default = self.alias_config(alias)?.is_some_and(|alias| alias.default);
            registration = registration
                .alias(name.to_ascii_lowercase())
                .default(is_default);
        }
        Ok(registration)
    }
}

const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
const MAX_REQUEST_TIMEOUT_MS: u64 = 300_000;

fn default_profile() -> String {
    "local".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid API version '{value}' for {key}; expected v2 or v3")]
    InvalidApiVersion { key: String, value: String },
    #[error("invalid integration level '{value}' for {key}; expected basic, standard or model")]
    InvalidIntegrationLevel { key: String, value: String },
    #[error("invalid boolean '{value}' for {key}")]
    InvalidBoolean { key: String, value: String },
    #[error("log format must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { value: String },
    #[error("request timeout must be between 100 and 300000 milliseconds, got {value}")]
    InvalidRequestTimeout { value: u64 },
    #[error("invalid number '{value}' for {key}")]
    InvalidNumber { key: String, value: String },
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|val| {
        let trimmed = val.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean {
            key: format!("{ENV_PREFIX}{key}"),
            value: value.to_string(),
        }),
    }
}

fn parse_api_version(key: &str, value: &str) -> Result<ApiVersion, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidApiVersion {
            key: format!("{ENV_PREFIX}{key}"),
            value: value.to_string(),
        })
}

fn parse_level(key: &str, value: &str) -> Result<IntegrationLevel, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidIntegrationLevel {
            key: format!("{ENV_PREFIX}{key}"),
            value: value.to_string(),
        })
}

/// Split `<NAME>_<SETTING>` on the longest known setting suffix.
fn split_alias_key(rest: &str) -> Option<(String, &'static str)> {
    ALIAS_SETTINGS.iter().find_map(|setting| {
        rest.strip_suffix(setting)
            .and_then(|name| name.strip_suffix('_'))
            .filter(|name| !name.is_empty())
            .map(|name| (name.to_ascii_lowercase(), *setting))
    })
}

/// Loads configuration using layered `.env` files and `INFERMEDICA_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads configuration. Later layers win: `.env`, `.env.local`,
    /// `.env.<profile>`, `.env.<profile>.local`, then the process environment.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = non_empty(layered.remove("PROFILE")).unwrap_or(profile_hint);
        let log_level = non_empty(layered.remove("LOG_LEVEL")).unwrap_or_else(default_log_level);
        let log_format = non_empty(layered.remove("LOG_FORMAT"))
            .map(|format| format.to_ascii_lowercase())
            .unwrap_or_else(default_log_format);

        let app_id = non_empty(layered.remove("APP_ID"));
        let app_key = non_empty(layered.remove("APP_KEY"));
        let endpoint = non_empty(layered.remove("ENDPOINT"));
        let model = non_empty(layered.remove("MODEL"));

        let api_version = match non_empty(layered.remove("API_VERSION")) {
            Some(value) => parse_api_version("API_VERSION", &value)?,
            None => ApiVersion::default(),
        };
        let integration_level = match non_empty(layered.remove("LEVEL")) {
            Some(value) => parse_level("LEVEL", &value)?,
            None => IntegrationLevel::default(),
        };
        let dev_mode = match layered.remove("DEV_MODE") {
            Some(value) => parse_bool("DEV_MODE", &value)?,
            None => false,
        };
        let request_timeout_ms = match non_empty(layered.remove("REQUEST_TIMEOUT_MS")) {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidNumber {
                key: format!("{ENV_PREFIX}REQUEST_TIMEOUT_MS"),
                value,
            })?,
            None => default_request_timeout_ms(),
        };

        let aliases = Self::collect_aliases(&layered)?;

        let config = AppConfig {
            profile,
            log_level,
            log_format,
            app_id,
            app_key,
            endpoint,
            api_version,
            integration_level,
            model,
            dev_mode,
            request_timeout_ms,
            aliases,
        };

        config.validate()?;
        Ok(config)
    }

    fn collect_aliases(
        layered: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, AliasConfig>, ConfigError> {
        let mut aliases = BTreeMap::new();

        // Expected format: ALIAS_<NAME>_<SETTING>
        for (key, value) in layered {
            let Some(rest) = key.strip_prefix(ALIAS_PREFIX) else {
                continue;
            };
            let Some((name, setting)) = split_alias_key(rest) else {
                continue;
            };

            let alias: &mut AliasConfig = aliases.entry(name).or_default();
            let value = value.trim();
            match setting {
                "APP_ID" => alias.app_id = non_empty(Some(value.to_string())),
                "APP_KEY" => alias.app_key = non_empty(Some(value.to_string())),
                "ENDPOINT" => alias.endpoint = non_empty(Some(value.to_string())),
                "MODEL" => alias.model = non_empty(Some(value.to_string())),
                "API_VERSION" if !value.is_empty() => {
                    alias.api_version = Some(parse_api_version(key, value)?);
                }
                "LEVEL" if !value.is_empty() => {
                    alias.integration_level = Some(parse_level(key, value)?);
                }
                "DEV_MODE" if !value.is_empty() => {
                    alias.dev_mode = Some(parse_bool(key, value)?);
                }
                "DEFAULT" => alias.default = parse_bool(key, value)?,
                _ => {}
            }
        }

        Ok(aliases)
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = non_empty(env::var(format!("{ENV_PREFIX}PROFILE")).ok())
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_alias_key() {
        assert_eq!(
            split_alias_key("PL_APP_KEY"),
            Some(("pl".to_string(), "APP_KEY"))
        );
        assert_eq!(
            split_alias_key("EN_US_API_VERSION"),
            Some(("en_us".to_string(), "API_VERSION"))
        );
        assert_eq!(split_alias_key("DE_DEFAULT"), Some(("de".to_string(), "DEFAULT")));
        assert_eq!(split_alias_key("_APP_ID"), None);
        assert_eq!(split_alias_key("PL_UNKNOWN"), None);
    }

    #[test]
    fn test_alias_inherits_base_values() {
        let mut config = AppConfig {
            app_id: Some("base-id".to_string()),
            app_key: Some("base-key".to_string()),
            model: Some("infermedica-en".to_string()),
            ..AppConfig::default()
        };
        config.aliases.insert(
            "pl".to_string(),
            AliasConfig {
                app_key: Some("pl-key".to_string()),
                model: Some("infermedica-pl".to_string()),
                api_version: Some(ApiVersion::V2),
                integration_level: Some(IntegrationLevel::Model),
                ..AliasConfig::default()
            },
        );

        assert_eq!(
            config.connector_kind(Some("PL")).unwrap(),
            ConnectorKind::ModelV2
        );
        assert_eq!(config.connector_kind(None).unwrap(), ConnectorKind::StandardV3);

        let rendered = format!("{:?}", config.connector_options(Some("pl")).unwrap());
        assert!(rendered.contains("base-id"));
        assert!(rendered.contains("infermedica-pl"));
        assert!(!rendered.contains("pl-key"));

        assert!(matches!(
            config.connector_options(Some("de")),
            Err(ApiError::MissingConfiguration { alias: Some(alias) }) if alias == "de"
        ));
    }

    #[test]
    fn test_registration_carries_alias_default_flag() {
        let mut config = AppConfig::default();
        config.aliases.insert(
            "en".to_string(),
            AliasConfig {
                default: true,
                ..AliasConfig::default()
            },
        );

        let registration = config.registration(Some("en")).unwrap();
        assert_eq!(registration.alias.as_deref(), Some("en"));
        assert!(registration.default);

        let base = config.registration(None).unwrap();
        assert!(base.alias.is_none());
        assert!(!base.default);
    }

    #[test]
    fn test_validate_bounds() {
        let config = AppConfig {
            request_timeout_ms: 50,
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRequestTimeout { value: 50 })
        ));

        let config = AppConfig {
            log_format: "xml".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLogFormat { .. })
        ));

        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_redacted_json_hides_app_keys() {
        let mut config = AppConfig {
            app_id: Some("visible-id".to_string()),
            app_key: Some("secret-key".to_string()),
            ..AppConfig::default()
        };
        config.aliases.insert(
            "pl".to_string(),
            AliasConfig {
                app_key: Some("secret-pl-key".to_string()),
                ..AliasConfig::default()
            },
        );

        let json = config.redacted_json().unwrap();
        assert!(json.contains("visible-id"));
        assert!(!json.contains("secret-key"));
        assert!(!json.contains("secret-pl-key"));
        assert!(json.contains(REDACTED));
    }
}
