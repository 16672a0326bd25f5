//! # Error Handling
//!
//! This module provides the unified error type for the diagnostic API client.
//! Every failure is surfaced to the immediate caller; nothing in this crate
//! retries, recovers, or falls back.

use std::fmt;

use thiserror::Error;

use crate::connectors::{ApiMethod, ApiVersion, ConnectorKind, IntegrationLevel};

/// Maximum number of characters of a response body rendered in error messages.
const BODY_SNIPPET_CHARS: usize = 200;

/// Unified error type for connector, registry, and usage failures
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", missing_configuration_message(.alias))]
    MissingConfiguration { alias: Option<String> },
    #[error("mandatory credential '{field}' is missing")]
    MissingCredential { field: &'static str },
    #[error("invalid API endpoint '{value}': {source}")]
    InvalidEndpoint {
        value: String,
        source: url::ParseError,
    },
    #[error("no API definition available for version '{version}'")]
    MissingApiDefinition { version: String },

    #[error("transport error: {details}")]
    Transport { details: String, timed_out: bool },

    #[error("400 Bad Request. {0}")]
    BadRequest(ResponseError),
    #[error("401 Unauthorized. {0}")]
    Unauthorized(ResponseError),
    #[error("403 Forbidden. {0}")]
    Forbidden(ResponseError),
    #[error("404 Not Found. {0}")]
    NotFound(ResponseError),
    #[error("405 Method Not Allowed. {0}")]
    MethodNotAllowed(ResponseError),
    #[error("Server error. {0}")]
    ServerError(ResponseError),
    #[error("Unexpected response. {0}")]
    UnexpectedStatus(ResponseError),
    #[error("failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("method '{method}' is not available in the {version} API version")]
    MethodNotAvailable {
        version: ApiVersion,
        method: ApiMethod,
    },
    #[error("invalid age unit: '{value}'")]
    InvalidAgeUnit { value: String },
    #[error("invalid search concept type: '{value}'")]
    InvalidSearchConceptType { value: String },
    #[error("invalid concept type: '{value}'")]
    InvalidConceptType { value: String },
    #[error("invalid evidence '{value}': {reason}")]
    InvalidEvidence { value: String, reason: String },
    #[error("invalid sex: '{value}'")]
    InvalidSex { value: String },
    #[error("connector '{}' does not provide the {required} integration level", .actual.name())]
    UnsupportedIntegrationLevel {
        required: IntegrationLevel,
        actual: ConnectorKind,
    },
}

fn missing_configuration_message(alias: &Option<String>) -> String {
    match alias {
        Some(alias) => format!("API credentials for alias '{}' have not been configured", alias),
        None => "API credentials have not been configured".to_string(),
    }
}

/// Broad error classes used by callers that only need to branch on the kind of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Transport,
    Response,
    Usage,
}

impl ErrorCategory {
    /// Get the error code string for this category
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "CONFIGURATION_ERROR",
            ErrorCategory::Transport => "TRANSPORT_ERROR",
            ErrorCategory::Response => "API_RESPONSE_ERROR",
            ErrorCategory::Usage => "USAGE_ERROR",
        }
    }
}

/// Details of a non-successful HTTP response returned by the remote API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseError {
    pub status: u16,
    pub reason: Option<String>,
    pub body: String,
}

impl ResponseError {
    pub fn new(status: u16, reason: Option<String>, body: String) -> Self {
        Self {
            status,
            reason,
            body,
        }
    }

    /// Response body truncated on a character boundary for display purposes
    pub fn body_snippet(&self) -> String {
        if self.body.chars().count() > BODY_SNIPPET_CHARS {
            let truncated: String = self.body.chars().take(BODY_SNIPPET_CHARS).collect();
            format!("{}...", truncated)
        } else {
            self.body.clone()
        }
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Response status: {}.", self.status)?;
        if let Some(reason) = &self.reason {
            write!(f, " Reason: {}.", reason)?;
        }
        if !self.body.is_empty() {
            write!(f, " Error message: {}", self.body_snippet())?;
        }
        Ok(())
    }
}

impl ApiError {
    /// Map an HTTP status to its error kind. Returns `None` for 2xx statuses.
    pub fn from_status(status: u16, reason: Option<String>, body: String) -> Option<Self> {
        if (200..=299).contains(&status) {
            return None;
        }
        Some(Self::for_status(status, reason, body))
    }

    /// Map a non-2xx HTTP status to its error kind
    pub fn for_status(status: u16, reason: Option<String>, body: String) -> Self {
        let response = ResponseError::new(status, reason, body);
        match status {
            400 => ApiError::BadRequest(response),
            401 => ApiError::Unauthorized(response),
            403 => ApiError::Forbidden(response),
            404 => ApiError::NotFound(response),
            405 => ApiError::MethodNotAllowed(response),
            500..=599 => ApiError::ServerError(response),
            _ => ApiError::UnexpectedStatus(response),
        }
    }

    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::MissingConfiguration { .. }
            | ApiError::MissingCredential { .. }
            | ApiError::InvalidEndpoint { .. }
            | ApiError::MissingApiDefinition { .. } => ErrorCategory::Configuration,
            ApiError::Transport { .. } => ErrorCategory::Transport,
            ApiError::BadRequest(_)
            | ApiError::Unauthorized(_)
            | ApiError::Forbidden(_)
            | ApiError::NotFound(_)
            | ApiError::MethodNotAllowed(_)
            | ApiError::ServerError(_)
            | ApiError::UnexpectedStatus(_)
            | ApiError::Decode(_) => ErrorCategory::Response,
            ApiError::MethodNotAvailable { .. }
            | ApiError::InvalidAgeUnit { .. }
            | ApiError::InvalidSearchConceptType { .. }
            | ApiError::InvalidConceptType { .. }
            | ApiError::InvalidEvidence { .. }
            | ApiError::InvalidSex { .. }
            | ApiError::UnsupportedIntegrationLevel { .. } => ErrorCategory::Usage,
        }
    }

    /// Response details, present for errors produced from an HTTP status
    pub fn response(&self) -> Option<&ResponseError> {
        match self {
            ApiError::BadRequest(response)
            | ApiError::Unauthorized(response)
            | ApiError::Forbidden(response)
            | ApiError::NotFound(response)
            | ApiError::MethodNotAllowed(response)
            | ApiError::ServerError(response)
            | ApiError::UnexpectedStatus(response) => Some(response),
            _ => None,
        }
    }

    /// HTTP status of the failed response, if any
    pub fn status(&self) -> Option<u16> {
        self.response().map(|response| response.status)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        ApiError::Transport {
            timed_out: error.is_timeout(),
            details: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (400, "BadRequest"),
            (401, "Unauthorized"),
            (403, "Forbidden"),
            (404, "NotFound"),
            (405, "MethodNotAllowed"),
            (500, "ServerError"),
            (503, "ServerError"),
            (599, "ServerError"),
            (418, "UnexpectedStatus"),
            (302, "UnexpectedStatus"),
        ];

        for (status, expected) in cases {
            let error = ApiError::from_status(status, None, "body".to_string())
                .expect("non-2xx status maps to an error");
            let actual = match error {
                ApiError::BadRequest(_) => "BadRequest",
                ApiError::Unauthorized(_) => "Unauthorized",
                ApiError::Forbidden(_) => "Forbidden",
                ApiError::NotFound(_) => "NotFound",
                ApiError::MethodNotAllowed(_) => "MethodNotAllowed",
                ApiError::ServerError(_) => "ServerError",
                ApiError::UnexpectedStatus(_) => "UnexpectedStatus",
                other => panic!("unexpected variant {:?}", other),
            };
            assert_eq!(actual, expected, "status {}", status);
            assert_eq!(error_status(status), Some(status));
        }
    }

    fn error_status(status: u16) -> Option<u16> {
        ApiError::from_status(status, None, String::new()).and_then(|e| e.status())
    }

    #[test]
    fn test_success_statuses_are_not_errors() {
        for status in [200, 201, 204, 299] {
            assert!(ApiError::from_status(status, None, String::new()).is_none());
        }
    }

    #[test]
    fn test_response_error_carries_status_and_body() {
        let error = ApiError::from_status(
            401,
            Some("Unauthorized".to_string()),
            r#"{"message":"invalid app key"}"#.to_string(),
        )
        .unwrap();

        assert_eq!(error.category(), ErrorCategory::Response);
        let response = error.response().unwrap();
        assert_eq!(response.status, 401);
        assert_eq!(response.body, r#"{"message":"invalid app key"}"#);

        let message = error.to_string();
        assert!(message.contains("Response status: 401."));
        assert!(message.contains("Reason: Unauthorized."));
        assert!(message.contains("invalid app key"));
    }

    #[test]
    fn test_missing_configuration_messages() {
        let aliased = ApiError::MissingConfiguration {
            alias: Some("pl".to_string()),
        };
        assert_eq!(
            aliased.to_string(),
            "API credentials for alias 'pl' have not been configured"
        );

        let default = ApiError::MissingConfiguration { alias: None };
        assert_eq!(default.to_string(), "API credentials have not been configured");
        assert_eq!(default.category(), ErrorCategory::Configuration);
        assert_eq!(default.category().error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_usage_error_category() {
        let error = ApiError::MethodNotAvailable {
            version: ApiVersion::V3,
            method: ApiMethod::RedFlags,
        };
        assert_eq!(error.category(), ErrorCategory::Usage);
        assert_eq!(
            error.to_string(),
            "method 'red_flags' is not available in the v3 API version"
        );
    }

    #[test]
    fn test_utf8_safe_truncation() {
        let body = "zażółć gęślą jaźń 🚑 ".repeat(30);
        let response = ResponseError::new(500, None, body.clone());

        let snippet = response.body_snippet();
        assert!(snippet.ends_with("..."));
        assert_eq!(snippet.chars().count(), BODY_SNIPPET_CHARS + 3);
        assert!(snippet.starts_with("zażółć gęślą jaźń 🚑"));
        assert!(body.starts_with(snippet.trim_end_matches("...")));
    }
}
