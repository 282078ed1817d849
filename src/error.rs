//! Error types for gql-pager
//!
//! Internal APIs return `Result<T, Error>`. The public fetch entry points
//! never return `Err`: failures are carried on the result as a `FetchError`,
//! which is cheap to clone so a single in-flight result can be shared.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A single entry of a GraphQL `errors` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    /// Error message reported by the server
    pub message: String,
    /// Any other members (`locations`, `path`, `extensions`, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl GraphQlError {
    /// Create an error with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// The main error type for gql-pager
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("No API key provided")]
    MissingApiKey,

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // GraphQL Errors
    // ============================================================================
    #[error("GraphQL request returned {} error(s): {}", .0.len(), join_messages(.0))]
    GraphQl(Vec<GraphQlError>),

    #[error("Failed to parse GraphQL document: {message}")]
    QueryParse { message: String },

    #[error("Introspection failed: {message}")]
    Introspection { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a document parse error
    pub fn query_parse(message: impl Into<String>) -> Self {
        Self::QueryParse {
            message: message.into(),
        }
    }

    /// Create an introspection error
    pub fn introspection(message: impl Into<String>) -> Self {
        Self::Introspection {
            message: message.into(),
        }
    }

    /// Check if this error happened before anything was sent
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::Config { .. } | Error::MissingApiKey | Error::InvalidUrl(_)
        )
    }
}

fn join_messages(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for gql-pager
pub type Result<T> = std::result::Result<T, Error>;

/// Failure carried on a fetch result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Nothing was sent: the client is not configured
    #[error("{0}")]
    Config(String),

    /// The request could not be completed
    #[error("{0}")]
    Transport(String),

    /// The server answered with a GraphQL `errors` array
    #[error("{}", join_messages(.0))]
    GraphQl(Vec<GraphQlError>),
}

impl FetchError {
    /// GraphQL errors, if this is a server-side failure
    pub fn graphql_errors(&self) -> Option<&[GraphQlError]> {
        match self {
            FetchError::GraphQl(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<Error> for FetchError {
    fn from(err: Error) -> Self {
        match err {
            Error::GraphQl(errors) => FetchError::GraphQl(errors),
            e if e.is_config() => FetchError::Config(e.to_string()),
            e => FetchError::Transport(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        assert_eq!(Error::MissingApiKey.to_string(), "No API key provided");

        let err = Error::http_status(502, "Bad gateway");
        assert_eq!(err.to_string(), "HTTP 502: Bad gateway");

        let err = Error::GraphQl(vec![
            GraphQlError::new("first"),
            GraphQlError::new("second"),
        ]);
        assert_eq!(
            err.to_string(),
            "GraphQL request returned 2 error(s): first; second"
        );
    }

    #[test]
    fn test_fetch_error_taxonomy() {
        assert!(matches!(
            FetchError::from(Error::MissingApiKey),
            FetchError::Config(_)
        ));
        assert!(matches!(
            FetchError::from(Error::http_status(500, "")),
            FetchError::Transport(_)
        ));

        let errors = vec![GraphQlError::new("Cannot query field \"unknownField\"")];
        let fetch_error = FetchError::from(Error::GraphQl(errors.clone()));
        assert_eq!(fetch_error.graphql_errors(), Some(errors.as_slice()));
    }

    #[test]
    fn test_graphql_error_keeps_extra_members() {
        let error: GraphQlError = serde_json::from_value(serde_json::json!({
            "message": "boom",
            "path": ["erc20"],
        }))
        .unwrap();
        assert_eq!(error.message, "boom");
        assert_eq!(error.extra["path"], serde_json::json!(["erc20"]));
    }
}
