//! GraphQL-over-HTTP transport
//!
//! Provides the `Transport` seam used by the client and a `reqwest`
//! implementation that handles:
//! - API key placement in the `Authorization` header
//! - Client-side rate limiting
//! - Classification of HTTP failures vs. GraphQL `errors` payloads
//!
//! Requests are never retried here; a failure is surfaced once.

use super::rate_limit::RateLimiter;
use crate::config::ClientConfig;
use crate::error::{Error, GraphQlError, Result};
use crate::types::{JsonValue, Variables};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Body of a GraphQL POST request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQlRequest {
    /// Document text
    pub query: String,
    /// Variable bindings
    pub variables: Variables,
    /// Operation to run when the document holds several
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl GraphQlRequest {
    /// Create a request for a document and its variables
    pub fn new(query: impl Into<String>, variables: Variables) -> Self {
        Self {
            query: query.into(),
            variables,
            operation_name: None,
        }
    }

    /// Set the operation name
    #[must_use]
    pub fn operation(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// Decoded GraphQL response envelope
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GraphQlResponse {
    /// Result data, absent on request-level failures
    #[serde(default)]
    pub data: Option<JsonValue>,
    /// Server-reported errors
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

impl GraphQlResponse {
    /// Response carrying only data
    pub fn from_data(data: JsonValue) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// True when the server reported at least one error
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Data on success, `Error::GraphQl` when errors were reported
    pub fn into_result(self) -> Result<Option<JsonValue>> {
        match self.errors {
            Some(errors) if !errors.is_empty() => Err(Error::GraphQl(errors)),
            _ => Ok(self.data),
        }
    }
}

/// Sends one GraphQL request and decodes the envelope
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `request` to `endpoint`, authenticating with `api_key`
    async fn post(
        &self,
        endpoint: &str,
        api_key: &str,
        request: &GraphQlRequest,
    ) -> Result<GraphQlResponse>;
}

/// `reqwest`-backed transport
pub struct HttpTransport {
    client: Client,
    rate_limiter: Option<RateLimiter>,
}

impl HttpTransport {
    /// Build a transport from the client configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent())
            .build()?;

        Ok(Self::with_client(
            client,
            config.rate_limit.as_ref().map(RateLimiter::new),
        ))
    }

    /// Wrap an existing `reqwest` client
    pub fn with_client(client: Client, rate_limiter: Option<RateLimiter>) -> Self {
        Self {
            client,
            rate_limiter,
        }
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        endpoint: &str,
        api_key: &str,
        request: &GraphQlRequest,
    ) -> Result<GraphQlResponse> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        debug!(
            endpoint,
            operation = request.operation_name.as_deref().unwrap_or(""),
            variables = request.variables.len(),
            "Sending GraphQL request"
        );

        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed = serde_json::from_str::<GraphQlResponse>(&body);

        if !status.is_success() {
            // Validation failures often come back as 400 with a GraphQL body
            if let Ok(envelope) = parsed {
                if envelope.has_errors() {
                    return Ok(envelope);
                }
            }
            warn!("GraphQL endpoint answered {}", status.as_u16());
            return Err(Error::http_status(status.as_u16(), body));
        }

        Ok(parsed?)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}
