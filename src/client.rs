//! GraphQL client
//!
//! The two public entry points live here:
//! - `fetch_query` sends a document as written, once
//! - `fetch_query_with_pagination` augments the document, fetches the
//!   first page and returns a `Session` for navigating further
//!
//! Neither returns `Err`; failures travel on the result.

use crate::config::ClientConfig;
use crate::error::{FetchError, Result};
use crate::http::{GraphQlRequest, HttpTransport, Transport};
use crate::pagination::Session;
use crate::query::augment_query;
use crate::schema::SchemaCache;
use crate::types::{JsonValue, Variables};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of a single-shot query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    /// Response data, `None` on failure
    pub data: Option<JsonValue>,
    /// Failure, if any
    pub error: Option<FetchError>,
}

impl QueryResponse {
    fn from_result(result: Result<Option<JsonValue>>) -> Self {
        match result {
            Ok(data) => Self { data, error: None },
            Err(e) => Self {
                data: None,
                error: Some(e.into()),
            },
        }
    }
}

struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    schema: Arc<SchemaCache>,
}

/// GraphQL client; cheap to clone
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Create a client talking HTTP to the configured endpoint
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over any transport, with its own schema cache
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self::from_parts(config, transport, Arc::new(SchemaCache::new()))
    }

    /// Create a client from all of its collaborators
    pub fn from_parts(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        schema: Arc<SchemaCache>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                schema,
            }),
        }
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Schema cache used for augmentation
    pub fn schema_cache(&self) -> &Arc<SchemaCache> {
        &self.inner.schema
    }

    /// Send `query` once, without pagination
    pub async fn fetch_query(&self, query: &str, variables: Option<Variables>) -> QueryResponse {
        QueryResponse::from_result(self.execute(query, variables.unwrap_or_default()).await)
    }

    /// Augment `query`, fetch its first page and return the navigation session
    pub async fn fetch_query_with_pagination(
        &self,
        query: &str,
        variables: Option<Variables>,
    ) -> Session {
        let augmented = self.augment(query).await;
        Session::start(self.clone(), augmented, variables.unwrap_or_default()).await
    }

    /// Augment `query` against the schema
    ///
    /// Without an API key, or when the schema cannot be fetched, the query
    /// is returned unchanged.
    pub async fn augment(&self, query: &str) -> String {
        if self.inner.config.require_api_key().is_err() {
            return query.to_string();
        }

        match self
            .inner
            .schema
            .get(self.inner.transport.as_ref(), &self.inner.config)
            .await
        {
            Ok(type_map) => augment_query(query, &type_map),
            Err(e) => {
                warn!("Schema unavailable, sending query without pagination: {e}");
                query.to_string()
            }
        }
    }

    /// One request/response cycle
    pub(crate) async fn execute(&self, query: &str, variables: Variables) -> Result<Option<JsonValue>> {
        let config = &self.inner.config;
        let api_key = config.require_api_key()?;

        debug!(env = %config.env, "Executing query");
        let request = GraphQlRequest::new(query, variables);
        self.inner
            .transport
            .post(&config.endpoint, api_key, &request)
            .await?
            .into_result()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.inner.config.endpoint)
            .field("env", &self.inner.config.env)
            .finish_non_exhaustive()
    }
}
