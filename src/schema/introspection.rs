//! Introspection fetch and the schema cache
//!
//! The type map is fetched once per `SchemaCache` and reused. Concurrent
//! callers queue on the cache lock, so only one introspection request is
//! in flight and everyone else receives its result. Failures are not
//! cached; the next caller retries.

use super::types::SchemaTypeMap;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{GraphQlRequest, Transport};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Operation name sent with the introspection document
pub const INTROSPECTION_OPERATION: &str = "IntrospectionQuery";

/// Introspection document restricted to what pagination detection reads
pub const INTROSPECTION_QUERY: &str = r"query IntrospectionQuery {
  __schema {
    queryType { name }
    types {
      kind
      name
      fields(includeDeprecated: true) {
        name
        args { name type { ...TypeRef } }
        type { ...TypeRef }
      }
      inputFields { name type { ...TypeRef } }
    }
  }
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType { kind name }
      }
    }
  }
}";

/// Fetch and decode the type map
pub async fn fetch_type_map(
    transport: &dyn Transport,
    config: &ClientConfig,
) -> Result<SchemaTypeMap> {
    let api_key = config.require_api_key()?;
    let request = GraphQlRequest::new(INTROSPECTION_QUERY, serde_json::Map::new())
        .operation(INTROSPECTION_OPERATION);

    let data = transport
        .post(&config.endpoint, api_key, &request)
        .await?
        .into_result()?
        .ok_or_else(|| Error::introspection("response carried no data"))?;

    let map = SchemaTypeMap::from_introspection(&data)?;
    debug!(types = map.len(), "Fetched schema type map");
    Ok(map)
}

/// Injectable, single-flighted holder for the schema type map
#[derive(Debug, Default)]
pub struct SchemaCache {
    cached: RwLock<Option<Arc<SchemaTypeMap>>>,
}

impl SchemaCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache already holding a type map
    pub fn with_type_map(map: SchemaTypeMap) -> Self {
        Self {
            cached: RwLock::new(Some(Arc::new(map))),
        }
    }

    /// Cached type map, fetching it first if needed
    ///
    /// With `cache_schema` disabled every call fetches, still one at a time.
    pub async fn get(
        &self,
        transport: &dyn Transport,
        config: &ClientConfig,
    ) -> Result<Arc<SchemaTypeMap>> {
        if config.cache_schema {
            let cached = self.cached.read().await;
            if let Some(map) = cached.as_ref() {
                return Ok(Arc::clone(map));
            }
        }

        let mut cached = self.cached.write().await;

        // Another caller may have filled it while we waited for the lock
        if config.cache_schema {
            if let Some(map) = cached.as_ref() {
                return Ok(Arc::clone(map));
            }
        }

        let map = Arc::new(fetch_type_map(transport, config).await?);
        if config.cache_schema {
            *cached = Some(Arc::clone(&map));
        }
        Ok(map)
    }

    /// Check if a type map is held
    pub async fn is_cached(&self) -> bool {
        self.cached.read().await.is_some()
    }

    /// Drop the held type map
    pub async fn clear(&self) {
        *self.cached.write().await = None;
    }
}
