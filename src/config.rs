//! Client configuration
//!
//! A `ClientConfig` is built once and handed to a `Client`. It can come
//! from code (`ClientConfig::init`, the builder), a YAML file, or the
//! process environment.

use crate::error::{Error, Result};
use crate::http::RateLimiterConfig;
use crate::types::Env;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the endpoint URL
pub const ENDPOINT_ENV_VAR: &str = "GQL_ENDPOINT";
/// Environment variable holding the API key
pub const API_KEY_ENV_VAR: &str = "GQL_API_KEY";
/// Environment variable holding the env tag
pub const ENV_ENV_VAR: &str = "GQL_ENV";

/// Configuration shared by every request a `Client` makes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// GraphQL endpoint URL
    pub endpoint: String,

    /// API key sent verbatim in the `Authorization` header
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment tag
    #[serde(default)]
    pub env: Env,

    /// Reuse the introspected schema across queries
    #[serde(default = "default_cache_schema")]
    pub cache_schema: bool,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional client-side rate limit
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,
}

fn default_cache_schema() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

impl ClientConfig {
    /// Create a config for an endpoint with no API key
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            env: Env::default(),
            cache_schema: default_cache_schema(),
            timeout_secs: default_timeout_secs(),
            rate_limit: None,
        }
    }

    /// Set the API key and env tag in one step
    #[must_use]
    pub fn init(mut self, api_key: impl Into<String>, env: Option<Env>) -> Self {
        self.api_key = Some(api_key.into());
        self.env = env.unwrap_or_default();
        self
    }

    /// Create a new config builder
    pub fn builder(endpoint: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::new(endpoint),
        }
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Read `GQL_ENDPOINT`, `GQL_API_KEY` and `GQL_ENV`
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var(ENDPOINT_ENV_VAR)
            .map_err(|_| Error::config(format!("{ENDPOINT_ENV_VAR} is not set")))?;
        let mut config = Self::new(endpoint);
        config.api_key = std::env::var(API_KEY_ENV_VAR)
            .ok()
            .filter(|k| !k.is_empty());
        if let Ok(env) = std::env::var(ENV_ENV_VAR) {
            config.env = env.parse()?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check the endpoint is an absolute http(s) URL
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.endpoint)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "Unsupported endpoint scheme: {}",
                url.scheme()
            )));
        }
        Ok(())
    }

    /// API key, or `MissingApiKey` if none (or an empty one) is set
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::MissingApiKey),
        }
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// User agent string
    pub fn user_agent(&self) -> String {
        format!("gql-pager/{} ({})", env!("CARGO_PKG_VERSION"), self.env)
    }
}

/// Builder for `ClientConfig`
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the API key
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set the env tag
    #[must_use]
    pub fn env(mut self, env: Env) -> Self {
        self.config.env = env;
        self
    }

    /// Enable or disable schema reuse
    #[must_use]
    pub fn cache_schema(mut self, enabled: bool) -> Self {
        self.config.cache_schema = enabled;
        self
    }

    /// Set the request timeout, rounded up to whole seconds
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let partial = u64::from(timeout.subsec_nanos() > 0);
        self.config.timeout_secs = (timeout.as_secs() + partial).max(1);
        self
    }

    /// Set a rate limit
    #[must_use]
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("https://api.example.com/gql");
        assert!(config.api_key.is_none());
        assert_eq!(config.env, Env::Dev);
        assert!(config.cache_schema);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.rate_limit.is_none());
    }

    #[test]
    fn test_init_sets_key_and_env() {
        let config = ClientConfig::new("https://api.example.com/gql").init("key", None);
        assert_eq!(config.require_api_key().unwrap(), "key");
        assert_eq!(config.env, Env::Dev);

        let config = ClientConfig::new("https://api.example.com/gql").init("key", Some(Env::Prod));
        assert_eq!(config.env, Env::Prod);
        assert!(config.user_agent().ends_with("(prod)"));
    }

    #[test]
    fn test_missing_or_empty_api_key() {
        let config = ClientConfig::new("https://api.example.com/gql");
        assert!(matches!(
            config.require_api_key(),
            Err(Error::MissingApiKey)
        ));

        let config = ClientConfig::builder("https://api.example.com/gql")
            .api_key("")
            .build();
        assert!(matches!(
            config.require_api_key(),
            Err(Error::MissingApiKey)
        ));
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::builder("https://api.example.com/gql")
            .api_key("secret")
            .env(Env::Prod)
            .cache_schema(false)
            .timeout(Duration::from_secs(5))
            .rate_limit(RateLimiterConfig::new(2, 2))
            .build();

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.env, Env::Prod);
        assert!(!config.cache_schema);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.rate_limit.unwrap().requests_per_second, 2);
    }

    #[test]
    fn test_builder_rounds_sub_second_timeout_up() {
        let config = ClientConfig::builder("https://api.example.com/gql")
            .timeout(Duration::from_millis(500))
            .build();
        assert_eq!(config.timeout(), Duration::from_secs(1));

        let config = ClientConfig::builder("https://api.example.com/gql")
            .timeout(Duration::from_millis(1500))
            .build();
        assert_eq!(config.timeout(), Duration::from_secs(2));

        let config = ClientConfig::builder("https://api.example.com/gql")
            .timeout(Duration::ZERO)
            .build();
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r"
endpoint: https://api.example.com/gql
api_key: abc
env: prod
cache_schema: false
rate_limit:
  requests_per_second: 5
  burst_size: 1
";
        let config = ClientConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.env, Env::Prod);
        assert!(!config.cache_schema);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.rate_limit.unwrap().burst_size, 1);
    }

    #[test]
    fn test_from_yaml_rejects_bad_endpoint() {
        assert!(ClientConfig::from_yaml_str("endpoint: not a url").is_err());
        assert!(ClientConfig::from_yaml_str("endpoint: ftp://example.com/gql").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint: http://localhost:4000/graphql").unwrap();
        writeln!(file, "api_key: from-file").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.endpoint, "http://localhost:4000/graphql");
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }
}
