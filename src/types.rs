//! Common types used throughout gql-pager
//!
//! This module contains shared type definitions and type aliases
//! used across multiple modules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Variable bindings sent alongside a GraphQL document
pub type Variables = JsonObject;

/// Branch response key to cursor value, ordered for deterministic output
pub type CursorMap = BTreeMap<String, String>;

// ============================================================================
// Environment
// ============================================================================

/// Deployment environment tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    #[default]
    Dev,
    Prod,
}

impl Env {
    /// Lower-case name of the environment
    pub fn as_str(self) -> &'static str {
        match self {
            Env::Dev => "dev",
            Env::Prod => "prod",
        }
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Env {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Env::Dev),
            "prod" | "production" => Ok(Env::Prod),
            other => Err(crate::Error::config(format!("Unknown env: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse() {
        assert_eq!("dev".parse::<Env>().unwrap(), Env::Dev);
        assert_eq!("PROD".parse::<Env>().unwrap(), Env::Prod);
        assert_eq!("production".parse::<Env>().unwrap(), Env::Prod);
        assert!("staging".parse::<Env>().is_err());
    }

    #[test]
    fn test_env_serde() {
        let env: Env = serde_json::from_str("\"prod\"").unwrap();
        assert_eq!(env, Env::Prod);
        assert_eq!(serde_json::to_string(&Env::Dev).unwrap(), "\"dev\"");
        assert_eq!(Env::default().to_string(), "dev");
    }
}
