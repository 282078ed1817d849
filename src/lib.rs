// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # gql-pager
//!
//! Cursor pagination for arbitrary GraphQL queries.
//!
//! Hand it a query with `limit` arguments and it takes care of the rest:
//! cursor variables and `pageInfo` selections are injected from the
//! schema, every aliased branch pages independently, exhausted branches
//! stop being requested and come back when navigating backwards.
//!
//! ## Features
//!
//! - **Schema-driven augmentation**: only root fields whose type exposes
//!   `pageInfo { nextCursor prevCursor }` are rewritten
//! - **Multi-branch navigation**: forward and backward over every branch
//!   of one query at once
//! - **Branch pruning**: exhausted branches are removed from forward
//!   requests and restored on the way back
//! - **Single-flight**: overlapping navigation calls share one request
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gql_pager::{Client, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> gql_pager::Result<()> {
//!     let config = ClientConfig::new("https://api.airstack.xyz/gql").init("my-key", None);
//!     let client = Client::new(config)?;
//!
//!     let session = client
//!         .fetch_query_with_pagination(
//!             r#"query { TokenBalances(input: {blockchain: ethereum, limit: 10}) { TokenBalance { id } } }"#,
//!             None,
//!         )
//!         .await;
//!
//!     let mut page = session.current().await;
//!     while let Some(next) = session.next_page().await {
//!         page = next;
//!     }
//!     println!("{:?}", page.data);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Client                                │
//! │  fetch_query() → QueryResponse                                  │
//! │  fetch_query_with_pagination() → Session                        │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴─────┬───────────────┬────────────┐
//! │    Schema    │       Query         │  Pagination   │    HTTP    │
//! ├──────────────┼─────────────────────┼───────────────┼────────────┤
//! │ Introspection│ Augment             │ Extract       │ Transport  │
//! │ Type map     │ Prune               │ Session       │ Rate Limit │
//! │ Cache        │ Cursor bindings     │ Single-flight │            │
//! └──────────────┴─────────────────────┴───────────────┴────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Client configuration
pub mod config;

/// GraphQL transport with rate limiting
pub mod http;

/// Schema introspection and pagination capability
pub mod schema;

/// Query augmentation and pruning
pub mod query;

/// Pagination state and navigation
pub mod pagination;

/// Public entry points
pub mod client;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{Client, QueryResponse};
pub use config::ClientConfig;
pub use error::{Error, FetchError, GraphQlError, Result};
pub use pagination::{Page, Session};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
