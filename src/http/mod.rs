//! HTTP transport module
//!
//! Sends GraphQL documents to the configured endpoint.
//!
//! # Features
//!
//! - **Transport seam**: `Transport` trait, swappable in tests
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Error classification**: transport failures vs. GraphQL `errors`

mod client;
mod rate_limit;

pub use client::{GraphQlRequest, GraphQlResponse, HttpTransport, Transport};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
