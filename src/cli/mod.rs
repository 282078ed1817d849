//! CLI module
//!
//! Command-line interface over the client.
//!
//! # Commands
//!
//! - `run` - Send a query once
//! - `paginate` - Page through a query, printing one JSON line per page
//! - `augment` - Show the augmented query for a saved schema (offline)

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
