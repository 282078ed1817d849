//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cursor pagination for GraphQL queries
#[derive(Parser, Debug)]
#[command(name = "gql-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// GraphQL endpoint URL (overrides the config file)
    #[arg(short, long, global = true)]
    pub endpoint: Option<String>,

    /// API key (overrides the config file)
    #[arg(short = 'k', long, global = true)]
    pub api_key: Option<String>,

    /// Environment tag: dev or prod
    #[arg(long, global = true)]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a query once, without pagination
    Run {
        /// Query document file
        #[arg(short, long)]
        query: PathBuf,

        /// Inline variables JSON
        #[arg(long)]
        variables: Option<String>,
    },

    /// Page through a query
    Paginate {
        /// Query document file
        #[arg(short, long)]
        query: PathBuf,

        /// Inline variables JSON
        #[arg(long)]
        variables: Option<String>,

        /// Forward steps to take after the first page
        #[arg(long, default_value = "1")]
        pages: usize,

        /// Walk back to the first page afterwards
        #[arg(long)]
        backward: bool,
    },

    /// Print the augmented query for a saved introspection result
    Augment {
        /// Query document file
        #[arg(short, long)]
        query: PathBuf,

        /// Introspection result (JSON)
        #[arg(short, long)]
        schema: PathBuf,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
