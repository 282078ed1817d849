//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::client::Client;
use crate::config::{ClientConfig, API_KEY_ENV_VAR};
use crate::error::{Error, Result};
use crate::pagination::Page;
use crate::query::try_augment_query;
use crate::schema::SchemaTypeMap;
use crate::types::{Env, JsonValue, Variables};
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run { query, variables } => {
                self.run_query(query, variables.as_deref()).await
            }
            Commands::Paginate {
                query,
                variables,
                pages,
                backward,
            } => {
                self.paginate(query, variables.as_deref(), *pages, *backward)
                    .await
            }
            Commands::Augment { query, schema } => self.augment(query, schema),
        }
    }

    /// Build the client configuration from file, flags and environment
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match (&self.cli.config, &self.cli.endpoint) {
            (Some(path), _) => ClientConfig::from_file(path)?,
            (None, Some(endpoint)) => ClientConfig::new(endpoint.clone()),
            (None, None) => ClientConfig::from_env()?,
        };

        if let Some(endpoint) = &self.cli.endpoint {
            config.endpoint.clone_from(endpoint);
        }
        if let Some(key) = &self.cli.api_key {
            config.api_key = Some(key.clone());
        }
        if config.api_key.is_none() {
            config.api_key = std::env::var(API_KEY_ENV_VAR)
                .ok()
                .filter(|k| !k.is_empty());
        }
        if let Some(env) = &self.cli.env {
            config.env = env.parse::<Env>()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Send a query once
    async fn run_query(&self, path: &Path, variables: Option<&str>) -> Result<()> {
        let query = read_query(path)?;
        let variables = parse_variables(variables)?;
        let client = Client::new(self.client_config()?)?;

        let response = client.fetch_query(&query, variables).await;
        let error = response.error.as_ref().map(ToString::to_string);
        self.output_message(&json!({
            "type": "RESULT",
            "data": response.data,
            "error": error,
        }));

        match error {
            Some(message) => Err(Error::Other(message)),
            None => Ok(()),
        }
    }

    /// Walk forward `pages` steps, then optionally back to the start
    async fn paginate(
        &self,
        path: &Path,
        variables: Option<&str>,
        pages: usize,
        backward: bool,
    ) -> Result<()> {
        let query = read_query(path)?;
        let variables = parse_variables(variables)?;
        let client = Client::new(self.client_config()?)?;

        let session = client.fetch_query_with_pagination(&query, variables).await;
        let mut index = 0;
        let first = session.current().await;
        self.output_page(index, &first)?;

        while index < pages {
            let Some(page) = session.next_page().await else {
                info!("No further pages after page {index}");
                break;
            };
            index += 1;
            self.output_page(index, &page)?;
        }

        if backward {
            while let Some(page) = session.prev_page().await {
                index = index.saturating_sub(1);
                self.output_page(index, &page)?;
            }
        }

        Ok(())
    }

    /// Augment a query against a saved introspection result
    fn augment(&self, query: &Path, schema: &Path) -> Result<()> {
        let query = read_query(query)?;
        let contents = fs::read_to_string(schema)
            .map_err(|e| Error::config(format!("Failed to read schema file: {e}")))?;
        let introspection: JsonValue = serde_json::from_str(&contents)?;
        // Accept a full response envelope as well as its `data`
        let introspection = introspection.get("data").unwrap_or(&introspection);

        let type_map = SchemaTypeMap::from_introspection(introspection)?;
        println!("{}", try_augment_query(&query, &type_map)?);
        Ok(())
    }

    /// Output one page, failing if it carries an error
    fn output_page(&self, index: usize, page: &Page) -> Result<()> {
        let error = page.error.as_ref().map(ToString::to_string);
        self.output_message(&json!({
            "type": "PAGE",
            "page": index,
            "data": page.data,
            "error": error,
            "hasNextPage": page.has_next_page,
            "hasPrevPage": page.has_prev_page,
        }));

        match error {
            Some(message) => Err(Error::Other(message)),
            None => Ok(()),
        }
    }

    /// Output a message
    fn output_message(&self, msg: &JsonValue) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn read_query(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::config(format!("Failed to read query file: {e}")))
}

fn parse_variables(inline: Option<&str>) -> Result<Option<Variables>> {
    inline
        .map(|json| {
            serde_json::from_str::<Variables>(json)
                .map_err(|e| Error::config(format!("Invalid variables JSON: {e}")))
        })
        .transpose()
}
