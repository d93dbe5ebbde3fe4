//! Command execution context

use std::sync::Arc;

use anyhow::{Context as _, Result};
use lambda_decorator::HandlerExportTable;
use todo_api::InMemoryStore;

use crate::cli::Cli;
use crate::output::OutputFormat;

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub output: OutputFormat,
    pub table_name: String,
    pub verbose: bool,
}

impl Context {
    pub fn new(cli: &Cli) -> Self {
        if cli.no_color {
            colored::control::set_override(false);
        }

        Self {
            output: cli.output,
            table_name: cli.table_name.clone(),
            verbose: cli.verbose,
        }
    }

    /// Build the todo export table over a fresh in-memory store.
    pub fn exports(&self) -> Result<HandlerExportTable> {
        let store = Arc::new(InMemoryStore::new(self.table_name.clone()));
        todo_api::exports(store).context("Failed to build handler exports")
    }
}

#[cfg(test)]
impl Default for Context {
    fn default() -> Self {
        Self {
            output: OutputFormat::Table,
            table_name: todo_api::DEFAULT_TABLE_NAME.to_string(),
            verbose: false,
        }
    }
}
