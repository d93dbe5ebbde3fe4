//! CLI argument parsing

use clap::{Parser, Subcommand};

use crate::commands::{invoke::InvokeCommand, routes::RoutesCommand, validate::ValidateCommand};
use crate::output::OutputFormat;

/// Todo CLI
///
/// Lists the registered handlers, invokes a handler with a transport event
/// read from a file, and checks payloads against a field-type schema.
#[derive(Parser, Debug)]
#[command(name = "todo")]
#[command(version)]
#[command(about = "CLI for the todo handler exports", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (table, json)
    #[arg(short, long, global = true, default_value = "table", env = "TODO_CLI_OUTPUT")]
    pub output: OutputFormat,

    /// Table name given to the in-memory store
    #[arg(long, global = true, env = "TODO_TABLE_NAME", default_value = todo_api::DEFAULT_TABLE_NAME)]
    pub table_name: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the registered handlers
    #[command(alias = "ls")]
    Routes(RoutesCommand),

    /// Invoke a handler with a transport event
    #[command(alias = "call")]
    Invoke(InvokeCommand),

    /// Check a payload against a field-type schema
    #[command(alias = "check")]
    Validate(ValidateCommand),
}
