//! Todo CLI
//!
//! Command-line interface for inspecting and exercising the todo handler
//! exports without a running host.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod context;
mod output;

use cli::{Cli, Commands};
use context::Context;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("todo_cli=info".parse()?)
                .add_directive("warn".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let ctx = Context::new(&cli);

    match cli.command {
        Commands::Routes(cmd) => commands::routes::execute(&ctx, cmd).await,
        Commands::Invoke(cmd) => commands::invoke::execute(&ctx, cmd).await,
        Commands::Validate(cmd) => commands::validate::execute(&ctx, cmd).await,
    }
}
