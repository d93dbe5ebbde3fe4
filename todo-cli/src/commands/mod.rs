//! CLI command implementations

pub mod invoke;
pub mod routes;
pub mod validate;

use anyhow::{Context as _, Result};
use std::io::{self, Read};
use std::path::PathBuf;

/// Read input from file or stdin
fn read_input(file: Option<PathBuf>, use_stdin: bool, flag: &str) -> Result<String> {
    if use_stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else if let Some(path) = file {
        std::fs::read_to_string(&path).context(format!("Failed to read file: {}", path.display()))
    } else {
        anyhow::bail!("Either {flag} or --stdin must be provided")
    }
}
