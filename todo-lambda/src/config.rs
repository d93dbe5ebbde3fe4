//! Configuration for the Todo Lambda runtime host
//!
//! Loaded from environment variables. Outside `dev`, required variables fail
//! fast; in `dev`, local defaults are used.
//!
//! Environment variables:
//! - PLATFORM_ENV: dev | staging | prod
//! - FUNCTION_PREFIX: prefix of deployed function names (REQUIRED outside dev)
//! - STAGE: deployment stage (defaults from PLATFORM_ENV)
//! - TODO_TABLE_NAME: table the store writes to
//! - TODO_LAMBDA_PORT: HTTP port (8080)
//! - TODO_LAMBDA_LOG_LEVEL: default log level when RUST_LOG is unset
//! - SERVICE_NAME, SERVICE_VERSION

use anyhow::{anyhow, Result};
use std::env;

/// Platform environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlatformEnv {
    #[default]
    Dev,
    Staging,
    Prod,
}

impl PlatformEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Staging => "staging",
            Self::Prod => "prod",
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "prod" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    fn default_stage(&self) -> &'static str {
        match self {
            Self::Dev => "local",
            Self::Staging => "staging",
            Self::Prod => "prod",
        }
    }
}

/// Runtime host configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub port: u16,

    /// Platform environment
    pub platform_env: PlatformEnv,

    /// Prefix of deployed function names
    pub function_prefix: String,

    /// Deployment stage
    pub stage: String,

    /// Table the todo store writes to
    pub table_name: String,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Log level
    pub log_level: String,
}

fn default_port() -> u16 {
    8080
}

fn default_table_name() -> String {
    todo_api::DEFAULT_TABLE_NAME.to_string()
}

fn default_service_name() -> String {
    "todo-lambda".to_string()
}

fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let platform_env = PlatformEnv::parse(&lookup("PLATFORM_ENV").unwrap_or_else(|| "dev".to_string()));
        let is_production = platform_env != PlatformEnv::Dev;

        // FUNCTION_PREFIX - REQUIRED outside dev
        let function_prefix = match lookup("FUNCTION_PREFIX") {
            Some(prefix) => prefix,
            None if is_production => {
                return Err(anyhow!(
                    "FUNCTION_PREFIX environment variable is required in {} mode. ABORTING STARTUP.",
                    platform_env.as_str()
                ));
            }
            None => "todo".to_string(),
        };

        let stage = lookup("STAGE").unwrap_or_else(|| platform_env.default_stage().to_string());

        let port = match lookup("TODO_LAMBDA_PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| anyhow!("TODO_LAMBDA_PORT must be a port number, got '{port}'"))?,
            None => default_port(),
        };

        Ok(Self {
            port,
            platform_env,
            function_prefix,
            stage,
            table_name: lookup("TODO_TABLE_NAME").unwrap_or_else(default_table_name),
            service_name: lookup("SERVICE_NAME").unwrap_or_else(default_service_name),
            service_version: lookup("SERVICE_VERSION").unwrap_or_else(default_service_version),
            log_level: lookup("TODO_LAMBDA_LOG_LEVEL").unwrap_or_else(default_log_level),
        })
    }

    /// Deployed name of the function exporting `export_name`.
    pub fn function_name(&self, export_name: &str) -> String {
        format!("{}-{}-{}", self.function_prefix, self.stage, export_name)
    }

    /// Validate that the configuration is complete for a deployed environment.
    pub fn validate_for_production(&self) -> Result<()> {
        if self.platform_env == PlatformEnv::Dev {
            return Ok(());
        }

        if self.stage == PlatformEnv::Dev.default_stage() {
            return Err(anyhow!(
                "STAGE cannot be '{}' in {} mode",
                self.stage,
                self.platform_env.as_str()
            ));
        }

        if self.function_prefix.trim().is_empty() || self.function_prefix.contains(char::is_whitespace) {
            return Err(anyhow!(
                "FUNCTION_PREFIX must be a non-empty name without whitespace. Got: '{}'",
                self.function_prefix
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    /// Default configuration for DEVELOPMENT ONLY.
    fn default() -> Self {
        Self {
            port: default_port(),
            platform_env: PlatformEnv::default(),
            function_prefix: "todo".to_string(),
            stage: PlatformEnv::Dev.default_stage().to_string(),
            table_name: default_table_name(),
            service_name: default_service_name(),
            service_version: default_service_version(),
            log_level: default_log_level(),
        }
    }
}
