//! `invoke`: run one handler against a transport event read from a file.
//!
//! ```bash
//! todo invoke createHandler --event create.json
//! echo '{"path":"/get","httpMethod":"GET","queryStringParameters":{"type":"root"}}' \
//!     | todo invoke getHandler --stdin
//! ```

use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use lambda_decorator::{InvocationContext, ProxyEvent, ProxyResponse};
use std::path::PathBuf;
use tracing::debug;

use super::read_input;
use crate::context::Context;
use crate::output::{pretty_body, print_field, print_json, print_section, OutputFormat};

/// Arguments for the invoke command
#[derive(Args, Debug)]
pub struct InvokeCommand {
    /// Export name, e.g. `createHandler`
    pub export_name: String,

    /// Event file path (JSON)
    #[arg(short, long)]
    pub event: Option<PathBuf>,

    /// Read the event from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Function name reported in the invocation context
    #[arg(long, default_value = "todo-cli")]
    pub function_name: String,
}

/// Execute the invoke command
pub async fn execute(ctx: &Context, cmd: InvokeCommand) -> Result<()> {
    let event = parse_event(&read_input(cmd.event, cmd.stdin, "--event")?)?;
    let exports = ctx.exports()?;

    debug!(export = %cmd.export_name, method = %event.http_method, "Invoking handler");
    let response = exports
        .invoke(&cmd.export_name, event, InvocationContext::new(cmd.function_name))
        .await
        .with_context(|| {
            let known: Vec<&str> = exports.names().collect();
            format!("No handler exported as '{}' (known: {})", cmd.export_name, known.join(", "))
        })?;

    match ctx.output {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Table => {
            display_response(&response, ctx.verbose);
            Ok(())
        }
    }
}

/// Parse a transport event.
fn parse_event(input: &str) -> Result<ProxyEvent> {
    serde_json::from_str(input).context("Event is not a valid transport event")
}

fn display_response(response: &ProxyResponse, verbose: bool) {
    print_section("Invocation Result");

    let status = response.status_code.to_string();
    let status = if response.status_code < 400 {
        status.green()
    } else {
        status.red()
    };
    print_field("Status", &status.to_string());

    if verbose {
        for (name, value) in &response.headers {
            print_field(name, value);
        }
    }

    print_section("Body");
    println!("{}", pretty_body(&response.body));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_accepts_minimal_event() {
        let event = parse_event(r#"{"path": "/get", "httpMethod": "GET"}"#).unwrap();
        assert_eq!(event.http_method, "GET");
        assert!(event.body.is_none());
        assert!(event.headers.is_empty());
    }

    #[test]
    fn test_parse_event_rejects_garbage() {
        assert!(parse_event("{\"path\": 1}").is_err());
        assert!(parse_event("not json").is_err());
    }

    #[tokio::test]
    async fn test_invoke_parsed_event() {
        let exports = Context::default().exports().unwrap();
        let event = parse_event(
            r#"{"path": "/create", "httpMethod": "POST", "body": "{\"type\": \"list\", \"name\": \"groceries\"}"}"#,
        )
        .unwrap();

        let response = exports
            .invoke("createHandler", event, InvocationContext::new("todo-cli"))
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(response.json_body().unwrap()["success"], true);
    }
}
