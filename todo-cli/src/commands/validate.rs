//! `validate`: check a JSON payload against a field-type schema.
//!
//! The schema file maps field names to a type name or a list of type names,
//! e.g. `{"type": "string", "name": ["string", "undefined"]}`.

use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use lambda_decorator::{ErrorKind, LambdaError, Schema, ValidationMessages};
use serde_json::{json, Map, Value};
use std::path::PathBuf;

use super::read_input;
use crate::context::Context;
use crate::output::{pretty_body, print_field, print_json, print_section, OutputFormat};

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Schema file path (JSON)
    #[arg(short, long)]
    pub schema: PathBuf,

    /// Payload file path (JSON)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Read the payload from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Render failures as JSON error bodies
    #[arg(long)]
    pub json_errors: bool,
}

/// Execute the validate command
pub async fn execute(ctx: &Context, cmd: ValidateCommand) -> Result<()> {
    let schema_text = std::fs::read_to_string(&cmd.schema)
        .with_context(|| format!("Failed to read file: {}", cmd.schema.display()))?;
    let schema = parse_schema(&schema_text)?;
    let payload = parse_payload(&read_input(cmd.input, cmd.stdin, "--input")?)?;

    let kind = if cmd.json_errors { ErrorKind::JSON } else { ErrorKind::PLAIN };
    let outcome = check(&schema, &payload, kind);

    match ctx.output {
        OutputFormat::Json => print_json(&match &outcome {
            Ok(()) => json!({ "valid": true }),
            Err(e) => json!({
                "valid": false,
                "statusCode": e.status_code().as_u16(),
                "body": e.body(),
            }),
        })?,
        OutputFormat::Table => match &outcome {
            Ok(()) => println!("{} payload matches schema", "OK".green()),
            Err(e) => {
                print_section("Validation Failed");
                print_field("Status", &e.status_code().as_u16().to_string());
                print_field("Reason", e.message());
                print_section("Body");
                println!("{}", pretty_body(e.body()));
            }
        },
    }

    match outcome {
        Ok(()) => Ok(()),
        Err(e) => anyhow::bail!("{}", e.message()),
    }
}

fn parse_schema(text: &str) -> Result<Schema> {
    let value: Value = serde_json::from_str(text).context("Schema is not valid JSON")?;
    Schema::try_from(value).context("Schema is not a valid field-type schema")
}

fn parse_payload(text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(text).context("Payload is not valid JSON")? {
        Value::Object(fields) => Ok(fields),
        other => anyhow::bail!("Payload must be a JSON object, got {}", type_name(&other)),
    }
}

fn type_name(value: &Value) -> &'static str {
    lambda_decorator::PrimitiveType::of(value).as_str()
}

/// Validate with the default status and message templates.
fn check(schema: &Schema, payload: &Map<String, Value>, kind: ErrorKind) -> Result<(), LambdaError> {
    schema
        .validate(payload)
        .map_err(|e| e.render(&ValidationMessages::default(), kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        parse_schema(r#"{"type": "string", "name": ["string", "undefined"]}"#).unwrap()
    }

    #[test]
    fn test_valid_payload() {
        let payload = parse_payload(r#"{"type": "list"}"#).unwrap();
        assert!(check(&schema(), &payload, ErrorKind::PLAIN).is_ok());
    }

    #[test]
    fn test_missing_parameter_renders_plain_body() {
        let payload = parse_payload("{}").unwrap();
        let error = check(&schema(), &payload, ErrorKind::PLAIN).unwrap_err();

        assert_eq!(error.status_code().as_u16(), 400);
        assert_eq!(error.body(), "Missing parameters [type]");
    }

    #[test]
    fn test_invalid_parameter_renders_json_body() {
        let payload = parse_payload(r#"{"type": 1}"#).unwrap();
        let error = check(&schema(), &payload, ErrorKind::JSON).unwrap_err();

        assert_eq!(error.body(), r#"{"message":"Parameter 'type' is not valid"}"#);
    }

    #[test]
    fn test_unknown_type_name_is_rejected() {
        assert!(parse_schema(r#"{"type": "text"}"#).is_err());
    }

    #[test]
    fn test_payload_must_be_object() {
        let error = parse_payload("[1, 2]").unwrap_err();
        assert!(error.to_string().contains("array"));
    }
}
