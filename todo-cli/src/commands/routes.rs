//! `routes`: print the registration-time output of the todo exports.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use comfy_table::{Cell, Color, Table};
use lambda_decorator::RouteDescriptor;

use crate::context::Context;
use crate::output::{print_json, OutputFormat};

/// Arguments for the routes command
#[derive(Args, Debug)]
pub struct RoutesCommand {
    /// Only show handlers bound to this HTTP method
    #[arg(short, long)]
    pub method: Option<String>,
}

/// Execute the routes command
pub async fn execute(ctx: &Context, cmd: RoutesCommand) -> Result<()> {
    let exports = ctx.exports()?;
    let routes = filter_routes(exports.routes(), cmd.method.as_deref());

    match ctx.output {
        OutputFormat::Json => print_json(&routes),
        OutputFormat::Table => {
            display_table(&routes);
            Ok(())
        }
    }
}

fn filter_routes(routes: &[RouteDescriptor], method: Option<&str>) -> Vec<RouteDescriptor> {
    routes
        .iter()
        .filter(|route| method.map_or(true, |m| route.http_method.as_str().eq_ignore_ascii_case(m)))
        .cloned()
        .collect()
}

fn display_table(routes: &[RouteDescriptor]) {
    println!("\n{}", "Registered Handlers".bold());

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Endpoint").fg(Color::Cyan),
        Cell::new("Method").fg(Color::Cyan),
        Cell::new("Export").fg(Color::Cyan),
    ]);

    for route in routes {
        table.add_row(vec![
            Cell::new(format!("/{}", route.endpoint)),
            Cell::new(route.http_method.as_str()).fg(Color::Green),
            Cell::new(&route.handler_export_name),
        ]);
    }

    println!("{table}");
}
