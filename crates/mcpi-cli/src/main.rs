//! mcp-inspector: inspect and exercise Model Context Protocol servers.

mod cli;
mod commands;
mod input;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use commands::Inspector;
use mcpi_config::ConfigResolver;
use mcpi_types::{ConfigError, InspectorError, Metadata, ResultRecord};
use output::Renderer;
use std::io::{self, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let mut inspector = match Inspector::new(ConfigResolver::new(), &cli) {
        Ok(inspector) => inspector,
        Err(e) => {
            let metadata = Metadata::new("error").with_server(cli.server.clone());
            return report_error(&Renderer::default(), &e.into(), metadata);
        }
    };

    let outcome = inspector.run(&cli.command).await;
    let renderer = inspector.renderer();

    match outcome {
        Ok(outcome) => {
            let record = ResultRecord::success(outcome.data, outcome.metadata);
            emit(&renderer, &record)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => report_error(&renderer, &e, inspector.error_metadata()),
    }
}

fn report_error(renderer: &Renderer, error: &InspectorError, metadata: Metadata) -> Result<ExitCode> {
    tracing::debug!("Command failed: {error}");
    emit(renderer, &ResultRecord::error(error, metadata))?;

    if let InspectorError::Config(config_error) = error {
        if let Some(tip) = tip_for(config_error) {
            eprintln!("\n{tip}");
        }
    }
    Ok(ExitCode::FAILURE)
}

fn emit(renderer: &Renderer, record: &ResultRecord) -> Result<()> {
    let rendered = renderer
        .render(record)
        .context("Failed to serialize result record")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    stdout.flush()?;
    Ok(())
}

/// Follow-up hint printed to stderr for configuration problems.
fn tip_for(error: &ConfigError) -> Option<&'static str> {
    match error {
        ConfigError::Created { .. } => {
            Some("Tip: Edit the file above, then run your command again.")
        }
        ConfigError::NoServers | ConfigError::NotFound { .. } => {
            Some("Tip: Create a configuration file with:\n  mcp-inspector config init")
        }
        ConfigError::Parse { .. } | ConfigError::InvalidServer { .. } => {
            Some("Tip: Check the file for syntax errors and required server fields.")
        }
        _ => None,
    }
}
