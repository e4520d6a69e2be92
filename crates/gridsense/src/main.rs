//! # gridsense
//!
//! Compiles pattern DSL files and matches grid UI components against them.
//!
//! ## Overview
//!
//! Commands:
//! - `compile`: compile pattern files and print patterns and directives
//! - `match`: classify components from a JSON file and print reports
//! - `schema`: print the draft-07 schema of a component report
//!
//! ## Architecture
//!
//! This is Layer 3 - the binary that ties together:
//! - gridsense-core: Core types and configuration
//! - gridsense-engine: Registry, matcher and reports
//! - gridsense-dsl: Pattern DSL compiler

use clap::Parser;
use gridsense::{App, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let app = App::load(cli.config.as_deref(), cli.strict)?;

    // Initialize logging; stdout carries JSON output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&app.config().logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(command = ?cli.command, "gridsense v{} starting", env!("CARGO_PKG_VERSION"));

    let output = app.run(cli.command).await.map_err(|e| {
        tracing::error!("{e:#}");
        e
    })?;
    println!("{output}");

    Ok(())
}
