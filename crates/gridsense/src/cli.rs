//! Command line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gridsense_engine::ConfidenceBand;

/// Pattern DSL compiler and matcher for grid UI components.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "gridsense")]
#[command(version)]
#[command(about = "Compile pattern DSL files and match grid UI components against them")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Load configuration from a YAML file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Treat naming convention violations as errors
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommand to run.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Compile pattern files and print a summary
    Compile {
        /// Pattern sources, compiled in order into one registry
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Match components and print JSON reports
    Match {
        /// Pattern source
        patterns: PathBuf,

        /// JSON array of components
        components: PathBuf,

        /// Grid text used for tag evaluation
        #[arg(long, value_name = "FILE")]
        grid: Option<PathBuf>,

        /// Lowest confidence band kept in reports (low, medium, high)
        #[arg(long, default_value = "low")]
        min_confidence: ConfidenceBand,
    },

    /// Print the JSON schema of a component report
    Schema,
}
