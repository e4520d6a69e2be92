//! gridsense command line library
//!
//! Argument parsing, command execution and schema output for the
//! `gridsense` binary. The binary itself is in main.rs.

pub mod app;
pub mod cli;
pub mod schema;

// Re-export commonly used types
pub use app::{describe_compile_error, App, CompileSummary};
pub use cli::{Cli, Command};
pub use schema::{report_schema, SchemaTransformer};
