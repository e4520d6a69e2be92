//! # gridsense-core
//!
//! Core types for gridsense.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other gridsense crates. It provides:
//!
//! - Geometry types (Position, Bounds, Dimensions)
//! - Components handed over by recognition, and read-only grid access
//! - Compiled pattern definitions and rules
//! - Match results and directives for code generation
//! - Configuration and error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other gridsense crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod component;
pub mod config;
pub mod directive;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod match_result;
pub mod pattern;

// Re-export commonly used types
pub use component::Component;
pub use config::{CompilerSettings, GridsenseConfig, LoggingSettings, MatcherSettings};
pub use directive::Directive;
pub use error::{Error, Result};
pub use geometry::{Bounds, Dimensions, Position};
pub use grid::{GridContext, NoGrid, TextGrid};
pub use match_result::MatchResult;
pub use pattern::{
    Constraint, ConstraintArg, ConstraintError, PatternDefinition, PatternId, PluckMode,
    PluckRule, Rule, TagRule, TrapRule, DEFAULT_CONFIDENCE_THRESHOLD,
};
