//! # gridsense-engine
//!
//! Pattern registry and matching engine for gridsense.
//!
//! This crate provides:
//! - A thread-safe registry of compiled patterns
//! - Rule evaluation against components and their grid context
//! - Confidence-weighted matching, sequential or on a thread pool
//! - Timestamped component reports with confidence filtering
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on gridsense-core only.
//! The DSL compiler writes into the registry; callers match against it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod confidence;
pub mod evaluate;
pub mod matcher;
pub mod registry;
pub mod report;

// Re-export commonly used types
pub use confidence::ConfidenceBand;
pub use evaluate::{EvaluationContext, RuleOutcome};
pub use matcher::{ComponentMatches, RuleMatcher};
pub use registry::{DuplicateIdError, PatternRegistry, RegistrySnapshot};
pub use report::{ComponentReport, ReportAssembler};
