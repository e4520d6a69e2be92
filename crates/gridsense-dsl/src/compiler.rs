//! Compilation pipeline.
//!
//! Source text flows through [`tokenize`], [`Parser`], [`Analyzer::analyze`]
//! and [`Interpreter::interpret`]. Lexing and parsing stop at the first
//! failure; analysis reports every diagnostic and rejects the unit when any
//! of them is an error; interpretation failures are scoped to one block.

use gridsense_core::GridsenseConfig;
use gridsense_engine::PatternRegistry;

use crate::error::{CompileError, SemanticError};
use crate::interpreter::{Interpretation, Interpreter};
use crate::lexer::tokenize;
use crate::parser::Parser;
use crate::semantic::Analyzer;

/// Result of compiling one unit.
#[derive(Debug, Default)]
pub struct CompileOutput {
    /// Patterns, directives and per-block errors
    pub interpretation: Interpretation,
    /// Non-fatal diagnostics
    pub warnings: Vec<SemanticError>,
}

impl CompileOutput {
    /// Whether every block was interpreted without error.
    pub fn is_ok(&self) -> bool {
        self.interpretation.is_ok()
    }
}

/// Compile one unit into `registry` with default settings.
pub fn compile(source: &str, registry: &PatternRegistry) -> Result<CompileOutput, CompileError> {
    Compiler::new().compile(source, registry)
}

/// Configured compiler.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: GridsenseConfig,
}

impl Compiler {
    /// Create a compiler with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compiler from configuration.
    pub fn with_config(config: GridsenseConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &GridsenseConfig {
        &self.config
    }

    /// Compile one unit, registering its patterns into `registry`.
    pub fn compile(
        &self,
        source: &str,
        registry: &PatternRegistry,
    ) -> Result<CompileOutput, CompileError> {
        let tokens = tokenize(source)?;
        let ast = Parser::new(&tokens)
            .with_max_nesting(self.config.compiler.max_nesting)
            .parse_source()?;
        tracing::debug!(tokens = tokens.len(), nodes = ast.len(), "parsed unit");

        let (validated, diagnostics) = Analyzer::from_settings(&self.config.compiler).analyze(ast);
        if diagnostics.iter().any(SemanticError::is_error) {
            return Err(CompileError::Semantic(diagnostics));
        }
        for warning in &diagnostics {
            tracing::warn!(span = %warning.span, "{}", warning.kind);
        }

        let interpretation =
            Interpreter::with_config(registry, &self.config).interpret(&validated);
        Ok(CompileOutput {
            interpretation,
            warnings: diagnostics,
        })
    }

    /// Compile named units in order, stopping at the first failing one.
    ///
    /// Patterns from earlier units stay registered and are visible to
    /// `from:` references in later ones. A unit failure is returned as
    /// [`CompileError::InUnit`] carrying that unit's name.
    pub fn compile_all<'s, I>(
        &self,
        sources: I,
        registry: &PatternRegistry,
    ) -> Result<Vec<CompileOutput>, CompileError>
    where
        I: IntoIterator<Item = (&'s str, &'s str)>,
        I::IntoIter: ExactSizeIterator,
    {
        let sources = sources.into_iter();
        let limit = self.config.compiler.max_sources;
        if sources.len() > limit {
            return Err(CompileError::TooManySources {
                count: sources.len(),
                limit,
            });
        }

        sources
            .map(|(name, source)| {
                self.compile(source, registry)
                    .map_err(|error| CompileError::InUnit {
                        name: name.to_string(),
                        error: Box::new(error),
                    })
            })
            .collect()
    }
}
