//! Command execution.
//!
//! File access lives here; everything else is delegated to the library
//! crates so the same flows are testable from in-memory inputs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use gridsense_core::{
    Component, Directive, GridContext, GridsenseConfig, NoGrid, PatternDefinition, TextGrid,
};
use gridsense_dsl::{CompileError, Compiler};
use gridsense_engine::{ComponentReport, ConfidenceBand, PatternRegistry, ReportAssembler, RuleMatcher};
use serde::Serialize;

use crate::cli::Command;
use crate::schema::report_schema;

/// Outcome of compiling one source file.
#[derive(Debug, Clone, Serialize)]
pub struct CompileSummary {
    /// Source name
    pub source: String,
    /// Patterns registered from this source
    pub patterns: Vec<PatternDefinition>,
    /// Directives emitted by this source
    pub directives: Vec<Directive>,
    /// Per-block interpretation errors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Non-fatal diagnostics
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Configured application.
#[derive(Debug, Clone, Default)]
pub struct App {
    config: GridsenseConfig,
}

impl App {
    /// Create an application from configuration.
    pub fn new(config: GridsenseConfig) -> Self {
        Self { config }
    }

    /// Load configuration from `path` (or defaults) and apply `--strict`.
    pub fn load(path: Option<&Path>, strict: bool) -> Result<Self> {
        let mut config = match path {
            Some(path) => GridsenseConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => GridsenseConfig::default(),
        };
        if strict {
            config.compiler.strict_naming = true;
        }
        Ok(Self::new(config))
    }

    /// Configuration in use.
    pub fn config(&self) -> &GridsenseConfig {
        &self.config
    }

    /// Run a command and return what it prints.
    pub async fn run(&self, command: Command) -> Result<String> {
        match command {
            Command::Compile { files } => {
                let registry = PatternRegistry::new();
                let summaries = self.compile_files(&files, &registry)?;
                Ok(serde_json::to_string_pretty(&summaries)?)
            }
            Command::Match {
                patterns,
                components,
                grid,
                min_confidence,
            } => {
                let reports = self
                    .match_files(&patterns, &components, grid.as_deref(), min_confidence)
                    .await?;
                Ok(serde_json::to_string_pretty(&reports)?)
            }
            Command::Schema => Ok(serde_json::to_string_pretty(&report_schema())?),
        }
    }

    /// Compile named sources in order into one registry.
    ///
    /// Fails on the first unit with a lexical, structural or semantic error.
    pub fn compile_sources(
        &self,
        sources: &[(String, String)],
        registry: &PatternRegistry,
    ) -> Result<Vec<CompileSummary>> {
        let outputs = Compiler::with_config(self.config.clone())
            .compile_all(
                sources.iter().map(|(name, source)| (name.as_str(), source.as_str())),
                registry,
            )
            .map_err(|e| anyhow::anyhow!(describe_compile_error(&e)))?;

        let summaries = sources
            .iter()
            .zip(outputs)
            .map(|((name, _), output)| {
                for error in &output.interpretation.errors {
                    tracing::warn!(source = %name, "{error}");
                }
                tracing::info!(
                    source = %name,
                    patterns = output.interpretation.patterns.len(),
                    directives = output.interpretation.directives.len(),
                    "compiled source"
                );

                CompileSummary {
                    source: name.clone(),
                    warnings: output
                        .warnings
                        .iter()
                        .map(|w| format!("{name}:{}: warning: {}", w.span, w.kind))
                        .collect(),
                    errors: output
                        .interpretation
                        .errors
                        .iter()
                        .map(|e| format!("{name}: {e}"))
                        .collect(),
                    patterns: output.interpretation.patterns,
                    directives: output.interpretation.directives,
                }
            })
            .collect();

        Ok(summaries)
    }

    /// Read and compile pattern files.
    pub fn compile_files(
        &self,
        files: &[PathBuf],
        registry: &PatternRegistry,
    ) -> Result<Vec<CompileSummary>> {
        let sources = files
            .iter()
            .map(|path| {
                let source = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Ok((path.display().to_string(), source))
            })
            .collect::<Result<Vec<_>>>()?;
        self.compile_sources(&sources, registry)
    }

    /// Match components against a registry and assemble reports.
    pub async fn match_components(
        &self,
        components: Vec<Component>,
        grid: Arc<dyn GridContext>,
        registry: &PatternRegistry,
        min_confidence: ConfidenceBand,
    ) -> Vec<ComponentReport> {
        let matcher = RuleMatcher::with_settings(self.config.matcher.clone());
        let batch = matcher
            .match_batch_concurrent(components, grid, registry.snapshot())
            .await;
        ReportAssembler::new().assemble_batch(batch, min_confidence)
    }

    /// Compile a pattern file, read components and an optional grid, and match.
    pub async fn match_files(
        &self,
        patterns: &Path,
        components: &Path,
        grid: Option<&Path>,
        min_confidence: ConfidenceBand,
    ) -> Result<Vec<ComponentReport>> {
        let registry = PatternRegistry::new();
        let summaries = self.compile_files(&[patterns.to_path_buf()], &registry)?;
        if registry.is_empty() {
            let errors: Vec<&str> = summaries
                .iter()
                .flat_map(|s| s.errors.iter().map(String::as_str))
                .collect();
            if errors.is_empty() {
                bail!("{} defines no patterns", patterns.display());
            }
            bail!("{} defines no usable patterns:\n{}", patterns.display(), errors.join("\n"));
        }

        let json = std::fs::read_to_string(components)
            .with_context(|| format!("Failed to read {}", components.display()))?;
        let components: Vec<Component> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse components from {}", components.display()))?;

        let grid: Arc<dyn GridContext> = match grid {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read grid {}", path.display()))?;
                Arc::new(TextGrid::from_text(&text))
            }
            None => Arc::new(NoGrid),
        };

        tracing::info!(
            patterns = registry.len(),
            components = components.len(),
            "matching components"
        );
        Ok(self
            .match_components(components, grid, &registry, min_confidence)
            .await)
    }
}

/// Render a compile failure with source positions, one diagnostic per line.
pub fn describe_compile_error(err: &CompileError) -> String {
    match err {
        CompileError::InUnit { name, error } => describe_unit_error(name, error),
        _ => err.to_string(),
    }
}

fn describe_unit_error(name: &str, err: &CompileError) -> String {
    match err {
        CompileError::Lex(e) => format!("{name}:{}: {err}", e.span()),
        CompileError::Parse(e) => format!("{name}:{}: parse error: {}", e.span, e.kind),
        CompileError::Semantic(diagnostics) => {
            let mut lines = vec![format!("{name}: {err}")];
            lines.extend(diagnostics.iter().map(|d| {
                let severity = if d.is_error() { "error" } else { "warning" };
                format!("{name}:{}: {severity}: {}", d.span, d.kind)
            }));
            lines.join("\n")
        }
        CompileError::TooManySources { .. } | CompileError::InUnit { .. } => err.to_string(),
    }
}
