//! Configuration types for gridsense.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::pattern::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::{Error, Result};

/// Top-level configuration loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GridsenseConfig {
    /// Compiler settings
    pub compiler: CompilerSettings,
    /// Matcher settings
    pub matcher: MatcherSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl GridsenseConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: GridsenseConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.compiler.max_sources == 0 {
            return Err(Error::Config("compiler.max_sources must be > 0".to_string()));
        }

        let threshold = self.matcher.default_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "matcher.default_threshold must be within [0, 1], got {threshold}"
            )));
        }

        if self.compiler.max_nesting == 0 {
            return Err(Error::Config("compiler.max_nesting must be > 0".to_string()));
        }

        if self.compiler.regex_size_limit == 0 {
            return Err(Error::Config("compiler.regex_size_limit must be > 0".to_string()));
        }

        if self.matcher.max_pluck_input == 0 {
            return Err(Error::Config("matcher.max_pluck_input must be > 0".to_string()));
        }

        if self.logging.level.trim().is_empty() {
            return Err(Error::Config("logging.level cannot be empty".to_string()));
        }

        Ok(())
    }
}

/// Compiler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Treat naming-convention violations as errors instead of warnings
    pub strict_naming: bool,
    /// Maximum number of source files compiled in one run
    pub max_sources: usize,
    /// Size limit in bytes for compiled pluck patterns
    pub regex_size_limit: usize,
    /// Deepest `key:(value)` nesting accepted in a value
    pub max_nesting: usize,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            strict_naming: false,
            max_sources: 64,
            regex_size_limit: 1 << 20,
            max_nesting: 16,
        }
    }
}

/// Matcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherSettings {
    /// Threshold given to patterns that do not set one
    pub default_threshold: f64,
    /// Texts longer than this many bytes are not plucked
    pub max_pluck_input: usize,
    /// Keep results for patterns that did not match
    pub include_non_matches: bool,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_pluck_input: 64 * 1024,
            include_non_matches: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
