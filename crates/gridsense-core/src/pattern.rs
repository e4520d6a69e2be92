//! Compiled pattern definitions and their rules.
//!
//! A [`PatternDefinition`] is the only artifact that outlives a compilation.
//! It is immutable once built and shared behind an `Arc` by the registry.

use std::collections::BTreeMap;
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use thiserror::Error;

/// Identifier of a pattern, unique within a registry.
pub type PatternId = String;

/// Threshold used when a pattern does not set one.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// A named, compiled set of rules classifying one kind of component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternDefinition {
    /// Unique identifier
    pub id: PatternId,
    /// Component type this pattern recognizes (e.g. "button")
    pub component_type: String,
    /// Rules in declaration order
    pub rules: Vec<Rule>,
    /// Minimum confidence for a match, in `[0, 1]`
    pub confidence_threshold: f64,
    /// Presentation hints passed through to code generation
    pub skin: BTreeMap<String, String>,
    /// Message traced whenever the pattern matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_label: Option<String>,
}

impl PatternDefinition {
    /// Create an empty pattern with the default threshold.
    pub fn new(id: impl Into<PatternId>, component_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component_type: component_type.into(),
            rules: Vec::new(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            skin: BTreeMap::new(),
            log_label: None,
        }
    }

    /// Append a rule.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Set the confidence threshold, clamped to `[0, 1]`.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = if threshold.is_nan() {
            DEFAULT_CONFIDENCE_THRESHOLD
        } else {
            threshold.clamp(0.0, 1.0)
        };
        self
    }

    /// Number of trap rules.
    pub fn trap_count(&self) -> usize {
        self.rules
            .iter()
            .filter(|r| matches!(r, Rule::Trap(_)))
            .count()
    }
}

/// One atomic test contributing to a pattern's match decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    /// Marker presence test
    Tag(TagRule),
    /// Property extraction from the component text
    Pluck(PluckRule),
    /// Hard constraint; a violation vetoes the pattern
    Trap(TrapRule),
}

impl Rule {
    /// Short rule kind name.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Rule::Tag(_) => "tag",
            Rule::Pluck(_) => "pluck",
            Rule::Trap(_) => "trap",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Tag(tag) => write!(f, "tag {:?}", tag.marker_values),
            Rule::Pluck(pluck) => write!(
                f,
                "pluck {} = /{}/ ({})",
                pluck.target_property,
                pluck.pattern(),
                pluck.mode
            ),
            Rule::Trap(trap) => write!(f, "trap {}", trap.constraint),
        }
    }
}

/// Fires when every marker value occurs in the component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRule {
    /// Markers, deduplicated, in first-seen order
    pub marker_values: Vec<String>,
}

impl TagRule {
    /// Create a tag rule; duplicate markers are dropped.
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut marker_values: Vec<String> = Vec::new();
        for marker in markers {
            let marker = marker.into();
            if !marker_values.contains(&marker) {
                marker_values.push(marker);
            }
        }
        Self { marker_values }
    }
}

/// How many matches a pluck rule collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PluckMode {
    /// First match only; the property is a string
    #[default]
    Gather,
    /// Every match; the property is an array of strings
    Harvest,
}

impl fmt::Display for PluckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluckMode::Gather => f.write_str("gather"),
            PluckMode::Harvest => f.write_str("harvest"),
        }
    }
}

/// Extracts a property from the component text with a regular expression.
#[derive(Debug, Clone, Serialize)]
pub struct PluckRule {
    /// Property name written into the extracted properties
    pub target_property: String,
    /// Collection mode
    pub mode: PluckMode,
    #[serde(rename = "pattern", serialize_with = "serialize_regex")]
    regex: Regex,
}

fn serialize_regex<S: serde::Serializer>(regex: &Regex, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(regex.as_str())
}

impl PluckRule {
    /// Compile a pluck rule.
    ///
    /// `size_limit` bounds the compiled program size in bytes.
    pub fn new(
        target_property: impl Into<String>,
        pattern: &str,
        mode: PluckMode,
        size_limit: usize,
    ) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern).size_limit(size_limit).build()?;
        Ok(Self {
            target_property: target_property.into(),
            mode,
            regex,
        })
    }

    /// Source text of the pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Compiled pattern.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl PartialEq for PluckRule {
    fn eq(&self, other: &Self) -> bool {
        self.target_property == other.target_property
            && self.mode == other.mode
            && self.pattern() == other.pattern()
    }
}

/// Hard constraint on a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrapRule {
    /// Constraint that must hold
    pub constraint: Constraint,
}

impl TrapRule {
    /// Create a trap rule.
    pub fn new(constraint: Constraint) -> Self {
        Self { constraint }
    }
}

/// Constraint checked by a trap rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Bounding box at least this wide
    MinWidth(u16),
    /// Bounding box at most this wide
    MaxWidth(u16),
    /// Bounding box at least this tall
    MinHeight(u16),
    /// Bounding box at most this tall
    MaxHeight(u16),
    /// Property must have been extracted
    Requires(String),
    /// Text content must contain the literal
    Contains(String),
    /// Text content must not contain the literal
    Excludes(String),
}

/// Argument of a `key:(value)` constraint expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstraintArg<'a> {
    /// Numeric argument
    Number(f64),
    /// Text argument (string literal or identifier)
    Text(&'a str),
}

/// Error building a constraint from a key and argument.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstraintError {
    /// Key is not a known constraint
    #[error("unknown constraint '{0}'")]
    UnknownKey(String),

    /// Dimension constraint given a non-numeric argument
    #[error("constraint '{0}' expects a number")]
    ExpectedNumber(String),

    /// Text constraint given a numeric argument
    #[error("constraint '{0}' expects a name or string")]
    ExpectedText(String),

    /// Dimension outside `0..=65535` or not a whole number
    #[error("constraint '{key}' value {value} is not a valid dimension")]
    InvalidDimension {
        /// Constraint key
        key: String,
        /// Offending value
        value: f64,
    },
}

impl Constraint {
    /// Every recognized constraint key.
    pub const KEYS: [&'static str; 7] = [
        "min_width",
        "max_width",
        "min_height",
        "max_height",
        "requires",
        "contains",
        "excludes",
    ];

    /// Build a constraint from its DSL key and argument.
    pub fn build(key: &str, arg: ConstraintArg<'_>) -> Result<Self, ConstraintError> {
        let dimension = |arg: ConstraintArg<'_>| -> Result<u16, ConstraintError> {
            match arg {
                ConstraintArg::Number(n) if n.fract() == 0.0 && (0.0..=65535.0).contains(&n) => {
                    Ok(n as u16)
                }
                ConstraintArg::Number(value) => Err(ConstraintError::InvalidDimension {
                    key: key.to_string(),
                    value,
                }),
                ConstraintArg::Text(_) => Err(ConstraintError::ExpectedNumber(key.to_string())),
            }
        };
        let text = |arg: ConstraintArg<'_>| -> Result<String, ConstraintError> {
            match arg {
                ConstraintArg::Text(t) => Ok(t.to_string()),
                ConstraintArg::Number(_) => Err(ConstraintError::ExpectedText(key.to_string())),
            }
        };

        match key {
            "min_width" => dimension(arg).map(Constraint::MinWidth),
            "max_width" => dimension(arg).map(Constraint::MaxWidth),
            "min_height" => dimension(arg).map(Constraint::MinHeight),
            "max_height" => dimension(arg).map(Constraint::MaxHeight),
            "requires" => text(arg).map(Constraint::Requires),
            "contains" => text(arg).map(Constraint::Contains),
            "excludes" => text(arg).map(Constraint::Excludes),
            other => Err(ConstraintError::UnknownKey(other.to_string())),
        }
    }

    /// DSL key of this constraint.
    pub fn key(&self) -> &'static str {
        match self {
            Constraint::MinWidth(_) => "min_width",
            Constraint::MaxWidth(_) => "max_width",
            Constraint::MinHeight(_) => "min_height",
            Constraint::MaxHeight(_) => "max_height",
            Constraint::Requires(_) => "requires",
            Constraint::Contains(_) => "contains",
            Constraint::Excludes(_) => "excludes",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::MinWidth(n)
            | Constraint::MaxWidth(n)
            | Constraint::MinHeight(n)
            | Constraint::MaxHeight(n) => write!(f, "{}:({})", self.key(), n),
            Constraint::Requires(s) | Constraint::Contains(s) | Constraint::Excludes(s) => {
                write!(f, "{}:({:?})", self.key(), s)
            }
        }
    }
}
