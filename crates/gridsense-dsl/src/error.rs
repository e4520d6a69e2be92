//! Error types for the DSL compiler.

use std::fmt;

use gridsense_core::ConstraintError;
use gridsense_engine::DuplicateIdError;
use thiserror::Error;

use crate::ast::Tier;
use crate::keyword::{Command, Param};
use crate::span::Span;

/// Lexical error; aborts tokenization of the unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// Character that starts no token
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar {
        /// The offending character
        ch: char,
        /// Where it occurs
        span: Span,
    },

    /// String literal without a closing quote
    #[error("unterminated string starting at {span}")]
    UnterminatedString {
        /// Span of the opening quote
        span: Span,
    },
}

impl LexError {
    /// Location of the error.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } | LexError::UnterminatedString { span } => *span,
        }
    }
}

/// Structural error; parsing stops at the first one.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}")]
pub struct ParseError {
    /// What went wrong
    pub kind: ParseErrorKind,
    /// Where it went wrong
    pub span: Span,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Kind of parse error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    /// Bracket of the wrong tier
    #[error("expected {expected} bracket, found {found} bracket")]
    TierMismatch {
        /// Tier the grammar allows here
        expected: Tier,
        /// Tier of the bracket found
        found: Tier,
    },

    /// Token the grammar does not allow here
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        /// Description of what was expected
        expected: String,
        /// Description of the token found
        found: String,
    },

    /// Input ended inside a construct
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// Description of what was expected
        expected: String,
    },

    /// Top-level block not followed by `EXEC`
    #[error("block must be terminated by 'EXEC'")]
    MissingExec,

    /// Value pairs nested past the configured limit
    #[error("value nesting exceeds {limit} levels")]
    NestingTooDeep {
        /// Deepest nesting accepted
        limit: usize,
    },
}

/// Severity of a semantic diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Reported but does not fail compilation
    Warning,
    /// Fails compilation
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Semantic diagnostic.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{severity}: {kind} at {span}")]
pub struct SemanticError {
    /// Error or warning
    pub severity: Severity,
    /// What is wrong
    pub kind: SemanticErrorKind,
    /// Where it is wrong
    pub span: Span,
}

impl SemanticError {
    /// Error-severity diagnostic.
    pub fn error(kind: SemanticErrorKind, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            span,
        }
    }

    /// Warning-severity diagnostic.
    pub fn warning(kind: SemanticErrorKind, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            span,
        }
    }

    /// Whether this diagnostic fails compilation.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Kind of semantic diagnostic.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticErrorKind {
    /// Block head is not a command keyword
    #[error("top-level block must start with a command, found '{found}'")]
    NotACommand { found: String },

    /// `hunt` or `Track` without a bridge
    #[error("'{command}' requires a pattern id (e.g. <{command}:Name ...>)")]
    MissingPatternId { command: Command },

    /// Section headed by a command keyword
    #[error("command '{found}' cannot head a section")]
    CommandAsSectionHead { found: String },

    /// Section assigned a command keyword
    #[error("command '{found}' cannot be assigned to a section")]
    CommandAsAssign { found: String },

    /// Mode keyword outside a `Track` section assign
    #[error("mode '{mode}' is only valid in a section under 'Track'")]
    ModeOutsideTrack { mode: String },

    /// `Track` section without a mode
    #[error("sections under 'Track' must be assigned GATHER or HARVEST, found {}", .found.as_deref().unwrap_or("nothing"))]
    TrackModeRequired { found: Option<String> },

    /// Entry head is not a parameter keyword
    #[error("unknown parameter '{found}'")]
    UnknownParam { found: String },

    /// Rule parameter under `forge` or `weave`
    #[error("parameter '{param}' is not allowed under '{command}'")]
    ParamNotAllowed { param: Param, command: Command },

    /// Wrong number or shape of values
    #[error("invalid arguments for '{param}': {reason}")]
    InvalidArguments { param: Param, reason: String },

    /// Pluck pattern rejected by the regex compiler
    #[error("pattern '{pattern}' does not compile: {reason}")]
    InvalidRegex { pattern: String, reason: String },

    /// Trap pair rejected
    #[error(transparent)]
    InvalidConstraint(ConstraintError),

    /// `boil` value outside `[0, 1]`
    #[error("threshold {value} is outside [0, 1]")]
    ThresholdOutOfRange { value: f64 },

    /// `boil` given twice in one block
    #[error("threshold set more than once")]
    DuplicateThreshold,

    /// Two different component types in one block
    #[error("conflicting component types '{first}' and '{second}'")]
    ConflictingComponentType { first: String, second: String },

    /// Naming convention violation
    #[error("{role} '{name}' should be {convention}")]
    Naming {
        role: &'static str,
        name: String,
        convention: &'static str,
    },
}

/// Failure scoped to one top-level block.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpretError {
    /// `from:Id` names a pattern that is not registered
    #[error("undefined pattern '{target}' at {span}")]
    UndefinedPattern {
        /// Referenced pattern id
        target: String,
        /// Location of the reference
        span: Span,
    },

    /// The compiled pattern clashes with a registered one
    #[error("{source} at {span}")]
    Duplicate {
        /// Registry rejection
        source: DuplicateIdError,
        /// Location of the block
        span: Span,
    },
}

/// Failure of a whole compilation unit.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Tokenization failed
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),

    /// Parsing failed
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Semantic analysis reported errors; carries every diagnostic
    #[error("semantic analysis failed with {} error(s)", error_count(.0))]
    Semantic(Vec<SemanticError>),

    /// More sources than the configured limit
    #[error("too many sources: {count} (limit {limit})")]
    TooManySources {
        /// Sources submitted
        count: usize,
        /// Configured limit
        limit: usize,
    },

    /// A named unit of a multi-source run failed
    #[error("{name}: {error}")]
    InUnit {
        /// Name of the failing unit
        name: String,
        /// Failure of that unit
        #[source]
        error: Box<CompileError>,
    },
}

fn error_count(diagnostics: &[SemanticError]) -> usize {
    diagnostics.iter().filter(|d| d.is_error()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_display() {
        let err = LexError::UnexpectedChar {
            ch: '@',
            span: Span::new(4, 5, 1, 5),
        };
        assert_eq!(err.to_string(), "unexpected character '@' at 1:5");
        assert_eq!(err.span().start, 4);
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new(
            ParseErrorKind::TierMismatch {
                expected: Tier::Gamma,
                found: Tier::Alpha,
            },
            Span::new(10, 11, 2, 3),
        );
        assert_eq!(err.to_string(), "expected gamma bracket, found alpha bracket at 2:3");
    }

    #[test]
    fn test_semantic_error_display() {
        let err = SemanticError::warning(
            SemanticErrorKind::Naming {
                role: "pattern id",
                name: "button".to_string(),
                convention: "PascalCase",
            },
            Span::new(0, 6, 1, 7),
        );
        assert_eq!(err.to_string(), "warning: pattern id 'button' should be PascalCase at 1:7");
        assert!(!err.is_error());
    }

    #[test]
    fn test_compile_error_counts_only_errors() {
        let diagnostics = vec![
            SemanticError::error(SemanticErrorKind::DuplicateThreshold, Span::at_start()),
            SemanticError::warning(
                SemanticErrorKind::Naming {
                    role: "section",
                    name: "markers".to_string(),
                    convention: "SCREAMING_SNAKE_CASE",
                },
                Span::at_start(),
            ),
        ];
        let err = CompileError::Semantic(diagnostics);
        assert_eq!(err.to_string(), "semantic analysis failed with 1 error(s)");
    }

    #[test]
    fn test_track_mode_required_display() {
        let kind = SemanticErrorKind::TrackModeRequired { found: None };
        assert_eq!(
            kind.to_string(),
            "sections under 'Track' must be assigned GATHER or HARVEST, found nothing"
        );
    }
}
