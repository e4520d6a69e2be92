//! # gridsense-dsl
//!
//! Compiler for the gridsense pattern DSL.
//!
//! This crate provides:
//! - A lexer producing positioned tokens
//! - A recursive descent parser over four bracket tiers into an arena AST
//! - A semantic analyzer that collects every diagnostic with its severity
//! - An interpreter that registers patterns and emits directives
//!
//! ```text
//! <hunt:Button [MARKERS {tag ("[", "]")} {pluck (button_text, "\[(.+?)\]")}]> EXEC
//! ```
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on gridsense-core and
//! gridsense-engine. Compiled patterns go straight into a
//! [`gridsense_engine::PatternRegistry`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod compiler;
pub mod error;
pub mod interpreter;
pub mod keyword;
pub mod lexer;
pub mod naming;
pub mod parser;
pub mod semantic;
pub mod span;
pub mod token;

// Re-export commonly used types
pub use ast::{Ast, Literal, Node, NodeId, Tier};
pub use compiler::{compile, CompileOutput, Compiler};
pub use error::{
    CompileError, InterpretError, LexError, ParseError, ParseErrorKind, SemanticError,
    SemanticErrorKind, Severity,
};
pub use interpreter::{interpret, Interpretation, Interpreter};
pub use keyword::{Command, Mode, Param};
pub use lexer::tokenize;
pub use parser::{parse, Parser};
pub use semantic::{analyze, Analyzer, ValidatedAst};
pub use span::Span;
pub use token::{Token, TokenKind};
