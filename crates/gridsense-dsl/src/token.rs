//! Token types for the pattern DSL.
//!
//! Tokens are the output of the lexer and input to the parser.

use crate::ast::Tier;
use crate::keyword::{Command, Mode, Param, EXEC};
use crate::span::Span;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the lexeme this token covers in the given source.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

/// Token types for the pattern DSL.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// Opening bracket of a tier (`<`, `[`, `{`, `(`)
    Open(Tier),
    /// Closing bracket of a tier (`>`, `]`, `}`, `)`)
    Close(Tier),

    /// `@@`
    Chain,
    /// `:`
    Bridge,
    /// `=`
    Assign,
    /// `,`
    Comma,

    /// Command keyword
    Command(Command),
    /// Mode keyword
    Mode(Mode),
    /// Parameter keyword
    Param(Param),
    /// `EXEC`
    Exec,

    /// Identifier
    Ident(String),
    /// String literal with escapes decoded
    Str(String),
    /// Number literal
    Number(f64),

    /// End of input
    Eof,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            TokenKind::Open(tier) => format!("'{}'", tier.open_char()),
            TokenKind::Close(tier) => format!("'{}'", tier.close_char()),
            TokenKind::Chain => "'@@'".to_string(),
            TokenKind::Bridge => "':'".to_string(),
            TokenKind::Assign => "'='".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Command(c) => format!("command '{c}'"),
            TokenKind::Mode(m) => format!("mode '{m}'"),
            TokenKind::Param(p) => format!("parameter '{p}'"),
            TokenKind::Exec => format!("'{EXEC}'"),
            TokenKind::Ident(name) => format!("identifier '{name}'"),
            TokenKind::Str(_) => "string".to_string(),
            TokenKind::Number(_) => "number".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }

    /// Word usable as a head, bridge or assign: identifiers and keywords
    /// other than `EXEC`.
    #[must_use]
    pub fn word(&self) -> Option<&str> {
        match self {
            TokenKind::Ident(name) => Some(name),
            TokenKind::Command(c) => Some(c.as_str()),
            TokenKind::Mode(m) => Some(m.as_str()),
            TokenKind::Param(p) => Some(p.as_str()),
            _ => None,
        }
    }

    /// Tier of a bracket token, opening or closing.
    #[must_use]
    pub const fn bracket_tier(&self) -> Option<Tier> {
        match self {
            TokenKind::Open(tier) | TokenKind::Close(tier) => Some(*tier),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_names() {
        assert_eq!(TokenKind::Open(Tier::Beta).name(), "'['");
        assert_eq!(TokenKind::Close(Tier::Alpha).name(), "'>'");
        assert_eq!(TokenKind::Command(Command::Track).name(), "command 'Track'");
        assert_eq!(TokenKind::Eof.name(), "end of input");
    }

    #[test]
    fn test_word() {
        assert_eq!(TokenKind::Ident("MARKERS".into()).word(), Some("MARKERS"));
        assert_eq!(TokenKind::Mode(Mode::Harvest).word(), Some("HARVEST"));
        assert_eq!(TokenKind::Exec.word(), None);
        assert_eq!(TokenKind::Str("x".into()).word(), None);
    }

    #[test]
    fn test_token_text() {
        let source = "<hunt";
        let token = Token::new(TokenKind::Command(Command::Hunt), Span::new(1, 5, 1, 2));
        assert_eq!(token.text(source), "hunt");
    }
}
