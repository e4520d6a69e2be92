//! Recursive-descent parser for the pattern DSL.
//!
//! ```text
//! Source ::= Alpha ('@@' Alpha)*
//! Alpha  ::= '<' word (':' word)? Beta* '>' 'EXEC'
//! Beta   ::= '[' word ('=' word)? Gamma* ']'
//! Gamma  ::= '{' word (':' word)? Delta* '}'
//! Delta  ::= '(' value (',' value)* ')'
//! value  ::= STRING | NUMBER | IDENT | IDENT ':' '(' value ')'
//! ```
//!
//! Parsing stops at the first structural error. Which words are legal in
//! which position is left to the semantic analyzer. Pair nesting is capped
//! at [`CompilerSettings::max_nesting`] levels.

use gridsense_core::CompilerSettings;

use crate::ast::{Ast, Literal, Node, NodeId, SymbolId, Tier};
use crate::error::{ParseError, ParseErrorKind};
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parse a token stream produced by [`tokenize`](crate::lexer::tokenize).
pub fn parse(tokens: &[Token]) -> Result<Ast, ParseError> {
    Parser::new(tokens).parse_source()
}

/// Parser state over a token slice.
pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    /// Span of the last consumed token, used for end-of-input errors
    last_span: Span,
    eof: Token,
    ast: Ast,
    depth: usize,
    max_nesting: usize,
}

impl<'t> Parser<'t> {
    /// Creates a parser.
    pub fn new(tokens: &'t [Token]) -> Self {
        let end = tokens.last().map(|t| t.span).unwrap_or_else(Span::at_start);
        Self {
            tokens,
            pos: 0,
            last_span: end,
            eof: Token::new(TokenKind::Eof, end),
            ast: Ast::new(),
            depth: 0,
            max_nesting: CompilerSettings::default().max_nesting,
        }
    }

    /// Set the deepest pair nesting accepted in a value.
    #[must_use]
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Parse a whole compilation unit.
    pub fn parse_source(mut self) -> Result<Ast, ParseError> {
        loop {
            self.parse_alpha()?;
            if self.eat(&TokenKind::Chain) {
                continue;
            }
            if self.peek().kind == TokenKind::Eof {
                return Ok(self.ast);
            }
            return Err(self.error_here(ParseErrorKind::UnexpectedToken {
                expected: "'@@' or end of input".to_string(),
                found: self.peek().kind.name(),
            }));
        }
    }

    fn parse_alpha(&mut self) -> Result<NodeId, ParseError> {
        let open = self.expect_open(Tier::Alpha)?;
        let mut node = Node::new(Tier::Alpha, open);
        node.head = Some(self.expect_word("command")?);
        if self.eat(&TokenKind::Bridge) {
            node.bridge = Some(self.expect_word("pattern id after ':'")?);
        }
        let id = self.ast.push(node);

        let close = self.parse_children(id, Tier::Alpha)?;
        self.expect_exec()?;
        self.ast.node_mut(id).span = open.to(close);
        Ok(id)
    }

    fn parse_beta(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        let open = self.expect_open(Tier::Beta)?;
        let mut node = Node::new(Tier::Beta, open);
        node.parent = Some(parent);
        node.head = Some(self.expect_word("section name")?);
        if self.eat(&TokenKind::Assign) {
            node.assign = Some(self.expect_word("value after '='")?);
        }
        let id = self.ast.push(node);

        let close = self.parse_children(id, Tier::Beta)?;
        self.ast.node_mut(id).span = open.to(close);
        Ok(id)
    }

    fn parse_gamma(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        let open = self.expect_open(Tier::Gamma)?;
        let mut node = Node::new(Tier::Gamma, open);
        node.parent = Some(parent);
        node.head = Some(self.expect_word("parameter")?);
        if self.eat(&TokenKind::Bridge) {
            node.bridge = Some(self.expect_word("name after ':'")?);
        }
        let id = self.ast.push(node);

        let close = self.parse_children(id, Tier::Gamma)?;
        self.ast.node_mut(id).span = open.to(close);
        Ok(id)
    }

    fn parse_delta(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        let open = self.expect_open(Tier::Delta)?;
        let mut node = Node::new(Tier::Delta, open);
        node.parent = Some(parent);

        node.values.push(self.parse_value()?);
        while self.eat(&TokenKind::Comma) {
            node.values.push(self.parse_value()?);
        }
        let close = self.expect_close(Tier::Delta, "',' or ')'")?;

        node.span = open.to(close);
        Ok(self.ast.push(node))
    }

    /// Parse children one tier below `tier` until its closing bracket.
    ///
    /// Returns the span of the closing bracket.
    fn parse_children(&mut self, id: NodeId, tier: Tier) -> Result<Span, ParseError> {
        let Some(child) = tier.child() else {
            return self.expect_close(tier, "value");
        };
        let expected = format!("'{}' or '{}'", child.open_char(), tier.close_char());

        loop {
            let next = match self.peek().kind {
                TokenKind::Open(found) => Some(found),
                _ => None,
            };
            match next {
                Some(found) if found == child => {
                    match tier {
                        Tier::Alpha => self.parse_beta(id)?,
                        Tier::Beta => self.parse_gamma(id)?,
                        _ => self.parse_delta(id)?,
                    };
                }
                Some(found) => {
                    return Err(self.error_here(ParseErrorKind::TierMismatch {
                        expected: child,
                        found,
                    }));
                }
                None => return self.expect_close(tier, &expected),
            }
        }
    }

    fn parse_value(&mut self) -> Result<Literal, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Str(text) => {
                self.advance();
                Ok(Literal::Str(text))
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(Literal::Number(n))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.eat(&TokenKind::Bridge) {
                    if self.depth >= self.max_nesting {
                        return Err(ParseError::new(
                            ParseErrorKind::NestingTooDeep {
                                limit: self.max_nesting,
                            },
                            token.span,
                        ));
                    }
                    self.expect_open(Tier::Delta)?;
                    self.depth += 1;
                    let value = self.parse_value()?;
                    self.depth -= 1;
                    self.expect_close(Tier::Delta, "')'")?;
                    Ok(Literal::Pair {
                        key: name,
                        value: Box::new(value),
                    })
                } else {
                    Ok(Literal::Ident(name))
                }
            }
            TokenKind::Eof => Err(self.error_at_eof("value")),
            other => Err(self.error_here(ParseErrorKind::UnexpectedToken {
                expected: "value".to_string(),
                found: other.name(),
            })),
        }
    }

    fn expect_open(&mut self, tier: Tier) -> Result<Span, ParseError> {
        let token = self.peek();
        let span = token.span;
        match &token.kind {
            TokenKind::Open(found) if *found == tier => {}
            TokenKind::Open(found) => {
                return Err(ParseError::new(
                    ParseErrorKind::TierMismatch {
                        expected: tier,
                        found: *found,
                    },
                    span,
                ));
            }
            TokenKind::Eof => return Err(self.error_at_eof(&format!("'{}'", tier.open_char()))),
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedToken {
                        expected: format!("'{}'", tier.open_char()),
                        found: other.name(),
                    },
                    span,
                ));
            }
        }
        self.advance();
        Ok(span)
    }

    fn expect_close(&mut self, tier: Tier, expected: &str) -> Result<Span, ParseError> {
        let token = self.peek();
        let span = token.span;
        match &token.kind {
            TokenKind::Close(found) if *found == tier => {}
            TokenKind::Close(found) => {
                return Err(ParseError::new(
                    ParseErrorKind::TierMismatch {
                        expected: tier,
                        found: *found,
                    },
                    span,
                ));
            }
            TokenKind::Eof => return Err(self.error_at_eof(expected)),
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedToken {
                        expected: expected.to_string(),
                        found: other.name(),
                    },
                    span,
                ));
            }
        }
        self.advance();
        Ok(span)
    }

    fn expect_word(&mut self, expected: &str) -> Result<SymbolId, ParseError> {
        let token = self.peek();
        let word = match (&token.kind, token.kind.word()) {
            (_, Some(word)) => word.to_string(),
            (TokenKind::Eof, None) => return Err(self.error_at_eof(expected)),
            (other, None) => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedToken {
                        expected: expected.to_string(),
                        found: other.name(),
                    },
                    token.span,
                ));
            }
        };
        self.advance();
        Ok(self.ast.intern(&word))
    }

    fn expect_exec(&mut self) -> Result<(), ParseError> {
        if self.eat(&TokenKind::Exec) {
            Ok(())
        } else if self.peek().kind == TokenKind::Eof {
            Err(ParseError::new(ParseErrorKind::MissingExec, self.last_span))
        } else {
            Err(self.error_here(ParseErrorKind::MissingExec))
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn advance(&mut self) {
        if let Some(token) = self.tokens.get(self.pos) {
            self.last_span = token.span;
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error_here(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.peek().span)
    }

    fn error_at_eof(&self, expected: &str) -> ParseError {
        ParseError::new(
            ParseErrorKind::UnexpectedEof {
                expected: expected.to_string(),
            },
            self.last_span,
        )
    }
}
