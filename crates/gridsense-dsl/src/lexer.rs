//! Lexer for the pattern DSL.
//!
//! The lexer converts source text into a stream of tokens ending in
//! [`TokenKind::Eof`]. Comments (`#` to end of line) and whitespace are
//! discarded. The first character that starts no token aborts the unit.

use crate::ast::Tier;
use crate::error::LexError;
use crate::keyword::{Command, Mode, Param, EXEC};
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Tokenize a whole compilation unit.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    Ok(tokens)
}

/// Lexer for pattern DSL source code.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Ok(Token::new(
                TokenKind::Eof,
                Span::new(start, start, start_line, start_column),
            ));
        };

        let kind = match c {
            '<' | '[' | '{' | '(' => {
                self.advance();
                TokenKind::Open(opening_tier(c))
            }
            '>' | ']' | '}' | ')' => {
                self.advance();
                TokenKind::Close(closing_tier(c))
            }
            '@' => {
                self.advance();
                if self.peek_char() == Some('@') {
                    self.advance();
                    TokenKind::Chain
                } else {
                    return Err(LexError::UnexpectedChar {
                        ch: '@',
                        span: Span::new(start, self.position, start_line, start_column),
                    });
                }
            }
            ':' => {
                self.advance();
                TokenKind::Bridge
            }
            '=' => {
                self.advance();
                TokenKind::Assign
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            '"' => self.scan_string(Span::new(start, start + 1, start_line, start_column))?,
            c if c.is_ascii_digit() => self.scan_number(),
            '-' if self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
            c if is_word_start(c) => self.scan_word(),
            c => {
                return Err(LexError::UnexpectedChar {
                    ch: c,
                    span: Span::new(start, start + c.len_utf8(), start_line, start_column),
                });
            }
        };

        Ok(Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        ))
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Peeks `n` characters ahead.
    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Advances past the next character.
    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Skips whitespace and `#` comments.
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.advance();
            } else if c == '#' {
                while let Some(c) = self.peek_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    /// Scans a string literal.
    ///
    /// `\"`, `\\`, `\n` and `\t` are decoded; any other escape is kept
    /// verbatim so regular expressions survive.
    fn scan_string(&mut self, opening: Span) -> Result<TokenKind, LexError> {
        self.advance(); // consume opening '"'
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('"') => text.push('"'),
                        Some('\\') => text.push('\\'),
                        Some('n') => text.push('\n'),
                        Some('t') => text.push('\t'),
                        Some(c) => {
                            text.push('\\');
                            text.push(c);
                        }
                        None => return Err(LexError::UnterminatedString { span: opening }),
                    }
                    self.advance();
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
                None => return Err(LexError::UnterminatedString { span: opening }),
            }
        }
        Ok(TokenKind::Str(text))
    }

    /// Scans a number with an optional sign and fraction.
    fn scan_number(&mut self) -> TokenKind {
        let start = self.position;
        let mut has_dot = false;

        if self.peek_char() == Some('-') {
            self.advance();
        }

        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !has_dot && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
            {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        // Digits with at most one inner dot always parse
        let value = self.source[start..self.position].parse::<f64>().unwrap_or(0.0);
        TokenKind::Number(value)
    }

    /// Scans an identifier or keyword.
    fn scan_word(&mut self) -> TokenKind {
        let start = self.position;
        while self.peek_char().is_some_and(is_word_char) {
            self.advance();
        }
        keyword_or_ident(&self.source[start..self.position])
    }
}

fn opening_tier(c: char) -> Tier {
    match c {
        '<' => Tier::Alpha,
        '[' => Tier::Beta,
        '{' => Tier::Gamma,
        _ => Tier::Delta,
    }
}

fn closing_tier(c: char) -> Tier {
    match c {
        '>' => Tier::Alpha,
        ']' => Tier::Beta,
        '}' => Tier::Gamma,
        _ => Tier::Delta,
    }
}

fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn keyword_or_ident(word: &str) -> TokenKind {
    if word == EXEC {
        return TokenKind::Exec;
    }
    if let Some(command) = Command::lookup(word) {
        return TokenKind::Command(command);
    }
    if let Some(mode) = Mode::lookup(word) {
        return TokenKind::Mode(mode);
    }
    if let Some(param) = Param::lookup(word) {
        return TokenKind::Param(param);
    }
    TokenKind::Ident(word.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_brackets_and_operators() {
        assert_eq!(
            kinds("<[{()}]> @@ : = ,"),
            vec![
                TokenKind::Open(Tier::Alpha),
                TokenKind::Open(Tier::Beta),
                TokenKind::Open(Tier::Gamma),
                TokenKind::Open(Tier::Delta),
                TokenKind::Close(Tier::Delta),
                TokenKind::Close(Tier::Gamma),
                TokenKind::Close(Tier::Beta),
                TokenKind::Close(Tier::Alpha),
                TokenKind::Chain,
                TokenKind::Bridge,
                TokenKind::Assign,
                TokenKind::Comma,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(
            kinds("hunt Track track EXEC exec GATHER tag"),
            vec![
                TokenKind::Command(Command::Hunt),
                TokenKind::Command(Command::Track),
                TokenKind::Ident("track".to_string()),
                TokenKind::Exec,
                TokenKind::Ident("exec".to_string()),
                TokenKind::Mode(Mode::Gather),
                TokenKind::Param(Param::Tag),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_identifier_with_keyword_prefix() {
        assert_eq!(
            kinds("tagged hunter"),
            vec![
                TokenKind::Ident("tagged".to_string()),
                TokenKind::Ident("hunter".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b" "c\\d" "\[(.+?)\]" "x\ty""#),
            vec![
                TokenKind::Str("a\"b".to_string()),
                TokenKind::Str("c\\d".to_string()),
                TokenKind::Str(r"\[(.+?)\]".to_string()),
                TokenKind::Str("x\ty".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("3 0.75 -2"),
            vec![
                TokenKind::Number(3.0),
                TokenKind::Number(0.75),
                TokenKind::Number(-2.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_trailing_dot_is_not_part_of_number() {
        let err = tokenize("1.").unwrap_err();
        assert!(matches!(err, LexError::UnexpectedChar { ch: '.', .. }));
    }

    #[test]
    fn test_comments_and_whitespace_discarded() {
        let source = "# leading comment\n<hunt # trailing\n>";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Open(Tier::Alpha),
                TokenKind::Command(Command::Hunt),
                TokenKind::Close(Tier::Alpha),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_hash_inside_string_is_not_comment() {
        assert_eq!(
            kinds(r##""#ff0000""##),
            vec![TokenKind::Str("#ff0000".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_spans_track_lines_and_columns() {
        let tokens = tokenize("<hunt\n  :Button>").unwrap();
        let bridge = &tokens[2];
        assert_eq!(bridge.kind, TokenKind::Bridge);
        assert_eq!(bridge.span.line, 2);
        assert_eq!(bridge.span.column, 3);
        assert_eq!(tokens[3].text("<hunt\n  :Button>"), "Button");
    }

    #[test]
    fn test_lone_at_is_error() {
        let err = tokenize("<hunt @ >").unwrap_err();
        assert_eq!(
            err,
            LexError::UnexpectedChar {
                ch: '@',
                span: Span::new(6, 7, 1, 7),
            }
        );
    }

    #[test]
    fn test_unknown_character_is_error() {
        let err = tokenize("<hunt ; >").unwrap_err();
        assert!(matches!(err, LexError::UnexpectedChar { ch: ';', .. }));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("{tag (\"[ }").unwrap_err();
        assert_eq!(
            err,
            LexError::UnterminatedString {
                span: Span::new(6, 7, 1, 7),
            }
        );
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(kinds("  # only a comment"), vec![TokenKind::Eof]);
    }
}
