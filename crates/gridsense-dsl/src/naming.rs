//! Naming conventions for pattern DSL identifiers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PASCAL_CASE: Regex = Regex::new(r"^[A-Z][A-Za-z0-9]*$").expect("valid regex");
    static ref CAMEL_CASE: Regex = Regex::new(r"^[a-z][A-Za-z0-9]*$").expect("valid regex");
    static ref SNAKE_CASE: Regex = Regex::new(r"^[a-z][a-z0-9]*(_[a-z0-9]+)*$").expect("valid regex");
    static ref SCREAMING_SNAKE_CASE: Regex =
        Regex::new(r"^[A-Z][A-Z0-9]*(_[A-Z0-9]+)*$").expect("valid regex");
}

/// Identifier convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// `LoginButton`
    PascalCase,
    /// `primaryLabel`
    CamelCase,
    /// `button_text`
    SnakeCase,
    /// `MARKERS`, `TEXT_FIELDS`
    ScreamingSnakeCase,
}

impl Convention {
    /// Whether `name` follows the convention.
    pub fn matches(self, name: &str) -> bool {
        match self {
            Convention::PascalCase => PASCAL_CASE.is_match(name),
            Convention::CamelCase => CAMEL_CASE.is_match(name),
            Convention::SnakeCase => SNAKE_CASE.is_match(name),
            Convention::ScreamingSnakeCase => SCREAMING_SNAKE_CASE.is_match(name),
        }
    }

    /// Name used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Convention::PascalCase => "PascalCase",
            Convention::CamelCase => "camelCase",
            Convention::SnakeCase => "snake_case",
            Convention::ScreamingSnakeCase => "SCREAMING_SNAKE_CASE",
        }
    }
}

/// Convert an identifier to snake_case.
///
/// Acronyms stay together: `HTTPServer` becomes `http_server`.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}
