//! Token types produced by the lexer.

use crate::dialect::Keyword;
use std::fmt;

/// A single token: what it is and where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Byte offset of the token's first character in the source.
    pub offset: usize,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(offset: usize, kind: TokenKind) -> Self {
        Self { offset, kind }
    }
}

/// Every kind of token, with the decoded value for literals and names.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),

    Keyword(Keyword),

    // Brackets
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // Operators and punctuation
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Comma,
    Assign,
    Backslash,
    Arrow,
    Dot,
    Semicolon,
    Newline,

    Eof,
}

/// Fixed symbol table, longest lexemes first so matching is greedy.
pub const SYMBOLS: &[(&str, TokenKind)] = &[
    ("->", TokenKind::Arrow),
    ("\n", TokenKind::Newline),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    (",", TokenKind::Comma),
    ("=", TokenKind::Assign),
    ("\\", TokenKind::Backslash),
    (".", TokenKind::Dot),
    (";", TokenKind::Semicolon),
];

impl TokenKind {
    /// The source spelling of a symbol token.
    pub fn symbol(&self) -> Option<&'static str> {
        SYMBOLS
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(text, _)| *text)
    }

    /// Newlines and semicolons both end a statement.
    pub fn is_separator(&self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Semicolon)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(v) => write!(f, "integer `{v}`"),
            TokenKind::Float(v) => write!(f, "float `{v:?}`"),
            TokenKind::Str(_) => f.write_str("string literal"),
            TokenKind::Name(name) => write!(f, "name `{name}`"),
            TokenKind::Keyword(kw) => write!(f, "keyword `{kw}`"),
            TokenKind::Newline => f.write_str("newline"),
            TokenKind::Eof => f.write_str("end of input"),
            other => match other.symbol() {
                Some(text) => write!(f, "`{text}`"),
                None => write!(f, "{other:?}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_longest_first() {
        let arrow = SYMBOLS.iter().position(|(s, _)| *s == "->").unwrap();
        let minus = SYMBOLS.iter().position(|(s, _)| *s == "-").unwrap();
        assert!(arrow < minus);
    }

    #[test]
    fn test_display() {
        assert_eq!(TokenKind::LParen.to_string(), "`(`");
        assert_eq!(TokenKind::Arrow.to_string(), "`->`");
        assert_eq!(TokenKind::Assign.to_string(), "`=`");
        assert_eq!(TokenKind::Newline.to_string(), "newline");
        assert_eq!(TokenKind::Eof.to_string(), "end of input");
        assert_eq!(TokenKind::Name("x".into()).to_string(), "name `x`");
        assert_eq!(
            TokenKind::Keyword(Keyword::While).to_string(),
            "keyword `while`"
        );
    }
}
