//! Bracket-aware lexer.
//!
//! Turns rice source into a token vector ending in `Newline, Eof`. Newlines
//! are significant only while the innermost open bracket is a brace (the
//! whole file counts as one implicit brace), so argument lists and list
//! literals may span lines while block statements stay newline-terminated.

use crate::dialect::Dialect;
use crate::token::{SYMBOLS, Token, TokenKind};

/// Error raised while lexing. Every variant records a byte offset.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("string literal on line {line} not terminated")]
    UnterminatedString { offset: usize, line: usize },

    #[error("invalid escape sequence `\\{escape}` in string literal")]
    InvalidEscape { offset: usize, escape: String },

    #[error("unrecognized token: {text}")]
    Unrecognized { offset: usize, text: String },

    #[error("mismatched `{found}`: expected `{expected}`")]
    MismatchedBracket {
        offset: usize,
        found: char,
        expected: char,
    },

    #[error("unmatched closing `{found}`")]
    UnexpectedClose { offset: usize, found: char },

    #[error("unmatched: {open}")]
    UnclosedBracket { offset: usize, open: char },

    #[error("integer literal `{text}` does not fit in 64 bits")]
    IntegerOutOfRange { offset: usize, text: String },

    #[error("float literal `{text}` is out of range")]
    FloatOutOfRange { offset: usize, text: String },
}

impl LexError {
    pub fn offset(&self) -> usize {
        match self {
            LexError::UnterminatedString { offset, .. }
            | LexError::InvalidEscape { offset, .. }
            | LexError::Unrecognized { offset, .. }
            | LexError::MismatchedBracket { offset, .. }
            | LexError::UnexpectedClose { offset, .. }
            | LexError::UnclosedBracket { offset, .. }
            | LexError::IntegerOutOfRange { offset, .. }
            | LexError::FloatOutOfRange { offset, .. } => *offset,
        }
    }
}

/// 1-based line number of a byte offset.
pub fn line_of(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    1 + source.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count()
}

/// Tokenize a whole source text.
pub fn tokenize(source: &str, dialect: &Dialect) -> Result<Vec<Token>, LexError> {
    let tokens = Lexer::new(source, dialect).run()?;
    tracing::debug!(tokens = tokens.len(), bytes = source.len(), "lexed source");
    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Paren,
    Square,
    Brace,
}

impl Bracket {
    fn open_char(self) -> char {
        match self {
            Bracket::Paren => '(',
            Bracket::Square => '[',
            Bracket::Brace => '{',
        }
    }

    fn close_char(self) -> char {
        match self {
            Bracket::Paren => ')',
            Bracket::Square => ']',
            Bracket::Brace => '}',
        }
    }
}

struct Lexer<'a> {
    source: &'a str,
    dialect: &'a Dialect,
    pos: usize,
    /// Open brackets with the offset of their opener. Starts with the
    /// implicit top-level brace.
    brackets: Vec<(Bracket, usize)>,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, dialect: &'a Dialect) -> Self {
        Self {
            source,
            dialect,
            pos: 0,
            brackets: vec![(Bracket::Brace, 0)],
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            self.skip_trivia();

            if self.is_at_end() {
                if let Some(&(open, offset)) = self.brackets.get(1..).and_then(|rest| rest.last()) {
                    return Err(LexError::UnclosedBracket {
                        offset,
                        open: open.open_char(),
                    });
                }
                let end = self.source.len();
                self.tokens.push(Token::new(end, TokenKind::Newline));
                self.tokens.push(Token::new(end, TokenKind::Eof));
                return Ok(self.tokens);
            }

            let start = self.pos;
            let kind = self.next_kind()?;
            tracing::trace!(offset = start, kind = %kind, "token");
            self.tokens.push(Token::new(start, kind));
        }
    }

    // === Character navigation ===

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    // === Whitespace and comments ===

    /// A newline is plain whitespace unless the innermost bracket is a brace.
    fn newline_is_space(&self) -> bool {
        !matches!(self.brackets.last(), Some((Bracket::Brace, _)))
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c == '#' && self.dialect.comments {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.bump();
                }
            } else if c.is_whitespace() && (c != '\n' || self.newline_is_space()) {
                self.bump();
            } else {
                break;
            }
        }
    }

    // === Tokens ===

    fn next_kind(&mut self) -> Result<TokenKind, LexError> {
        let c = self.peek().unwrap_or('\0');

        if self.at_string_start() {
            return self.lex_string();
        }

        if c.is_ascii_digit() || (c == '.' && self.peek_second().is_some_and(|d| d.is_ascii_digit())) {
            return self.lex_number();
        }

        if let Some((text, kind)) = SYMBOLS.iter().find(|(text, _)| self.rest().starts_with(text)) {
            let start = self.pos;
            self.pos += text.len();
            self.track_bracket(kind, start)?;
            return Ok(kind.clone());
        }

        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(self.lex_word());
        }

        let start = self.pos;
        while self.peek().is_some_and(|c| !c.is_whitespace()) {
            self.bump();
        }
        Err(LexError::Unrecognized {
            offset: start,
            text: self.source[start..self.pos].to_string(),
        })
    }

    fn track_bracket(&mut self, kind: &TokenKind, offset: usize) -> Result<(), LexError> {
        let (bracket, opens) = match kind {
            TokenKind::LParen => (Bracket::Paren, true),
            TokenKind::LBracket => (Bracket::Square, true),
            TokenKind::LBrace => (Bracket::Brace, true),
            TokenKind::RParen => (Bracket::Paren, false),
            TokenKind::RBracket => (Bracket::Square, false),
            TokenKind::RBrace => (Bracket::Brace, false),
            _ => return Ok(()),
        };

        if opens {
            self.brackets.push((bracket, offset));
            return Ok(());
        }

        let found = bracket.close_char();
        if self.brackets.len() == 1 {
            return Err(LexError::UnexpectedClose { offset, found });
        }
        match self.brackets.pop() {
            Some((open, _)) if open == bracket => Ok(()),
            Some((open, _)) => Err(LexError::MismatchedBracket {
                offset,
                found,
                expected: open.close_char(),
            }),
            None => Err(LexError::UnexpectedClose { offset, found }),
        }
    }

    fn lex_word(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        let word = &self.source[start..self.pos];
        match self.dialect.keywords.lookup(word) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Name(word.to_string()),
        }
    }

    fn lex_number(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }

        let is_float =
            self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit());
        if !is_float {
            let text = &self.source[start..self.pos];
            return text
                .parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| LexError::IntegerOutOfRange {
                    offset: start,
                    text: text.to_string(),
                });
        }

        self.bump();
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let text = &self.source[start..self.pos];
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(TokenKind::Float(value)),
            _ => Err(LexError::FloatOutOfRange {
                offset: start,
                text: text.to_string(),
            }),
        }
    }

    // === Strings ===

    fn at_string_start(&self) -> bool {
        let mut chars = self.rest().chars();
        match chars.next() {
            Some('"' | '\'') => true,
            Some('r') => matches!(chars.next(), Some('"' | '\'')),
            _ => false,
        }
    }

    fn lex_string(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        let raw = self.peek() == Some('r');
        if raw {
            self.bump();
        }

        let quote = self.peek().unwrap_or('"');
        let triple: String = std::iter::repeat_n(quote, 3).collect();
        let delimiter = if self.rest().starts_with(&triple) {
            triple
        } else {
            quote.to_string()
        };
        self.pos += delimiter.len();
        let multiline = delimiter.len() == 3;

        let unterminated = |source: &str| LexError::UnterminatedString {
            offset: start,
            line: line_of(source, start),
        };

        let mut value = String::new();
        loop {
            if self.rest().starts_with(&delimiter) {
                self.pos += delimiter.len();
                return Ok(TokenKind::Str(value));
            }
            match self.bump() {
                None => return Err(unterminated(self.source)),
                Some('\n') if !multiline => return Err(unterminated(self.source)),
                Some('\\') if !raw => {
                    let escape_at = self.pos - 1;
                    self.decode_escape(escape_at, &mut value)
                        .map_err(|err| err.unwrap_or_else(|| unterminated(self.source)))?;
                }
                Some(c) => value.push(c),
            }
        }
    }

    /// Decode the escape after a backslash into `out`.
    ///
    /// `Err(None)` means the input ended mid-escape.
    fn decode_escape(&mut self, offset: usize, out: &mut String) -> Result<(), Option<LexError>> {
        let c = self.bump().ok_or(None)?;
        let simple = match c {
            '\n' => return Ok(()),
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            self.bump();
                        }
                        None => break,
                    }
                }
                return self.push_code(offset, code, out);
            }
            'x' => return self.decode_hex(offset, 2, out),
            'u' => return self.decode_hex(offset, 4, out),
            'U' => return self.decode_hex(offset, 8, out),
            other => {
                return Err(Some(LexError::InvalidEscape {
                    offset,
                    escape: other.to_string(),
                }));
            }
        };
        out.push(simple);
        Ok(())
    }

    fn decode_hex(
        &mut self,
        offset: usize,
        digits: usize,
        out: &mut String,
    ) -> Result<(), Option<LexError>> {
        let body_start = self.pos;
        let mut code = 0u32;
        for _ in 0..digits {
            let c = self.peek().ok_or(None)?;
            let Some(digit) = c.to_digit(16) else {
                return Err(Some(LexError::InvalidEscape {
                    offset,
                    escape: self.source[body_start - 1..self.pos].to_string(),
                }));
            };
            code = code * 16 + digit;
            self.bump();
        }
        self.push_code(offset, code, out)
    }

    fn push_code(&self, offset: usize, code: u32, out: &mut String) -> Result<(), Option<LexError>> {
        match char::from_u32(code) {
            Some(c) => {
                out.push(c);
                Ok(())
            }
            None => Err(Some(LexError::InvalidEscape {
                offset,
                escape: self.source[offset + 1..self.pos].to_string(),
            })),
        }
    }
}
