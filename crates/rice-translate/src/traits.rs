//! Traits for language readers and writers.

use crate::input::ParseError;
use crate::ir::Program;
use crate::lexer::{LexError, line_of};

/// Error that can occur when reading source code into IR.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl ReadError {
    /// Byte offset of the offending input.
    pub fn offset(&self) -> usize {
        match self {
            ReadError::Lex(err) => err.offset(),
            ReadError::Parse(err) => err.offset(),
        }
    }

    /// One-line message prefixed with the 1-based source line.
    pub fn render(&self, source: &str) -> String {
        format!("line {}: {}", line_of(source, self.offset()), self)
    }
}

/// A reader parses source code into the IR.
pub trait Reader: Send + Sync {
    /// Language identifier (e.g., "rice", "rice-script").
    fn language(&self) -> &'static str;

    /// File extensions this reader handles (e.g., &["rice"]).
    fn extensions(&self) -> &'static [&'static str];

    /// Parse source code into the IR.
    fn read(&self, source: &str) -> Result<Program, ReadError>;
}

/// A writer emits the IR as source code in a target language.
pub trait Writer: Send + Sync {
    /// Language identifier (e.g., "cpp").
    fn language(&self) -> &'static str;

    /// File extension for output (e.g., "cpp").
    fn extension(&self) -> &'static str;

    /// Emit the IR as source code.
    fn write(&self, program: &Program) -> String;
}
