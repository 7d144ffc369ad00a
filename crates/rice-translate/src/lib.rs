//! Translation from the rice scripting language to C++14.
//!
//! `rice-translate` reads rice source into a small IR and writes that IR
//! out as a self-contained C++ translation unit. It maps syntax, not
//! semantics: rice values become shared-ownership C++ values and rice
//! functions become generic lambdas, with the runtime support supplied by
//! a fixed preamble.
//!
//! # Architecture
//!
//! ```text
//! Source           Tokens          IR              Target
//! ──────────    ───────────    ─────────────    ──────────
//! rice      ─┐
//! rcl       ─┼─> lexer.rs ───> Program ───────> C++ (output/cpp.rs)
//! r2        ─┘   (Dialect)     (ir/mod.rs)
//! ```
//!
//! The three source dialects differ only in their [`Dialect`]: which words
//! are keywords, whether `#` comments exist, whether the program is a
//! script or a module of `def`s, and which postfix forms are allowed.
//!
//! # Example
//!
//! ```
//! use rice_translate::{Dialect, translate};
//!
//! let cpp = translate("var x = 1 + 2\nprint(x)\n", &Dialect::SCRIPT).unwrap();
//! assert!(cpp.contains("auto rrx = (1ll + 2ll);"));
//! assert!(cpp.contains("rrprint(rrx);"));
//! ```

pub mod dialect;
pub mod input;
pub mod ir;
pub mod lexer;
pub mod output;
pub mod registry;
pub mod token;
pub mod traits;

// Re-exports: IR types
pub use ir::{BinaryOp, Expr, Function, Literal, Program, Stmt, StructureEq};

// Re-exports: Dialects
pub use dialect::{ConfigError, Dialect, Keyword, KeywordSet, Preset, ProgramForm};

// Re-exports: Traits
pub use traits::{ReadError, Reader, Writer};

// Re-exports: Registry
pub use registry::{
    reader_for_extension, reader_for_language, readers, register_reader, register_writer,
    writer_for_language, writers,
};

// Re-exports: Built-in readers and writers
pub use input::{ParseError, RiceReader, read_rice};
pub use lexer::{LexError, tokenize};
pub use output::{CppWriter, CppWriterImpl};

/// Translate rice source to a complete C++ translation unit.
///
/// Fails on the first lexical or syntax error; no partial output is
/// produced.
pub fn translate(source: &str, dialect: &Dialect) -> Result<String, ReadError> {
    let program = read_rice(source, dialect)?;
    let cpp = CppWriter::emit(&program);
    tracing::debug!(
        source_bytes = source.len(),
        output_bytes = cpp.len(),
        "translated rice to C++"
    );
    Ok(cpp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_surfaces_first_error() {
        let err = translate("var = 5\n", &Dialect::SCRIPT).unwrap_err();
        assert!(matches!(err, ReadError::Parse(ParseError::Expected { .. })));
        assert_eq!(err.render("var = 5\n"), format!("line 1: {err}"));
    }

    #[test]
    fn test_translate_module() {
        let cpp = translate("def main() {\n  print(\"hi\")\n}\n", &Dialect::FULL).unwrap();
        assert!(cpp.contains("auto rrmain = []() {\n    rrprint(String(\"hi\"));\n};"));
        assert!(cpp.ends_with(output::POSTFIX));
    }
}
