//! Output writers - emit IR as source code.

pub mod cpp;

pub use cpp::{CPP_WRITER, CppWriter, CppWriterImpl, POSTFIX, PREAMBLE, rename};
