//! Input readers - parse source code into IR.

pub mod rice;

pub use rice::{
    ParseError, RICE_MINIMAL_READER, RICE_READER, RICE_SCRIPT_READER, RiceReader, read_rice,
};
