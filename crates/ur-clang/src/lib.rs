//! libclang front end for the Ur C-to-Rust converter.
//!
//! This crate provides:
//! - C source parsing via libclang
//! - An owned snapshot of the cursor tree ([`ClangNode`])
//! - The C type model and its mapping onto Rust types ([`CType`])
//!
//! # Architecture
//!
//! ```text
//! C Source → libclang → ClangAst → ur-convert
//! ```

mod ast;
mod error;
mod parse;
mod types;

pub use ast::{BinaryOp, ClangAst, ClangNode, ClangNodeKind, SourceLocation, UnaryOp};
pub use error::ParseError;
pub use parse::{ClangParser, ParseOptions};
pub use types::{known_typedef, strip_qualifiers, CType};

use std::path::Path;

/// Parse a C source file with a freshly loaded libclang.
pub fn parse_c_file(path: &Path, options: &ParseOptions) -> Result<ClangAst, ParseError> {
    let parser = ClangParser::new()?;
    parser.parse_file(path, options)
}
