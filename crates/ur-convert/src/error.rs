//! Error types for ur-convert.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;
use ur_clang::ParseError;

/// Result type for conversion runs.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors that abort a conversion run.
///
/// Everything below the translation unit level degrades instead of failing.
#[derive(Error, Diagnostic, Debug)]
pub enum ConvertError {
    /// The input file does not exist.
    #[error("input file not found: {}", .0.display())]
    #[diagnostic(code(ur::convert::input))]
    InputNotFound(PathBuf),

    /// The front end could not produce a translation unit.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}
