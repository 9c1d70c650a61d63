//! Error types for the libclang front end.

use miette::Diagnostic;
use thiserror::Error;

/// Errors that stop a translation unit from being produced.
#[derive(Error, Diagnostic, Debug)]
pub enum ParseError {
    /// libclang could not be located or loaded.
    #[error("failed to load libclang: {0}")]
    #[diagnostic(
        code(ur::clang::load),
        help("install libclang or point LIBCLANG_PATH at the directory containing it")
    )]
    Load(String),

    /// clang_createIndex returned null.
    #[error("failed to create clang index")]
    #[diagnostic(code(ur::clang::index))]
    Index,

    /// An argument could not be passed to libclang.
    #[error("invalid argument for clang: {0:?}")]
    #[diagnostic(code(ur::clang::argument))]
    InvalidArgument(String),

    /// libclang reported a non-success error code.
    #[error("failed to parse {path} ({code}){}", format_diagnostics(.diagnostics))]
    #[diagnostic(code(ur::clang::parse))]
    Failed {
        path: String,
        code: String,
        diagnostics: Vec<String>,
    },
}

impl ParseError {
    /// Diagnostics collected before the failure, if any.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            ParseError::Failed { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

fn format_diagnostics(diagnostics: &[String]) -> String {
    if diagnostics.is_empty() {
        String::new()
    } else {
        format!(":\n{}", diagnostics.join("\n"))
    }
}
