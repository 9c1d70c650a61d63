//! Error types for ur-config.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for ur-config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading `ur.toml`.
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file: {0}")]
    #[diagnostic(code(ur::config::read))]
    ReadConfig(#[from] std::io::Error),

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    #[diagnostic(code(ur::config::toml))]
    ParseToml(#[from] toml::de::Error),

    /// Configuration validation error.
    #[error("Config validation error: {0}")]
    #[diagnostic(code(ur::config::invalid), help("see the [[placement.rule]] section of ur.toml"))]
    Validation(String),

    /// No input file was configured or given.
    #[error("No input file: set [input] path in ur.toml or pass one on the command line")]
    #[diagnostic(code(ur::config::input))]
    MissingInput,
}
