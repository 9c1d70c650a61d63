//! Conversion configuration types (ur.toml format).

use crate::error::ConfigError;
use crate::policy::RulePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use ur_convert::{ConversionParameters, Preamble};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrConfig {
    /// Source file and front-end settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Where and how buffers are written.
    #[serde(default)]
    pub output: OutputConfig,

    /// Declaration routing.
    #[serde(default)]
    pub placement: PlacementConfig,
}

/// Input settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    /// C source file (relative paths resolve against the config file).
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Preprocessor definitions, in order (`NAME` or `NAME=VALUE`).
    #[serde(default)]
    pub defines: Vec<String>,

    /// System include search path.
    #[serde(default)]
    pub include_paths: Vec<String>,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory buffers are written to.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// File extension of written buffers.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Start each buffer with a `// Generated by Ur at ...` line.
    #[serde(default = "default_true")]
    pub generated_header: bool,

    /// Lines written after the header.
    #[serde(default = "default_prelude")]
    pub prelude: Vec<String>,
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_extension() -> String {
    "rs".to_string()
}

fn default_true() -> bool {
    true
}

fn default_prelude() -> Vec<String> {
    Preamble::default().prelude
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            extension: default_extension(),
            generated_header: true,
            prelude: default_prelude(),
        }
    }
}

/// Placement settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Buffer for declarations no rule routes; absent means they are skipped.
    #[serde(default)]
    pub default_buffer: Option<String>,

    /// Routing rules; the first match wins.
    #[serde(rename = "rule", default)]
    pub rules: Vec<PlacementRule>,
}

/// Declaration category a rule applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Struct,
    Enum,
    Global,
    Function,
    /// Every category.
    #[default]
    Any,
}

/// One `[[placement.rule]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRule {
    #[serde(default)]
    pub kind: RuleKind,

    /// Exact C name.
    #[serde(default)]
    pub name: Option<String>,

    /// C name prefix.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Destination buffer (falls back to `default_buffer`).
    #[serde(default)]
    pub buffer: Option<String>,

    /// New name; `{name}` expands to the C name.
    #[serde(default)]
    pub rename: Option<String>,

    /// Register the declaration but emit nothing.
    #[serde(default)]
    pub skip: bool,

    /// Functions only: minimum parameter count.
    #[serde(default)]
    pub min_params: Option<usize>,

    /// Functions only: maximum parameter count.
    #[serde(default)]
    pub max_params: Option<usize>,
}

impl PlacementRule {
    /// Route declarations named `name` into `buffer`.
    pub fn named(kind: RuleKind, name: &str, buffer: &str) -> Self {
        Self {
            kind,
            name: Some(name.to_string()),
            buffer: Some(buffer.to_string()),
            ..Default::default()
        }
    }

    /// Route declarations starting with `prefix` into `buffer`.
    pub fn prefixed(kind: RuleKind, prefix: &str, buffer: &str) -> Self {
        Self {
            kind,
            prefix: Some(prefix.to_string()),
            buffer: Some(buffer.to_string()),
            ..Default::default()
        }
    }

    fn describe(&self) -> String {
        match (&self.name, &self.prefix) {
            (Some(name), _) => format!("rule for {:?}", name),
            (None, Some(prefix)) => format!("rule for prefix {:?}", prefix),
            (None, None) => "rule".to_string(),
        }
    }

    fn validate(&self) -> crate::Result<()> {
        let invalid =
            |msg: &str| Err(ConfigError::Validation(format!("{}: {}", self.describe(), msg)));

        match (&self.name, &self.prefix) {
            (None, None) => return invalid("needs a name or a prefix"),
            (Some(_), Some(_)) => return invalid("name and prefix are exclusive"),
            _ => {}
        }
        if self.skip && (self.buffer.is_some() || self.rename.is_some()) {
            return invalid("skip cannot be combined with buffer or rename");
        }
        if let Some(buffer) = &self.buffer {
            if buffer.is_empty() || buffer.contains(['/', '\\']) {
                return invalid("buffer must be a plain file stem");
            }
        }
        if self.min_params.is_some() || self.max_params.is_some() {
            if !matches!(self.kind, RuleKind::Function | RuleKind::Any) {
                return invalid("parameter bounds only apply to functions");
            }
            if let (Some(min), Some(max)) = (self.min_params, self.max_params) {
                if min > max {
                    return invalid("min_params is greater than max_params");
                }
            }
        }
        Ok(())
    }
}

impl UrConfig {
    /// Load configuration from a TOML file.
    ///
    /// Relative input and output paths are resolved against the file's directory.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;

        if let Some(base) = path.parent() {
            if let Some(input) = &config.input.path {
                if input.is_relative() {
                    config.input.path = Some(base.join(input));
                }
            }
            if config.output.directory.is_relative() {
                config.output.directory = base.join(&config.output.directory);
            }
        }
        debug!("loaded {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn parse(content: &str) -> crate::Result<Self> {
        let config: UrConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if let Some(buffer) = &self.placement.default_buffer {
            if buffer.contains(['/', '\\']) {
                return Err(ConfigError::Validation(format!(
                    "default_buffer {:?} must be a plain file stem",
                    buffer
                )));
            }
        }
        if self.output.extension.starts_with('.') {
            return Err(ConfigError::Validation(format!(
                "extension {:?} must not start with a dot",
                self.output.extension
            )));
        }
        self.placement.rules.iter().try_for_each(PlacementRule::validate)
    }

    /// Preamble written at the top of each buffer, if any.
    pub fn preamble(&self) -> Option<Preamble> {
        if !self.output.generated_header && self.output.prelude.is_empty() {
            return None;
        }
        Some(Preamble {
            generated_header: self.output.generated_header,
            prelude: self.output.prelude.clone(),
        })
    }

    /// The placement policy described by `[placement]`.
    pub fn policy(&self) -> RulePolicy {
        RulePolicy::new(
            self.placement.default_buffer.clone(),
            self.placement.rules.clone(),
        )
    }

    /// Conversion parameters, with `input` overriding `[input] path`.
    pub fn to_parameters(&self, input: Option<&Path>) -> crate::Result<ConversionParameters> {
        let path = input
            .map(Path::to_path_buf)
            .or_else(|| self.input.path.clone())
            .ok_or(ConfigError::MissingInput)?;

        Ok(ConversionParameters::new(path)
            .with_defines(self.input.defines.iter().cloned())
            .with_include_paths(self.input.include_paths.iter().cloned())
            .with_preamble(self.preamble())
            .with_policy(self.policy()))
    }

    /// File a buffer is written to.
    pub fn output_path(&self, buffer: &str) -> PathBuf {
        self.output
            .directory
            .join(format!("{}.{}", buffer, self.output.extension))
    }
}
