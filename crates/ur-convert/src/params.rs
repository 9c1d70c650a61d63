//! Conversion run parameters.

use crate::hooks::{ConversionHooks, NoHooks};
use crate::output::Preamble;
use crate::placement::{PlacementPolicy, Unconfigured};
use std::path::PathBuf;
use ur_clang::ParseOptions;

/// Everything one conversion run needs besides the source itself.
pub struct ConversionParameters {
    pub input_path: PathBuf,
    /// Preprocessor defines, in order
    pub defines: Vec<String>,
    /// System include search path
    pub include_paths: Vec<String>,
    /// Written once at the top of each buffer; `None` disables it
    pub preamble: Option<Preamble>,
    pub policy: Box<dyn PlacementPolicy>,
    pub hooks: Box<dyn ConversionHooks>,
}

impl ConversionParameters {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            defines: Vec::new(),
            include_paths: Vec::new(),
            preamble: Some(Preamble::default()),
            policy: Box::new(Unconfigured),
            hooks: Box::new(NoHooks),
        }
    }

    pub fn with_defines<I, S>(mut self, defines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.defines = defines.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_include_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_preamble(mut self, preamble: Option<Preamble>) -> Self {
        self.preamble = preamble;
        self
    }

    pub fn with_policy(mut self, policy: impl PlacementPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn with_hooks(mut self, hooks: impl ConversionHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Front-end options for this run.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            defines: self.defines.clone(),
            include_paths: self.include_paths.clone(),
            extra_args: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ConversionParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionParameters")
            .field("input_path", &self.input_path)
            .field("defines", &self.defines)
            .field("include_paths", &self.include_paths)
            .field("preamble", &self.preamble)
            .finish_non_exhaustive()
    }
}
