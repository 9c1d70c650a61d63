//! C AST to Rust source conversion for Ur.
//!
//! This crate provides:
//! - Declaration collection (struct and function registries, anonymous tag names)
//! - The node translator and its desugaring of `for`, `do` and `switch`
//! - Placement of declarations into named output buffers
//!
//! # Architecture
//!
//! ```text
//! ClangAst → DeclarationCollector → Translator → OutputSet → buffer id → text
//!                     ↑                  ↑
//!               PlacementPolicy     Registry
//! ```

mod collect;
mod cursor;
mod error;
mod hooks;
mod literal;
mod names;
mod output;
mod params;
mod placement;
mod processor;
mod translate;

pub use collect::{
    resolve_tag_name, DeclarationCollector, FieldInfo, FunctionInfo, Registry, StructInfo,
    ANONYMOUS_PLACEHOLDER,
};
pub use cursor::{CursorInfo, CursorProcessResult};
pub use error::{ConvertError, Result};
pub use hooks::{ConversionHooks, NoHooks};
pub use names::{sanitize_identifier, NULL};
pub use output::{BufferWriter, OutputSet, Preamble};
pub use params::ConversionParameters;
pub use placement::{
    FunctionSignature, Parameter, Placement, PlacementPolicy, SingleBuffer, Unconfigured,
};
pub use processor::ConversionProcessor;
pub use translate::{Phase, TranslationContext, Translator};

use indexmap::IndexMap;
use tracing::info;

/// Parse `params.input_path` and convert it.
///
/// Returns buffer id → generated text, in first-write order.
pub fn convert(params: ConversionParameters) -> Result<IndexMap<String, String>> {
    if !params.input_path.exists() {
        return Err(ConvertError::InputNotFound(params.input_path.clone()));
    }

    info!("Parsing {}", params.input_path.display());
    let ast = ur_clang::parse_c_file(&params.input_path, &params.parse_options())?;

    let mut processor = ConversionProcessor::new(params);
    Ok(processor.run(&ast.translation_unit))
}
