//! Extension hooks observed by the conversion run.

use crate::cursor::CursorProcessResult;
use crate::output::OutputSet;

/// Callbacks fired while a translation unit is converted.
///
/// All methods default to doing nothing.
pub trait ConversionHooks {
    /// Sees (and may rewrite) a translated global before its storage prefix is added.
    fn global_variable(&mut self, _result: &mut CursorProcessResult<'_>) {}

    /// A function header was written under `name` with these parameter fragments.
    fn function_header(&mut self, _name: &str, _params: &[String]) {}

    /// Runs once after every declaration pass, before the buffers are handed out.
    fn before_close(&mut self, _output: &mut OutputSet) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl ConversionHooks for NoHooks {}
