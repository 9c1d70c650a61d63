//! Per-visit node snapshots and translation results.

use ur_clang::{CType, ClangNode, ClangNodeKind};

/// Immutable view of one AST node, taken when the translator visits it.
#[derive(Debug, Clone, Copy)]
pub struct CursorInfo<'a> {
    pub node: &'a ClangNode,
    pub is_pointer: bool,
    pub is_array: bool,
}

impl<'a> CursorInfo<'a> {
    pub fn new(node: &'a ClangNode) -> Self {
        Self {
            node,
            is_pointer: node.ty.is_pointer(),
            is_array: node.ty.is_array(),
        }
    }

    pub fn kind(&self) -> &'a ClangNodeKind {
        &self.node.kind
    }

    pub fn spelling(&self) -> &'a str {
        &self.node.spelling
    }

    pub fn ty(&self) -> &'a CType {
        &self.node.ty
    }
}

/// A node paired with the Rust text produced for it.
///
/// An empty expression means "no text"; parents treat it as absent.
#[derive(Debug, Clone)]
pub struct CursorProcessResult<'a> {
    pub info: CursorInfo<'a>,
    pub expression: String,
}

impl<'a> CursorProcessResult<'a> {
    pub fn new(info: CursorInfo<'a>, expression: impl Into<String>) -> Self {
        Self {
            info,
            expression: expression.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expression.trim().is_empty()
    }
}
