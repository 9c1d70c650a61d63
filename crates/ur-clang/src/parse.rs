//! Clang AST parsing using libclang.

use crate::ast::{BinaryOp, ClangAst, ClangNode, ClangNodeKind, SourceLocation, UnaryOp};
use crate::error::ParseError;
use crate::types::{known_typedef, strip_qualifiers, CType};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_uint};
use std::path::Path;
use std::ptr;
use tracing::{debug, warn};

/// Options forwarded to the clang driver.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Preprocessor defines, in order (`NAME` or `NAME=VALUE`)
    pub defines: Vec<String>,
    /// System include search path
    pub include_paths: Vec<String>,
    /// Extra raw arguments appended last
    pub extra_args: Vec<String>,
}

impl ParseOptions {
    /// Build the clang command line.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-x".to_string(), "c".to_string()];
        args.extend(self.defines.iter().map(|d| format!("-D{}", d)));
        args.extend(self.include_paths.iter().map(|i| format!("-I{}", i)));
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Parser that uses libclang to parse C source files.
pub struct ClangParser {
    index: clang_sys::CXIndex,
}

/// Owns a translation unit until it is dropped.
struct TranslationUnit(clang_sys::CXTranslationUnit);

impl Drop for TranslationUnit {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe {
                clang_sys::clang_disposeTranslationUnit(self.0);
            }
        }
    }
}

impl ClangParser {
    /// Load libclang and create a new parser.
    pub fn new() -> Result<Self, ParseError> {
        if !clang_sys::is_loaded() {
            clang_sys::load().map_err(ParseError::Load)?;
        }

        unsafe {
            let index = clang_sys::clang_createIndex(0, 0);
            if index.is_null() {
                return Err(ParseError::Index);
            }
            Ok(Self { index })
        }
    }

    /// Parse a C source file into a Clang AST.
    pub fn parse_file(&self, path: &Path, options: &ParseOptions) -> Result<ClangAst, ParseError> {
        let path_str = path.to_string_lossy();
        self.parse(&path_str, None, options)
    }

    /// Parse C source code from a string.
    pub fn parse_string(
        &self,
        source: &str,
        filename: &str,
        options: &ParseOptions,
    ) -> Result<ClangAst, ParseError> {
        self.parse(filename, Some(source), options)
    }

    fn parse(
        &self,
        filename: &str,
        source: Option<&str>,
        options: &ParseOptions,
    ) -> Result<ClangAst, ParseError> {
        let c_filename = to_c_string(filename)?;
        let args = options
            .to_args()
            .iter()
            .map(|a| to_c_string(a))
            .collect::<Result<Vec<_>, _>>()?;
        let c_args: Vec<*const c_char> = args.iter().map(|s| s.as_ptr()).collect();

        let c_source = source.map(to_c_string).transpose()?;
        let mut unsaved = Vec::new();
        if let (Some(contents), Some(text)) = (&c_source, source) {
            unsaved.push(clang_sys::CXUnsavedFile {
                Filename: c_filename.as_ptr(),
                Contents: contents.as_ptr(),
                Length: text.len() as _,
            });
        }

        debug!("parsing {} with {:?}", filename, options.to_args());

        let mut raw_tu: clang_sys::CXTranslationUnit = ptr::null_mut();
        let code = unsafe {
            clang_sys::clang_parseTranslationUnit2(
                self.index,
                c_filename.as_ptr(),
                c_args.as_ptr(),
                c_args.len() as c_int,
                if unsaved.is_empty() {
                    ptr::null_mut()
                } else {
                    unsaved.as_mut_ptr()
                },
                unsaved.len() as c_uint,
                clang_sys::CXTranslationUnit_None,
                &mut raw_tu,
            )
        };
        let tu = TranslationUnit(raw_tu);

        let diagnostics = collect_diagnostics(&tu);
        for diagnostic in &diagnostics {
            warn!("{}", diagnostic);
        }

        if code != clang_sys::CXError_Success || tu.0.is_null() {
            return Err(ParseError::Failed {
                path: filename.to_string(),
                code: error_code_name(code).to_string(),
                diagnostics,
            });
        }

        let root = unsafe {
            let cursor = clang_sys::clang_getTranslationUnitCursor(tu.0);
            convert_cursor(tu.0, cursor)
        };

        Ok(ClangAst {
            translation_unit: root,
        })
    }
}

impl Drop for ClangParser {
    fn drop(&mut self) {
        unsafe {
            clang_sys::clang_disposeIndex(self.index);
        }
    }
}

fn to_c_string(s: &str) -> Result<CString, ParseError> {
    CString::new(s).map_err(|_| ParseError::InvalidArgument(s.to_string()))
}

fn error_code_name(code: clang_sys::CXErrorCode) -> &'static str {
    match code {
        clang_sys::CXError_Success => "success",
        clang_sys::CXError_Failure => "failure",
        clang_sys::CXError_Crashed => "crashed",
        clang_sys::CXError_InvalidArguments => "invalid arguments",
        clang_sys::CXError_ASTReadError => "AST read error",
        _ => "unknown error",
    }
}

/// Format every diagnostic of the translation unit.
fn collect_diagnostics(tu: &TranslationUnit) -> Vec<String> {
    if tu.0.is_null() {
        return Vec::new();
    }

    unsafe {
        let options = clang_sys::clang_defaultDiagnosticDisplayOptions();
        let count = clang_sys::clang_getNumDiagnostics(tu.0);
        let mut messages = Vec::with_capacity(count as usize);
        for i in 0..count {
            let diag = clang_sys::clang_getDiagnostic(tu.0, i);
            messages.push(cx_string_to_string(clang_sys::clang_formatDiagnostic(
                diag, options,
            )));
            clang_sys::clang_disposeDiagnostic(diag);
        }
        messages
    }
}

/// Collect the direct children of a cursor.
unsafe fn cursor_children(cursor: clang_sys::CXCursor) -> Vec<clang_sys::CXCursor> {
    extern "C" fn visitor(
        child: clang_sys::CXCursor,
        _parent: clang_sys::CXCursor,
        data: clang_sys::CXClientData,
    ) -> clang_sys::CXChildVisitResult {
        unsafe {
            let children = &mut *(data as *mut Vec<clang_sys::CXCursor>);
            // Skip null cursors
            if clang_sys::clang_Cursor_isNull(child) == 0 {
                children.push(child);
            }
        }
        clang_sys::CXChildVisit_Continue
    }

    let mut children: Vec<clang_sys::CXCursor> = Vec::new();
    clang_sys::clang_visitChildren(
        cursor,
        visitor,
        &mut children as *mut Vec<clang_sys::CXCursor> as clang_sys::CXClientData,
    );
    children
}

/// Convert a Clang cursor and its subtree to our AST node.
unsafe fn convert_cursor(
    tu: clang_sys::CXTranslationUnit,
    cursor: clang_sys::CXCursor,
) -> ClangNode {
    let kind = clang_sys::clang_getCursorKind(cursor);
    let node_kind = convert_cursor_kind(cursor, kind);

    let ty = match node_kind {
        ClangNodeKind::TypedefDecl => {
            convert_type(clang_sys::clang_getTypedefDeclUnderlyingType(cursor))
        }
        ClangNodeKind::TranslationUnit => CType::Void,
        _ => convert_type(clang_sys::clang_getCursorType(cursor)),
    };

    let mut spelling = cursor_spelling(cursor);
    if matches!(
        node_kind,
        ClangNodeKind::StructDecl | ClangNodeKind::UnionDecl | ClangNodeKind::EnumDecl
    ) && is_anonymous_spelling(&spelling)
    {
        spelling.clear();
    }

    let tokens = match node_kind {
        ClangNodeKind::IntegerLiteral => literal_tokens(tu, cursor, false),
        ClangNodeKind::FloatingLiteral => literal_tokens(tu, cursor, true),
        ClangNodeKind::CharacterLiteral | ClangNodeKind::UnaryExpr => {
            cursor_tokens(tu, cursor)
        }
        // Null clauses have no cursor; the header shows which slots are filled
        ClangNodeKind::ForStmt => for_header_tokens(tu, cursor),
        _ => Vec::new(),
    };

    let value = match node_kind {
        ClangNodeKind::EnumConstantDecl => Some(clang_sys::clang_getEnumConstantDeclValue(cursor)),
        _ => None,
    };

    let usr = match node_kind {
        ClangNodeKind::StructDecl
        | ClangNodeKind::UnionDecl
        | ClangNodeKind::EnumDecl
        | ClangNodeKind::TypedefDecl
        | ClangNodeKind::FunctionDecl
        | ClangNodeKind::VarDecl { .. } => {
            cx_string_to_string(clang_sys::clang_getCursorUSR(cursor))
        }
        _ => String::new(),
    };

    let location = clang_sys::clang_getCursorLocation(cursor);
    let in_system_header = clang_sys::clang_Location_isInSystemHeader(location) != 0;

    let children = cursor_children(cursor)
        .into_iter()
        .map(|child| convert_cursor(tu, child))
        .collect();

    ClangNode {
        kind: node_kind,
        spelling,
        ty,
        children,
        tokens,
        value,
        in_system_header,
        usr,
        location: get_location(location),
    }
}

/// libclang spells anonymous tags differently across versions.
fn is_anonymous_spelling(spelling: &str) -> bool {
    spelling.is_empty() || spelling.contains("(unnamed") || spelling.contains("(anonymous")
}

/// Get source location from a cursor location.
unsafe fn get_location(loc: clang_sys::CXSourceLocation) -> SourceLocation {
    let mut file: clang_sys::CXFile = ptr::null_mut();
    let mut line: c_uint = 0;
    let mut column: c_uint = 0;

    clang_sys::clang_getSpellingLocation(loc, &mut file, &mut line, &mut column, ptr::null_mut());

    let file_name = if !file.is_null() {
        Some(cx_string_to_string(clang_sys::clang_getFileName(file)))
    } else {
        None
    };

    SourceLocation {
        file: file_name,
        line,
        column,
    }
}

/// Convert a Clang cursor kind to our AST node kind.
unsafe fn convert_cursor_kind(
    cursor: clang_sys::CXCursor,
    kind: clang_sys::CXCursorKind,
) -> ClangNodeKind {
    match kind {
        clang_sys::CXCursor_TranslationUnit => ClangNodeKind::TranslationUnit,

        // Declarations
        clang_sys::CXCursor_StructDecl => ClangNodeKind::StructDecl,
        clang_sys::CXCursor_UnionDecl => ClangNodeKind::UnionDecl,
        clang_sys::CXCursor_EnumDecl => ClangNodeKind::EnumDecl,
        clang_sys::CXCursor_EnumConstantDecl => ClangNodeKind::EnumConstantDecl,
        clang_sys::CXCursor_FieldDecl => ClangNodeKind::FieldDecl,
        clang_sys::CXCursor_FunctionDecl => ClangNodeKind::FunctionDecl,
        clang_sys::CXCursor_ParmDecl => ClangNodeKind::ParmDecl,
        clang_sys::CXCursor_VarDecl => {
            let ty = clang_sys::clang_getCursorType(cursor);
            ClangNodeKind::VarDecl {
                is_const: clang_sys::clang_isConstQualifiedType(ty) != 0,
                is_extern: clang_sys::clang_Cursor_getStorageClass(cursor)
                    == clang_sys::CX_SC_Extern,
            }
        }
        clang_sys::CXCursor_TypedefDecl => ClangNodeKind::TypedefDecl,

        // References
        clang_sys::CXCursor_TypeRef => ClangNodeKind::TypeRef,
        clang_sys::CXCursor_LabelRef => ClangNodeKind::LabelRef,

        // Statements
        clang_sys::CXCursor_CompoundStmt => ClangNodeKind::CompoundStmt,
        clang_sys::CXCursor_DeclStmt => ClangNodeKind::DeclStmt,
        clang_sys::CXCursor_ReturnStmt => ClangNodeKind::ReturnStmt,
        clang_sys::CXCursor_IfStmt => ClangNodeKind::IfStmt,
        clang_sys::CXCursor_WhileStmt => ClangNodeKind::WhileStmt,
        clang_sys::CXCursor_DoStmt => ClangNodeKind::DoStmt,
        clang_sys::CXCursor_ForStmt => ClangNodeKind::ForStmt,
        clang_sys::CXCursor_SwitchStmt => ClangNodeKind::SwitchStmt,
        clang_sys::CXCursor_CaseStmt => ClangNodeKind::CaseStmt,
        clang_sys::CXCursor_DefaultStmt => ClangNodeKind::DefaultStmt,
        clang_sys::CXCursor_BreakStmt => ClangNodeKind::BreakStmt,
        clang_sys::CXCursor_ContinueStmt => ClangNodeKind::ContinueStmt,
        clang_sys::CXCursor_GotoStmt => ClangNodeKind::GotoStmt,
        clang_sys::CXCursor_LabelStmt => ClangNodeKind::LabelStmt,
        clang_sys::CXCursor_NullStmt => ClangNodeKind::NullStmt,

        // Expressions
        clang_sys::CXCursor_IntegerLiteral => ClangNodeKind::IntegerLiteral,
        clang_sys::CXCursor_FloatingLiteral => ClangNodeKind::FloatingLiteral,
        clang_sys::CXCursor_CharacterLiteral => ClangNodeKind::CharacterLiteral,
        clang_sys::CXCursor_StringLiteral => ClangNodeKind::StringLiteral,
        clang_sys::CXCursor_DeclRefExpr => ClangNodeKind::DeclRefExpr,
        clang_sys::CXCursor_MemberRefExpr => ClangNodeKind::MemberRefExpr,
        clang_sys::CXCursor_CallExpr => ClangNodeKind::CallExpr,
        clang_sys::CXCursor_BinaryOperator => ClangNodeKind::BinaryOperator(get_binary_op(cursor)),
        clang_sys::CXCursor_CompoundAssignOperator => {
            ClangNodeKind::CompoundAssignOperator(get_binary_op(cursor))
        }
        clang_sys::CXCursor_UnaryOperator => ClangNodeKind::UnaryOperator(get_unary_op(cursor)),
        clang_sys::CXCursor_UnaryExpr => ClangNodeKind::UnaryExpr,
        clang_sys::CXCursor_ArraySubscriptExpr => ClangNodeKind::ArraySubscriptExpr,
        clang_sys::CXCursor_ConditionalOperator => ClangNodeKind::ConditionalOperator,
        clang_sys::CXCursor_ParenExpr => ClangNodeKind::ParenExpr,
        clang_sys::CXCursor_CStyleCastExpr => ClangNodeKind::CStyleCastExpr,
        clang_sys::CXCursor_UnexposedExpr => ClangNodeKind::UnexposedExpr,
        clang_sys::CXCursor_InitListExpr => ClangNodeKind::InitListExpr,

        _ => {
            let kind_spelling = clang_sys::clang_getCursorKindSpelling(kind);
            ClangNodeKind::Unknown(cx_string_to_string(kind_spelling))
        }
    }
}

/// Get binary operator from cursor.
unsafe fn get_binary_op(cursor: clang_sys::CXCursor) -> BinaryOp {
    match clang_sys::clang_getCursorBinaryOperatorKind(cursor) {
        clang_sys::CXBinaryOperator_Mul => BinaryOp::Mul,
        clang_sys::CXBinaryOperator_Div => BinaryOp::Div,
        clang_sys::CXBinaryOperator_Rem => BinaryOp::Rem,
        clang_sys::CXBinaryOperator_Add => BinaryOp::Add,
        clang_sys::CXBinaryOperator_Sub => BinaryOp::Sub,
        clang_sys::CXBinaryOperator_Shl => BinaryOp::Shl,
        clang_sys::CXBinaryOperator_Shr => BinaryOp::Shr,
        clang_sys::CXBinaryOperator_LT => BinaryOp::Lt,
        clang_sys::CXBinaryOperator_GT => BinaryOp::Gt,
        clang_sys::CXBinaryOperator_LE => BinaryOp::Le,
        clang_sys::CXBinaryOperator_GE => BinaryOp::Ge,
        clang_sys::CXBinaryOperator_EQ => BinaryOp::Eq,
        clang_sys::CXBinaryOperator_NE => BinaryOp::Ne,
        clang_sys::CXBinaryOperator_And => BinaryOp::And,
        clang_sys::CXBinaryOperator_Xor => BinaryOp::Xor,
        clang_sys::CXBinaryOperator_Or => BinaryOp::Or,
        clang_sys::CXBinaryOperator_LAnd => BinaryOp::LAnd,
        clang_sys::CXBinaryOperator_LOr => BinaryOp::LOr,
        clang_sys::CXBinaryOperator_Assign => BinaryOp::Assign,
        clang_sys::CXBinaryOperator_MulAssign => BinaryOp::MulAssign,
        clang_sys::CXBinaryOperator_DivAssign => BinaryOp::DivAssign,
        clang_sys::CXBinaryOperator_RemAssign => BinaryOp::RemAssign,
        clang_sys::CXBinaryOperator_AddAssign => BinaryOp::AddAssign,
        clang_sys::CXBinaryOperator_SubAssign => BinaryOp::SubAssign,
        clang_sys::CXBinaryOperator_ShlAssign => BinaryOp::ShlAssign,
        clang_sys::CXBinaryOperator_ShrAssign => BinaryOp::ShrAssign,
        clang_sys::CXBinaryOperator_AndAssign => BinaryOp::AndAssign,
        clang_sys::CXBinaryOperator_XorAssign => BinaryOp::XorAssign,
        clang_sys::CXBinaryOperator_OrAssign => BinaryOp::OrAssign,
        // Comma, and the C++-only member pointer / spaceship operators
        _ => BinaryOp::Comma,
    }
}

/// Get unary operator from cursor.
unsafe fn get_unary_op(cursor: clang_sys::CXCursor) -> UnaryOp {
    match clang_sys::clang_getCursorUnaryOperatorKind(cursor) {
        clang_sys::CXUnaryOperator_PostInc => UnaryOp::PostInc,
        clang_sys::CXUnaryOperator_PostDec => UnaryOp::PostDec,
        clang_sys::CXUnaryOperator_PreInc => UnaryOp::PreInc,
        clang_sys::CXUnaryOperator_PreDec => UnaryOp::PreDec,
        clang_sys::CXUnaryOperator_AddrOf => UnaryOp::AddrOf,
        clang_sys::CXUnaryOperator_Deref => UnaryOp::Deref,
        clang_sys::CXUnaryOperator_Plus => UnaryOp::Plus,
        clang_sys::CXUnaryOperator_Minus => UnaryOp::Minus,
        clang_sys::CXUnaryOperator_Not => UnaryOp::Not,
        clang_sys::CXUnaryOperator_LNot => UnaryOp::LNot,
        _ => UnaryOp::Other,
    }
}

/// Convert a Clang type to our type representation.
unsafe fn convert_type(ty: clang_sys::CXType) -> CType {
    match ty.kind {
        clang_sys::CXType_Void => CType::Void,
        clang_sys::CXType_Bool => CType::Bool,
        clang_sys::CXType_Char_S | clang_sys::CXType_SChar => CType::Char { signed: true },
        clang_sys::CXType_Char_U | clang_sys::CXType_UChar => CType::Char { signed: false },
        clang_sys::CXType_Short => CType::Short { signed: true },
        clang_sys::CXType_UShort => CType::Short { signed: false },
        clang_sys::CXType_Int => CType::Int { signed: true },
        clang_sys::CXType_UInt => CType::Int { signed: false },
        clang_sys::CXType_Long => CType::Long { signed: true },
        clang_sys::CXType_ULong => CType::Long { signed: false },
        clang_sys::CXType_LongLong => CType::LongLong { signed: true },
        clang_sys::CXType_ULongLong => CType::LongLong { signed: false },
        clang_sys::CXType_WChar => CType::Int { signed: true },
        clang_sys::CXType_Float => CType::Float,
        clang_sys::CXType_Double => CType::Double,
        clang_sys::CXType_LongDouble => CType::LongDouble,

        clang_sys::CXType_Pointer => CType::Pointer(Box::new(convert_type(
            clang_sys::clang_getPointeeType(ty),
        ))),

        clang_sys::CXType_ConstantArray => {
            let element = clang_sys::clang_getArrayElementType(ty);
            let size = clang_sys::clang_getArraySize(ty);
            CType::Array {
                element: Box::new(convert_type(element)),
                size: usize::try_from(size).ok(),
            }
        }

        clang_sys::CXType_IncompleteArray | clang_sys::CXType_VariableArray => {
            let element = clang_sys::clang_getArrayElementType(ty);
            CType::Array {
                element: Box::new(convert_type(element)),
                size: None,
            }
        }

        clang_sys::CXType_Record => CType::Record(tag_name(&type_spelling(ty))),
        clang_sys::CXType_Enum => CType::Enum(tag_name(&type_spelling(ty))),

        clang_sys::CXType_Elaborated => convert_type(clang_sys::clang_Type_getNamedType(ty)),

        clang_sys::CXType_Typedef => {
            let spelling = type_spelling(ty);
            let name = strip_qualifiers(&spelling);
            if known_typedef(name).is_some() {
                CType::Named(name.to_string())
            } else {
                convert_type(clang_sys::clang_getCanonicalType(ty))
            }
        }

        clang_sys::CXType_FunctionProto | clang_sys::CXType_FunctionNoProto => {
            let return_type = clang_sys::clang_getResultType(ty);
            let num_args = clang_sys::clang_getNumArgTypes(ty).max(0);
            let mut params = Vec::new();
            for i in 0..num_args {
                params.push(convert_type(clang_sys::clang_getArgType(ty, i as c_uint)));
            }
            CType::Function {
                return_type: Box::new(convert_type(return_type)),
                params,
                is_variadic: clang_sys::clang_isFunctionTypeVariadic(ty) != 0,
            }
        }

        _ => CType::Named(type_spelling(ty)),
    }
}

/// Record/enum type spelling without qualifiers and the tag keyword.
fn tag_name(spelling: &str) -> String {
    let name = strip_qualifiers(spelling);
    name.strip_prefix("struct ")
        .or_else(|| name.strip_prefix("union "))
        .or_else(|| name.strip_prefix("enum "))
        .unwrap_or(name)
        .trim()
        .to_string()
}

unsafe fn type_spelling(ty: clang_sys::CXType) -> String {
    cx_string_to_string(clang_sys::clang_getTypeSpelling(ty))
}

/// Tokens of a numeric literal.
///
/// A literal produced by a macro expansion tokenizes to the macro name, so
/// fall back to the evaluated value in that case.
unsafe fn literal_tokens(
    tu: clang_sys::CXTranslationUnit,
    cursor: clang_sys::CXCursor,
    floating: bool,
) -> Vec<String> {
    let tokens = cursor_tokens(tu, cursor);
    let numeric = tokens
        .first()
        .and_then(|t| t.chars().next())
        .is_some_and(|c| c.is_ascii_digit() || c == '.');
    if numeric {
        return tokens;
    }

    let eval = clang_sys::clang_Cursor_Evaluate(cursor);
    if eval.is_null() {
        return tokens;
    }
    let value = if floating {
        clang_sys::clang_EvalResult_getAsDouble(eval).to_string()
    } else {
        clang_sys::clang_EvalResult_getAsLongLong(eval).to_string()
    };
    clang_sys::clang_EvalResult_dispose(eval);
    vec![value]
}

/// Tokens of a `for` statement up to the parenthesis closing its header.
unsafe fn for_header_tokens(
    tu: clang_sys::CXTranslationUnit,
    cursor: clang_sys::CXCursor,
) -> Vec<String> {
    let mut tokens = cursor_tokens(tu, cursor);
    let mut depth = 0usize;
    let end = tokens.iter().position(|token| match token.as_str() {
        "(" => {
            depth += 1;
            false
        }
        ")" => {
            depth = depth.saturating_sub(1);
            depth == 0
        }
        _ => false,
    });
    if let Some(end) = end {
        tokens.truncate(end + 1);
    }
    tokens
}

/// Spell out the tokens covered by a cursor's extent.
unsafe fn cursor_tokens(
    tu: clang_sys::CXTranslationUnit,
    cursor: clang_sys::CXCursor,
) -> Vec<String> {
    let range = clang_sys::clang_getCursorExtent(cursor);
    let mut tokens: *mut clang_sys::CXToken = ptr::null_mut();
    let mut count: c_uint = 0;
    clang_sys::clang_tokenize(tu, range, &mut tokens, &mut count);

    if tokens.is_null() {
        return Vec::new();
    }

    let result = (0..count as usize)
        .map(|i| cx_string_to_string(clang_sys::clang_getTokenSpelling(tu, *tokens.add(i))))
        .collect();
    clang_sys::clang_disposeTokens(tu, tokens, count);
    result
}

/// Convert a CXString to a Rust String.
fn cx_string_to_string(cx_string: clang_sys::CXString) -> String {
    unsafe {
        let c_str = clang_sys::clang_getCString(cx_string);
        let result = if c_str.is_null() {
            String::new()
        } else {
            CStr::from_ptr(c_str).to_string_lossy().into_owned()
        };
        clang_sys::clang_disposeString(cx_string);
        result
    }
}

/// Get the spelling of a cursor.
fn cursor_spelling(cursor: clang_sys::CXCursor) -> String {
    unsafe {
        let spelling = clang_sys::clang_getCursorSpelling(cursor);
        cx_string_to_string(spelling)
    }
}
