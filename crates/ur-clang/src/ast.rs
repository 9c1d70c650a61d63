//! Clang AST representation.
//!
//! An owned snapshot of the libclang cursor tree, restricted to what the
//! C-to-Rust conversion needs. Everything here is immutable once built.

use crate::types::CType;

/// A parsed Clang AST.
#[derive(Debug, Clone)]
pub struct ClangAst {
    /// Root translation unit
    pub translation_unit: ClangNode,
}

/// A node in the Clang AST.
#[derive(Debug, Clone)]
pub struct ClangNode {
    /// Kind of this node
    pub kind: ClangNodeKind,
    /// Cursor spelling (declaration name, referenced name, literal text)
    pub spelling: String,
    /// Resolved type of the cursor
    pub ty: CType,
    /// Child nodes
    pub children: Vec<ClangNode>,
    /// Source tokens, only kept for literals, `sizeof`-like expressions and
    /// `for` headers (up to the closing parenthesis)
    pub tokens: Vec<String>,
    /// Value libclang computed for an enumerator
    pub value: Option<i64>,
    /// Declared in a system header
    pub in_system_header: bool,
    /// Unified symbol resolution for declarations; identifies the entity
    pub usr: String,
    /// Source location info (for error messages)
    pub location: SourceLocation,
}

/// Source location for error reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None => write!(f, "<unknown>:{}:{}", self.line, self.column),
        }
    }
}

/// Kinds of Clang AST nodes we care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClangNodeKind {
    /// Translation unit (root)
    TranslationUnit,

    // Declarations
    StructDecl,
    UnionDecl,
    EnumDecl,
    EnumConstantDecl,
    FieldDecl,
    /// Function declaration; `ty` is the function type
    FunctionDecl,
    ParmDecl,
    VarDecl {
        /// The object itself is const-qualified
        is_const: bool,
        /// `extern` storage class
        is_extern: bool,
    },
    /// Typedef; `ty` is the underlying type
    TypedefDecl,

    // References
    TypeRef,
    LabelRef,

    // Statements
    CompoundStmt,
    DeclStmt,
    ReturnStmt,
    IfStmt,
    WhileStmt,
    DoStmt,
    ForStmt,
    SwitchStmt,
    CaseStmt,
    DefaultStmt,
    BreakStmt,
    ContinueStmt,
    GotoStmt,
    LabelStmt,
    NullStmt,

    // Expressions
    IntegerLiteral,
    FloatingLiteral,
    CharacterLiteral,
    StringLiteral,
    DeclRefExpr,
    MemberRefExpr,
    CallExpr,
    BinaryOperator(BinaryOp),
    CompoundAssignOperator(BinaryOp),
    UnaryOperator(UnaryOp),
    /// `sizeof`, `alignof` and friends; the operator is in `tokens`
    UnaryExpr,
    ArraySubscriptExpr,
    ConditionalOperator,
    ParenExpr,
    CStyleCastExpr,
    /// Implicit conversions and other wrappers libclang does not expose
    UnexposedExpr,
    InitListExpr,

    /// Any other cursor kind, with libclang's spelling of the kind
    Unknown(String),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    // Bitwise
    And,
    Or,
    Xor,
    Shl,
    Shr,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    LAnd,
    LOr,
    // Assignment
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
    // Comma
    Comma,
}

impl BinaryOp {
    /// Operator token; C and Rust agree on all of them.
    pub fn spelling(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::LAnd => "&&",
            BinaryOp::LOr => "||",
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::RemAssign => "%=",
            BinaryOp::AndAssign => "&=",
            BinaryOp::OrAssign => "|=",
            BinaryOp::XorAssign => "^=",
            BinaryOp::ShlAssign => "<<=",
            BinaryOp::ShrAssign => ">>=",
            BinaryOp::Comma => ",",
        }
    }

    /// `=` and the compound assignments.
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::AddAssign
                | BinaryOp::SubAssign
                | BinaryOp::MulAssign
                | BinaryOp::DivAssign
                | BinaryOp::RemAssign
                | BinaryOp::AndAssign
                | BinaryOp::OrAssign
                | BinaryOp::XorAssign
                | BinaryOp::ShlAssign
                | BinaryOp::ShrAssign
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LAnd | BinaryOp::LOr)
    }

    /// Operators whose result is already a truth value.
    pub fn yields_bool(self) -> bool {
        self.is_comparison() || self.is_logical()
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Prefix increment (++x)
    PreInc,
    /// Prefix decrement (--x)
    PreDec,
    /// Postfix increment (x++)
    PostInc,
    /// Postfix decrement (x--)
    PostDec,
    /// Address-of (&x)
    AddrOf,
    /// Dereference (*x)
    Deref,
    /// Unary plus (+x)
    Plus,
    /// Unary minus (-x)
    Minus,
    /// Bitwise not (~x)
    Not,
    /// Logical not (!x)
    LNot,
    /// __real, __imag, __extension__
    Other,
}

impl UnaryOp {
    /// Whether the operator is written before its operand.
    pub fn is_prefix(self) -> bool {
        !matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }
}

impl ClangNode {
    /// Create a new node with the given kind.
    pub fn new(kind: ClangNodeKind) -> Self {
        Self {
            kind,
            spelling: String::new(),
            ty: CType::Void,
            children: Vec::new(),
            tokens: Vec::new(),
            value: None,
            in_system_header: false,
            usr: String::new(),
            location: SourceLocation::default(),
        }
    }

    /// Set the computed enumerator value.
    pub fn with_value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }

    /// Set the spelling.
    pub fn with_spelling(mut self, spelling: impl Into<String>) -> Self {
        self.spelling = spelling.into();
        self
    }

    /// Set the resolved type.
    pub fn with_type(mut self, ty: CType) -> Self {
        self.ty = ty;
        self
    }

    /// Add a child node.
    pub fn with_child(mut self, child: ClangNode) -> Self {
        self.children.push(child);
        self
    }

    /// Add multiple child nodes.
    pub fn with_children(mut self, children: Vec<ClangNode>) -> Self {
        self.children = children;
        self
    }

    /// Set the source tokens.
    pub fn with_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Set the USR identifying the declared entity.
    pub fn with_usr(mut self, usr: impl Into<String>) -> Self {
        self.usr = usr.into();
        self
    }

    /// Mark the node as coming from a system header.
    pub fn in_system_header(mut self) -> Self {
        self.in_system_header = true;
        self
    }

    /// Set the source location.
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    /// Child by index, if present.
    pub fn child(&self, index: usize) -> Option<&ClangNode> {
        self.children.get(index)
    }

    /// First child matching `kind`.
    pub fn find_child(&self, kind: &ClangNodeKind) -> Option<&ClangNode> {
        self.children.iter().find(|c| &c.kind == kind)
    }

    pub fn is_record(&self) -> bool {
        matches!(self.kind, ClangNodeKind::StructDecl | ClangNodeKind::UnionDecl)
    }

    /// Declaration contexts: the scopes a tag declaration belongs to.
    pub fn is_decl_context(&self) -> bool {
        matches!(
            self.kind,
            ClangNodeKind::TranslationUnit
                | ClangNodeKind::StructDecl
                | ClangNodeKind::UnionDecl
                | ClangNodeKind::FunctionDecl
        )
    }

    /// A function definition rather than a prototype.
    pub fn function_body(&self) -> Option<&ClangNode> {
        match self.kind {
            ClangNodeKind::FunctionDecl => self.find_child(&ClangNodeKind::CompoundStmt),
            _ => None,
        }
    }

    /// Whether `other` denotes the same declared entity.
    ///
    /// libclang lists a tag defined inside a typedef twice (once at file
    /// scope, once under the typedef); the USR ties both copies together.
    pub fn same_entity(&self, other: &ClangNode) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        !self.usr.is_empty() && self.kind == other.kind && self.usr == other.usr
    }

    /// Strip parentheses and implicit conversions.
    pub fn ignore_parens_and_casts(&self) -> &ClangNode {
        match self.kind {
            ClangNodeKind::ParenExpr
            | ClangNodeKind::UnexposedExpr
            | ClangNodeKind::CStyleCastExpr => match self.children.last() {
                Some(inner) => inner.ignore_parens_and_casts(),
                None => self,
            },
            _ => self,
        }
    }

    /// Pre-order walk over this node and its descendants.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a ClangNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}
