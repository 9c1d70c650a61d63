//! Placement: which output buffer a declaration goes to, and under what name.

use ur_clang::CType;

/// Where one declaration's generated text goes.
///
/// An empty `buffer` skips emission; an empty `rename` keeps the C name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    pub buffer: String,
    pub rename: String,
}

impl Placement {
    /// Emit into `buffer` under the original name.
    pub fn to(buffer: impl Into<String>) -> Self {
        Self {
            buffer: buffer.into(),
            rename: String::new(),
        }
    }

    /// Register the name but emit nothing.
    pub fn skip() -> Self {
        Self::default()
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.rename = name.into();
        self
    }

    pub fn is_skipped(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The name the declaration is emitted under.
    pub fn name_or<'a>(&'a self, original: &'a str) -> &'a str {
        if self.rename.is_empty() {
            original
        } else {
            &self.rename
        }
    }
}

/// One parameter of a function definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Identifier as emitted (keywords already escaped)
    pub name: String,
    pub ty: CType,
    /// Rust type text
    pub rendered_type: String,
}

impl Parameter {
    /// `name: T`
    pub fn fragment(&self) -> String {
        format!("{}: {}", self.name, self.rendered_type)
    }
}

/// The signature view handed to the function placement policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: CType,
    pub is_variadic: bool,
}

impl FunctionSignature {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Parameter list as written in the generated header: `a: i32, b: *mut u8`.
    pub fn rendered(&self) -> String {
        self.params
            .iter()
            .map(Parameter::fragment)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Decides placement for each top-level declaration.
///
/// Returning `None` means the category is not configured at all: the
/// declaration is registered, a warning is logged, and nothing is emitted.
pub trait PlacementPolicy {
    fn place_struct(&self, _name: &str) -> Option<Placement> {
        None
    }

    fn place_enum(&self, _name: &str) -> Option<Placement> {
        None
    }

    fn place_global(&self, _name: &str) -> Option<Placement> {
        None
    }

    fn place_function(&self, _signature: &FunctionSignature) -> Option<Placement> {
        None
    }
}

/// No categories configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl PlacementPolicy for Unconfigured {}

/// Every declaration goes to one buffer under its own name.
#[derive(Debug, Clone)]
pub struct SingleBuffer(pub String);

impl SingleBuffer {
    pub fn new(buffer: impl Into<String>) -> Self {
        Self(buffer.into())
    }
}

impl PlacementPolicy for SingleBuffer {
    fn place_struct(&self, _name: &str) -> Option<Placement> {
        Some(Placement::to(&self.0))
    }

    fn place_enum(&self, _name: &str) -> Option<Placement> {
        Some(Placement::to(&self.0))
    }

    fn place_global(&self, _name: &str) -> Option<Placement> {
        Some(Placement::to(&self.0))
    }

    fn place_function(&self, _signature: &FunctionSignature) -> Option<Placement> {
        Some(Placement::to(&self.0))
    }
}
