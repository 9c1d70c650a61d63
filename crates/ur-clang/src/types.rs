//! C type representation.

/// A C type as resolved by the front end.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CType {
    /// void
    #[default]
    Void,
    /// _Bool
    Bool,
    /// char, signed char, unsigned char
    Char { signed: bool },
    /// short, unsigned short
    Short { signed: bool },
    /// int, unsigned int
    Int { signed: bool },
    /// long, unsigned long
    Long { signed: bool },
    /// long long, unsigned long long
    LongLong { signed: bool },
    /// float
    Float,
    /// double
    Double,
    /// long double
    LongDouble,
    /// Pointer type: T*
    Pointer(Box<CType>),
    /// Array type: T[N], or T[] when the size is unknown
    Array {
        element: Box<CType>,
        size: Option<usize>,
    },
    /// struct or union, keyed by the front end's spelling of the record type
    Record(String),
    /// enum type
    Enum(String),
    /// Function type: R(Args...)
    Function {
        return_type: Box<CType>,
        params: Vec<CType>,
        is_variadic: bool,
    },
    /// A typedef kept by name (size_t, uint8_t, ...) or an unmodelled type
    Named(String),
}

impl CType {
    /// Create a signed int type.
    pub fn int() -> Self {
        CType::Int { signed: true }
    }

    /// Create an unsigned int type.
    pub fn uint() -> Self {
        CType::Int { signed: false }
    }

    /// Create a signed char type.
    pub fn char() -> Self {
        CType::Char { signed: true }
    }

    /// Create a pointer to this type.
    pub fn ptr(self) -> Self {
        CType::Pointer(Box::new(self))
    }

    /// Create a fixed-size array of this type.
    pub fn array(self, size: usize) -> Self {
        CType::Array {
            element: Box::new(self),
            size: Some(size),
        }
    }

    /// Create a record type.
    pub fn record(name: impl Into<String>) -> Self {
        CType::Record(name.into())
    }

    /// Create a function type.
    pub fn function(return_type: CType, params: Vec<CType>) -> Self {
        CType::Function {
            return_type: Box::new(return_type),
            params,
            is_variadic: false,
        }
    }

    /// Get the pointee type for a pointer type.
    pub fn pointee(&self) -> Option<&CType> {
        match self {
            CType::Pointer(pointee) => Some(pointee.as_ref()),
            _ => None,
        }
    }

    /// Get the element type for an array type.
    pub fn element(&self) -> Option<&CType> {
        match self {
            CType::Array { element, .. } => Some(element.as_ref()),
            _ => None,
        }
    }

    /// Get the declared size of a fixed-size array.
    pub fn array_size(&self) -> Option<usize> {
        match self {
            CType::Array { size, .. } => *size,
            _ => None,
        }
    }

    /// Get the result type of a function type.
    pub fn return_type(&self) -> Option<&CType> {
        match self {
            CType::Function { return_type, .. } => Some(return_type.as_ref()),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, CType::Void)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, CType::Pointer(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, CType::Array { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self, CType::Function { .. })
    }

    /// Integer types, including char and enums.
    pub fn is_integer(&self) -> bool {
        match self {
            CType::Char { .. }
            | CType::Short { .. }
            | CType::Int { .. }
            | CType::Long { .. }
            | CType::LongLong { .. }
            | CType::Enum(_) => true,
            CType::Named(name) => matches!(
                known_typedef(strip_qualifiers(name)),
                Some(target) if target.starts_with('i') || target.starts_with('u')
            ),
            _ => false,
        }
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, CType::Float | CType::Double | CType::LongDouble)
    }

    /// Types whose truth value is a comparison against zero.
    ///
    /// `_Bool` is excluded: it is already a boolean in the target language.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_floating()
    }

    /// The record this type names, looking through pointers and arrays.
    pub fn referenced_record(&self) -> Option<&str> {
        match self {
            CType::Record(name) => Some(name),
            CType::Pointer(inner) => inner.referenced_record(),
            CType::Array { element, .. } => element.referenced_record(),
            _ => None,
        }
    }

    /// The enum this type names, looking through pointers and arrays.
    pub fn referenced_enum(&self) -> Option<&str> {
        match self {
            CType::Enum(name) => Some(name),
            CType::Pointer(inner) => inner.referenced_enum(),
            CType::Array { element, .. } => element.referenced_enum(),
            _ => None,
        }
    }

    /// Get the equivalent Rust type name, keeping record names as spelled.
    pub fn to_rust_type_str(&self) -> String {
        self.to_target(&|name: &str| name.to_string())
    }

    /// Render the Rust type, mapping record names through `records`.
    pub fn to_target(&self, records: &dyn Fn(&str) -> String) -> String {
        match self {
            CType::Void => "()".to_string(),
            CType::Bool => "bool".to_string(),
            CType::Char { signed: true } => "i8".to_string(),
            CType::Char { signed: false } => "u8".to_string(),
            CType::Short { signed: true } => "i16".to_string(),
            CType::Short { signed: false } => "u16".to_string(),
            CType::Int { signed: true } => "i32".to_string(),
            CType::Int { signed: false } => "u32".to_string(),
            CType::Long { signed: true } => "i64".to_string(),
            CType::Long { signed: false } => "u64".to_string(),
            CType::LongLong { signed: true } => "i64".to_string(),
            CType::LongLong { signed: false } => "u64".to_string(),
            CType::Float => "f32".to_string(),
            // Rust doesn't have long double
            CType::Double | CType::LongDouble => "f64".to_string(),
            CType::Pointer(pointee) => match pointee.as_ref() {
                CType::Function {
                    return_type,
                    params,
                    ..
                } => {
                    // Function pointers are nullable in C
                    let params: Vec<_> = params.iter().map(|p| p.to_target(records)).collect();
                    if return_type.is_void() {
                        format!("Option<unsafe fn({})>", params.join(", "))
                    } else {
                        format!(
                            "Option<unsafe fn({}) -> {}>",
                            params.join(", "),
                            return_type.to_target(records)
                        )
                    }
                }
                CType::Void => "*mut std::ffi::c_void".to_string(),
                other => format!("*mut {}", other.to_target(records)),
            },
            CType::Array { element, size } => match size {
                Some(n) => format!("[{}; {}]", element.to_target(records), n),
                None => format!("*mut {}", element.to_target(records)),
            },
            CType::Record(name) => records(name),
            CType::Enum(_) => "i32".to_string(),
            CType::Function {
                return_type,
                params,
                ..
            } => {
                let params: Vec<_> = params.iter().map(|p| p.to_target(records)).collect();
                format!(
                    "unsafe fn({}) -> {}",
                    params.join(", "),
                    return_type.to_target(records)
                )
            }
            CType::Named(name) => {
                let normalized = strip_qualifiers(name);
                match known_typedef(normalized) {
                    Some(target) => target.to_string(),
                    None => normalized.to_string(),
                }
            }
        }
    }

    /// Parse a C type name as written in source, e.g. `unsigned int` or `struct foo *`.
    ///
    /// Used where the front end only hands over tokens (`sizeof(int)`).
    pub fn from_c_spelling(spelling: &str) -> Self {
        let trimmed = spelling.trim();
        if let Some(inner) = trimmed.strip_suffix('*') {
            return CType::from_c_spelling(inner).ptr();
        }

        let normalized = strip_qualifiers(trimmed);
        let words: Vec<&str> = normalized.split_whitespace().collect();
        let name = words.join(" ");

        match name.as_str() {
            "void" => CType::Void,
            "_Bool" | "bool" => CType::Bool,
            "char" | "signed char" => CType::Char { signed: true },
            "unsigned char" => CType::Char { signed: false },
            "short" | "short int" | "signed short" | "signed short int" => {
                CType::Short { signed: true }
            }
            "unsigned short" | "unsigned short int" => CType::Short { signed: false },
            "int" | "signed" | "signed int" => CType::Int { signed: true },
            "unsigned" | "unsigned int" => CType::Int { signed: false },
            "long" | "long int" | "signed long" | "signed long int" => {
                CType::Long { signed: true }
            }
            "unsigned long" | "unsigned long int" => CType::Long { signed: false },
            "long long" | "long long int" | "signed long long" | "signed long long int" => {
                CType::LongLong { signed: true }
            }
            "unsigned long long" | "unsigned long long int" => CType::LongLong { signed: false },
            "float" => CType::Float,
            "double" => CType::Double,
            "long double" => CType::LongDouble,
            _ => {
                if let Some(record) = name
                    .strip_prefix("struct ")
                    .or_else(|| name.strip_prefix("union "))
                {
                    CType::Record(record.trim().to_string())
                } else if let Some(e) = name.strip_prefix("enum ") {
                    CType::Enum(e.trim().to_string())
                } else {
                    CType::Named(name)
                }
            }
        }
    }

    /// Size in bits of fixed-width scalar types.
    pub fn bit_width(&self) -> Option<u32> {
        match self {
            CType::Bool | CType::Char { .. } => Some(8),
            CType::Short { .. } => Some(16),
            CType::Int { .. } | CType::Float | CType::Enum(_) => Some(32),
            CType::Long { .. } | CType::LongLong { .. } | CType::Double | CType::LongDouble => {
                Some(64)
            }
            CType::Pointer(_) => Some(64),
            _ => None,
        }
    }
}

/// Strip leading cv-qualifiers from a type spelling.
pub fn strip_qualifiers(name: &str) -> &str {
    let mut name = name.trim();
    loop {
        let stripped = name
            .strip_prefix("const ")
            .or_else(|| name.strip_prefix("volatile "))
            .or_else(|| name.strip_prefix("restrict "));
        match stripped {
            Some(rest) => name = rest.trim_start(),
            None => return name,
        }
    }
}

/// Standard typedefs that map straight onto a Rust primitive.
pub fn known_typedef(name: &str) -> Option<&'static str> {
    let target = match name {
        "size_t" => "usize",
        "ssize_t" | "ptrdiff_t" | "intptr_t" => "isize",
        "uintptr_t" => "usize",
        "int8_t" => "i8",
        "int16_t" => "i16",
        "int32_t" => "i32",
        "int64_t" => "i64",
        "uint8_t" => "u8",
        "uint16_t" => "u16",
        "uint32_t" => "u32",
        "uint64_t" => "u64",
        "wchar_t" => "i32",
        "char16_t" => "u16",
        "char32_t" => "u32",
        // C variadic function support
        "va_list" | "__builtin_va_list" | "__va_list_tag" => "std::ffi::VaList",
        // Opaque file handle
        "FILE" => "std::ffi::c_void",
        _ => return None,
    };
    Some(target)
}
