//! Identifier and expression-text helpers shared by the translator.

use ur_clang::CType;

/// The null pointer sentinel in generated code.
pub const NULL: &str = "std::ptr::null_mut()";

/// Rust reserved keywords that need raw identifier syntax.
const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn",
    "else", "enum", "extern", "false", "fn", "for", "if", "impl", "in",
    "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
    "abstract", "become", "box", "do", "final", "macro", "override",
    "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be raw identifiers.
const NOT_RAW: &[&str] = &["self", "Self", "super", "crate"];

/// Make a C identifier usable in Rust.
pub fn sanitize_identifier(name: &str) -> String {
    if NOT_RAW.contains(&name) {
        return format!("{}_", name);
    }
    if RUST_KEYWORDS.contains(&name) {
        return format!("r#{}", name);
    }
    name.to_string()
}

/// The C zero value for an object of type `ty`, as Rust text.
///
/// Used where C leaves a static zero-initialised.
pub fn zero_value(ty: &CType, render: &dyn Fn(&CType) -> String) -> String {
    match ty {
        CType::Bool => "false".to_string(),
        CType::Float | CType::Double | CType::LongDouble => "0.0".to_string(),
        CType::Pointer(_) => NULL.to_string(),
        CType::Array {
            element,
            size: Some(n),
        } => format!("[{}; {}]", zero_value(element, render), n),
        CType::Record(_) => format!("unsafe {{ std::mem::zeroed::<{}>() }}", render(ty)),
        t if t.is_integer() => "0".to_string(),
        _ => "unsafe { std::mem::zeroed() }".to_string(),
    }
}

/// Whether the whole text is enclosed in one matching pair of parentheses.
fn is_wrapped(text: &str) -> bool {
    if !text.starts_with('(') || !text.ends_with(')') {
        return false;
    }
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != text.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Identifiers, literals, member chains and calls need no grouping.
fn is_atom(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            c if depth == 0 && !(c.is_alphanumeric() || c == '_' || c == '.' || c == ':') => {
                return false;
            }
            _ => {}
        }
    }
    true
}

/// Wrap `text` in parentheses unless it is already a single operand.
pub fn parentize(text: &str) -> String {
    let text = text.trim();
    if is_atom(text) || is_wrapped(text) {
        text.to_string()
    } else {
        format!("({})", text)
    }
}

/// Strip enclosing parentheses.
pub fn deparentize(text: &str) -> &str {
    let mut text = text.trim();
    while is_wrapped(text) {
        text = text[1..text.len() - 1].trim();
    }
    text
}

/// Replace a literal zero with the null sentinel when `ty` is a pointer.
pub fn null_if_zero(text: String, ty: &CType) -> String {
    if ty.is_pointer() && deparentize(&text) == "0" {
        NULL.to_string()
    } else {
        text
    }
}

/// Expression text with any statement terminator removed.
pub fn as_expression(text: &str) -> &str {
    text.trim().trim_end_matches(';').trim_end()
}

/// Statement text: terminated with `;` unless it ends in a block.
pub fn as_statement(text: &str) -> String {
    let text = text.trim_end();
    if text.is_empty() || text.ends_with(';') || text.ends_with('}') {
        text.to_string()
    } else {
        format!("{};", text)
    }
}

/// Render statements as a braced block, indented one level.
pub fn block(statements: &[String]) -> String {
    let mut out = String::from("{\n");
    for stmt in statements {
        for line in stmt.lines() {
            if line.trim().is_empty() {
                out.push('\n');
            } else {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("type"), "r#type");
        assert_eq!(sanitize_identifier("match"), "r#match");
        assert_eq!(sanitize_identifier("self"), "self_");
        assert_eq!(sanitize_identifier("width"), "width");
    }

    #[test]
    fn test_zero_values() {
        let render = |t: &CType| t.to_rust_type_str();
        assert_eq!(zero_value(&CType::int(), &render), "0");
        assert_eq!(zero_value(&CType::Float, &render), "0.0");
        assert_eq!(zero_value(&CType::char().ptr(), &render), NULL);
        assert_eq!(zero_value(&CType::Bool, &render), "false");
        assert_eq!(zero_value(&CType::int().array(4), &render), "[0; 4]");
        assert_eq!(
            zero_value(&CType::record("point"), &render),
            "unsafe { std::mem::zeroed::<point>() }"
        );
    }

    #[test]
    fn test_parentize() {
        assert_eq!(parentize("x"), "x");
        assert_eq!(parentize("p.next"), "p.next");
        assert_eq!(parentize("f(a, b)"), "f(a, b)");
        assert_eq!(parentize("a[i + 1]"), "a[i + 1]");
        assert_eq!(parentize("a + b"), "(a + b)");
        assert_eq!(parentize("(a + b)"), "(a + b)");
        assert_eq!(parentize("(a) + (b)"), "((a) + (b))");
    }

    #[test]
    fn test_deparentize() {
        assert_eq!(deparentize("((0))"), "0");
        assert_eq!(deparentize("(a) + (b)"), "(a) + (b)");
        assert_eq!(deparentize("0"), "0");
    }

    #[test]
    fn test_null_if_zero() {
        let ptr = CType::int().ptr();
        assert_eq!(null_if_zero("0".into(), &ptr), NULL);
        assert_eq!(null_if_zero("(0)".into(), &ptr), NULL);
        assert_eq!(null_if_zero("0".into(), &CType::int()), "0");
        assert_eq!(null_if_zero("p".into(), &ptr), "p");
    }

    #[test]
    fn test_statement_terminators() {
        assert_eq!(as_statement("x += 1"), "x += 1;");
        assert_eq!(as_statement("x = 1;"), "x = 1;");
        assert_eq!(as_statement("if a {\n}"), "if a {\n}");
        assert_eq!(as_statement(""), "");
        assert_eq!(as_expression("x = 1;"), "x = 1");
    }

    #[test]
    fn test_block_indents_nested_lines() {
        let text = block(&["a();".to_string(), "if b {\n    c();\n}".to_string()]);
        assert_eq!(text, "{\n    a();\n    if b {\n        c();\n    }\n}");
    }
}
