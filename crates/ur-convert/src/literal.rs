//! C literal spellings rewritten as Rust literals.

/// Integer literal without C width/signedness suffixes: `10UL` → `10`.
pub fn integer_literal(token: &str) -> String {
    let trimmed = token.trim_end_matches(['u', 'U', 'l', 'L']);
    if trimmed.is_empty() {
        return "0".to_string();
    }
    // C octal: 017
    if trimmed.len() > 1
        && trimmed.starts_with('0')
        && trimmed[1..].chars().all(|c| c.is_ascii_digit())
    {
        return format!("0o{}", &trimmed[1..]);
    }
    trimmed.to_string()
}

/// Floating literal: `1.5f` → `1.5f32`, `1.` → `1.0`, `2.0L` → `2.0`.
pub fn float_literal(token: &str) -> String {
    let is_hex = token.starts_with("0x") || token.starts_with("0X");
    let (mut body, is_float) = match token.strip_suffix(['f', 'F']) {
        Some(body) if !is_hex => (body.to_string(), true),
        _ => (token.trim_end_matches(['l', 'L']).to_string(), false),
    };

    if body.ends_with('.') {
        body.push('0');
    }
    if body.starts_with('.') {
        body.insert(0, '0');
    }
    // 1.e5 is not valid Rust
    if let Some(pos) = body.find(".e").or_else(|| body.find(".E")) {
        body.insert(pos + 1, '0');
    }
    if is_float {
        body.push_str("f32");
    }
    body
}

/// Character literal; an empty or NUL character becomes `'\0'`.
pub fn char_literal(token: &str) -> String {
    let unprefixed = token.trim_start_matches(['L', 'u', 'U']);
    let inner = unprefixed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(unprefixed);

    if inner.is_empty() || inner == "\0" || inner == "\\0" {
        return "'\\0'".to_string();
    }
    format!("'{}'", inner)
}

/// String literal without its width prefix: `L"abc"` → `"abc"`.
pub fn string_literal(spelling: &str) -> String {
    for prefix in ["u8", "L", "u", "U"] {
        if let Some(rest) = spelling.strip_prefix(prefix) {
            if rest.starts_with('"') {
                return rest.to_string();
            }
        }
    }
    spelling.to_string()
}

/// Parse an integer as written in C (decimal, hex, octal, negative, suffixed).
pub fn parse_c_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let text = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text)
        .trim();

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim()),
        None => (false, text),
    };
    let digits = digits.trim_end_matches(['u', 'U', 'l', 'L']);

    let value = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(octal) = digits.strip_prefix("0o") {
        i64::from_str_radix(octal, 8).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };

    Some(if negative { -value } else { value })
}
