//! identifiers and string literals
//!
//! Object keys, attribute names and block labels are written as bare identifiers when they
//! match `[A-Za-z_][A-Za-z0-9_]*` and as quoted string literals otherwise.

/// Whether `s` can be written without quotes
pub fn is_bare_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns `key` unchanged if it is a bare identifier, otherwise as a quoted literal
pub fn key(key: &str) -> String {
    if is_bare_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Quoted string literal
///
/// Escapes quotes, backslashes and control characters. Template sequences (`${`, `%{`) are
/// doubled so the literal is never interpreted as a template.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');

    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }

    out.push('"');
    out
}
