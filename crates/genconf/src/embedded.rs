//! strings that hold serialized JSON documents
//!
//! A string attribute whose content is a JSON object or array is written as
//! `jsonencode(<document as native expression>)` instead of an opaque string literal.
//! JSON documents that consist of a single scalar (`42`, `true`, `"text"`, `null`) are
//! left alone: they stay quoted strings.
use crate::body::Expr;
use crate::render;
use crate::types::Type;
use crate::value::Value;
use serde_json::Value as Json;

/// Function wrapping expanded documents
pub const ENCODE_FUNCTION: &str = "jsonencode";

/// Parses `s` if it holds a JSON object or array
pub fn structured_document(s: &str) -> Option<Value> {
    match serde_json::from_str::<Json>(s) {
        Ok(json @ (Json::Object(_) | Json::Array(_))) => Some(json.into()),
        _ => None,
    }
}

/// `jsonencode(...)` expression for `s`, if `s` holds a JSON object or array
pub fn expand(s: &str) -> Option<Expr> {
    let document = structured_document(s)?;
    tracing::trace!(kind = document.kind_name(), "expanding JSON document string");

    Some(Expr::call(
        ENCODE_FUNCTION,
        render::value_expr(&document, &Type::Dynamic),
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expanded(s: &str) -> Option<String> {
        expand(s).map(|expr| expr.to_string())
    }

    #[test]
    fn objects_are_expanded_with_sorted_keys() {
        let expected = r#"
jsonencode({
  a = 1
  b = [2, 3]
})"#;
        assert_eq!(
            expanded(r#"{"b":[2,3],"a":1}"#).as_deref(),
            Some(expected.trim_start())
        );
    }

    #[test]
    fn arrays_are_expanded() {
        assert_eq!(
            expanded(r#"["Hello", "World"]"#).as_deref(),
            Some(r#"jsonencode(["Hello", "World"])"#)
        );
        assert_eq!(expanded("  []  ").as_deref(), Some("jsonencode([])"));
    }

    #[test]
    fn scalar_documents_stay_strings() {
        for s in ["42", "true", "null", r#""quoted""#, "-1.5"] {
            assert_eq!(expanded(s), None, "{s}");
        }
    }

    #[test]
    fn malformed_documents_stay_strings() {
        for s in [r#"["Hello", "World""#, "", "{a: 1}", "not json"] {
            assert_eq!(expanded(s), None, "{s}");
        }
    }

    #[test]
    fn nested_strings_are_not_expanded() {
        assert_eq!(
            expanded(r#"{"inner": "{\"x\": 1}"}"#).as_deref(),
            Some("jsonencode({\n  inner = \"{\\\"x\\\": 1}\"\n})")
        );
    }
}
