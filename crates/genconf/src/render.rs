//! values as expressions
//!
//! - `null`, booleans and numbers are written in their canonical form
//! - strings become quoted literals
//! - lists keep their order, sets are ordered by their rendered text
//! - maps and objects become object expressions with keys in lexicographic order
use crate::body::{Attribute, Body, Expr};
use crate::key;
use crate::types::Type;
use crate::value::{Data, Value};
use indexmap::IndexMap;

static DYNAMIC: Type = Type::Dynamic;

/// Renders `value`, using `ty` where the value alone is ambiguous
///
/// A list rendered against a set type is ordered like a set. Marked values render as `null`;
/// callers redact whole attributes before getting here.
pub fn value_expr(value: &Value, ty: &Type) -> Expr {
    if value.is_marked() {
        return Expr::null();
    }

    match value.data() {
        Data::Null => Expr::null(),
        Data::Bool(b) => Expr::raw(b.to_string()),
        Data::Number(n) => Expr::raw(n.to_string()),
        Data::String(s) => Expr::raw(key::quote(s)),
        Data::List(elements) => {
            let exprs = elements
                .iter()
                .enumerate()
                .map(|(index, element)| value_expr(element, element_type(ty, index)))
                .collect();
            if matches!(ty, Type::Set(_)) {
                sorted(exprs)
            } else {
                Expr::Array(exprs)
            }
        }
        Data::Set(elements) => sorted(
            elements
                .iter()
                .enumerate()
                .map(|(index, element)| value_expr(element, element_type(ty, index)))
                .collect(),
        ),
        Data::Map(entries) | Data::Object(entries) => Expr::Object(object_body(entries, ty)),
    }
}

fn sorted(mut exprs: Vec<Expr>) -> Expr {
    exprs.sort_by_cached_key(|expr| expr.to_string());
    Expr::Array(exprs)
}

fn object_body(entries: &IndexMap<String, Value>, ty: &Type) -> Body {
    let mut keys: Vec<&String> = entries.keys().collect();
    keys.sort();

    keys.into_iter()
        .map(|key| {
            let attribute_ty = match ty {
                Type::Object(attributes) => attributes.get(key).unwrap_or(&DYNAMIC),
                Type::Map(element) => element,
                _ => &DYNAMIC,
            };
            Attribute::new(key, value_expr(&entries[key], attribute_ty)).into()
        })
        .collect()
}

fn element_type(ty: &Type, index: usize) -> &Type {
    match ty {
        Type::List(element) | Type::Set(element) => element,
        Type::Tuple(types) => types.get(index).unwrap_or(&DYNAMIC),
        _ => &DYNAMIC,
    }
}
