//! value representation
//!
//! A [Value] is an immutable tree of the following data types
//! - null
//! - boolean (true/false)
//! - number (see [hcl::Number])
//! - string (utf-8)
//! - list (ordered sequence of values)
//! - set (unordered sequence of values, rendered in a stable order)
//! - map (string keys, values of one type)
//! - object (string keys, values of per-attribute types)
//!
//! Every node additionally carries a sensitivity mark. A mark on a container applies to
//! everything inside it; [Value::contains_marks] answers whether any part of a tree is marked.
use crate::types::Type;
use indexmap::IndexMap;
use serde_json::Value as Json;

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    data: Data,
    marked: bool,
}

/// All possible value kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Null,
    Bool(bool),
    Number(hcl::Number),
    String(String),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(IndexMap<String, Value>),
    Object(IndexMap<String, Value>),
}

pub(crate) static NULL: Value = Value::null();

impl Value {
    pub const fn null() -> Self {
        Self {
            data: Data::Null,
            marked: false,
        }
    }

    pub fn new(data: Data) -> Self {
        Self {
            data,
            marked: false,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(Data::String(value.into()))
    }

    pub fn number(value: impl Into<hcl::Number>) -> Self {
        Self::new(Data::Number(value.into()))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(Data::Bool(value))
    }

    pub fn list(values: impl IntoIterator<Item = Value>) -> Self {
        Self::new(Data::List(values.into_iter().collect()))
    }

    pub fn set(values: impl IntoIterator<Item = Value>) -> Self {
        Self::new(Data::Set(values.into_iter().collect()))
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::new(Data::Map(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn object<K: Into<String>>(attributes: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::new(Data::Object(
            attributes.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Marks this value (and thereby everything inside it) as sensitive
    pub fn mark(mut self) -> Self {
        self.marked = true;
        self
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn is_null(&self) -> bool {
        matches!(self.data, Data::Null)
    }

    /// Whether this node itself carries a mark
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    /// Whether this node or anything below it carries a mark
    pub fn contains_marks(&self) -> bool {
        self.marked
            || match &self.data {
                Data::List(values) | Data::Set(values) => values.iter().any(Value::contains_marks),
                Data::Map(entries) | Data::Object(entries) => {
                    entries.values().any(Value::contains_marks)
                }
                Data::Null | Data::Bool(_) | Data::Number(_) | Data::String(_) => false,
            }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            Data::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attribute or map entry by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        match &self.data {
            Data::Map(entries) | Data::Object(entries) => entries.get(name),
            _ => None,
        }
    }

    /// Entries of a map or object
    pub fn entries(&self) -> Option<&IndexMap<String, Value>> {
        match &self.data {
            Data::Map(entries) | Data::Object(entries) => Some(entries),
            _ => None,
        }
    }

    /// Elements of a list or set
    pub fn elements(&self) -> Option<&[Value]> {
        match &self.data {
            Data::List(values) | Data::Set(values) => Some(values),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.data {
            Data::Null => "null",
            Data::Bool(_) => "bool",
            Data::Number(_) => "number",
            Data::String(_) => "string",
            Data::List(_) => "list",
            Data::Set(_) => "set",
            Data::Map(_) => "map",
            Data::Object(_) => "object",
        }
    }

    /// Shape check of this value against a static type
    ///
    /// `null` conforms to every type and every value conforms to [Type::Dynamic].
    pub fn conforms_to(&self, ty: &Type) -> bool {
        match (&self.data, ty) {
            (Data::Null, _) | (_, Type::Dynamic) => true,
            (Data::Bool(_), Type::Bool)
            | (Data::Number(_), Type::Number)
            | (Data::String(_), Type::String) => true,
            (Data::List(values) | Data::Set(values), Type::List(element) | Type::Set(element)) => {
                values.iter().all(|value| value.conforms_to(element))
            }
            (Data::List(values), Type::Tuple(types)) => {
                values.len() == types.len()
                    && values.iter().zip(types).all(|(value, ty)| value.conforms_to(ty))
            }
            (Data::Map(entries) | Data::Object(entries), Type::Map(element)) => {
                entries.values().all(|value| value.conforms_to(element))
            }
            (Data::Map(entries) | Data::Object(entries), Type::Object(attributes)) => {
                entries.iter().all(|(name, value)| {
                    attributes
                        .get(name)
                        .is_some_and(|ty| value.conforms_to(ty))
                })
            }
            _ => false,
        }
    }

    /// Builds a value from plain JSON, guided by a static type
    ///
    /// The type decides between list and set or map and object. Attributes an object type
    /// declares but the JSON lacks become `null`. Keys the type does not know are kept as-is,
    /// and so are object attributes and map entries that do not fit their type. Only a
    /// mismatch at the top is an error.
    pub fn from_json(json: &Json, ty: &Type) -> Result<Self, ValueError> {
        from_json_at(json, ty, &mut Vec::new())
    }

    /// Applies marks from a document shaped like the value
    ///
    /// `true` marks the value at that position, objects and arrays descend by key and index.
    /// Anything else, and positions the value does not have, are ignored.
    pub fn apply_sensitive_values(&mut self, marks: &Json) {
        match marks {
            Json::Bool(true) => self.marked = true,
            Json::Object(marks) => {
                if let Data::Map(entries) | Data::Object(entries) = &mut self.data {
                    for (key, marks) in marks {
                        if let Some(entry) = entries.get_mut(key) {
                            entry.apply_sensitive_values(marks);
                        }
                    }
                }
            }
            Json::Array(marks) => {
                if let Data::List(values) | Data::Set(values) = &mut self.data {
                    for (value, marks) in values.iter_mut().zip(marks) {
                        value.apply_sensitive_values(marks);
                    }
                }
            }
            _ => {}
        }
    }
}

fn from_json_at(json: &Json, ty: &Type, path: &mut Vec<String>) -> Result<Value, ValueError> {
    let mismatch = |path: &[String]| ValueError::TypeMismatch {
        path: path.join("."),
        expected: ty.friendly_name(),
        found: json_kind(json),
    };

    let data = match (json, ty) {
        (Json::Null, _) => Data::Null,
        (_, Type::Dynamic) => return Ok(json.clone().into()),

        (Json::String(s), Type::String) => Data::String(s.clone()),
        (Json::Number(n), Type::String) => Data::String(n.to_string()),
        (Json::Bool(b), Type::String) => Data::String(b.to_string()),

        (Json::Number(n), Type::Number) => {
            Data::Number(number_from_json(n).ok_or_else(|| mismatch(path))?)
        }
        (Json::String(s), Type::Number) => {
            let n: serde_json::Number = s.trim().parse().map_err(|_| mismatch(path))?;
            Data::Number(number_from_json(&n).ok_or_else(|| mismatch(path))?)
        }

        (Json::Bool(b), Type::Bool) => Data::Bool(*b),
        (Json::String(s), Type::Bool) => match s.as_str() {
            "true" => Data::Bool(true),
            "false" => Data::Bool(false),
            _ => return Err(mismatch(path)),
        },

        (Json::Array(elements), Type::List(element_ty) | Type::Set(element_ty)) => {
            let mut values = Vec::with_capacity(elements.len());
            for (index, element) in elements.iter().enumerate() {
                path.push(index.to_string());
                values.push(from_json_at(element, element_ty, path)?);
                path.pop();
            }
            if matches!(ty, Type::Set(_)) {
                Data::Set(values)
            } else {
                Data::List(values)
            }
        }
        (Json::Array(elements), Type::Tuple(types)) => {
            if elements.len() != types.len() {
                return Err(mismatch(path));
            }
            let mut values = Vec::with_capacity(elements.len());
            for (index, (element, element_ty)) in elements.iter().zip(types).enumerate() {
                path.push(index.to_string());
                values.push(from_json_at(element, element_ty, path)?);
                path.pop();
            }
            Data::List(values)
        }

        (Json::Object(entries), Type::Map(element_ty)) => {
            let mut map = IndexMap::with_capacity(entries.len());
            for (key, entry) in entries {
                map.insert(key.clone(), member_from_json(entry, element_ty, key, path));
            }
            Data::Map(map)
        }
        (Json::Object(entries), Type::Object(attributes)) => {
            let mut object = IndexMap::with_capacity(attributes.len());
            for (name, attribute_ty) in attributes {
                let value = match entries.get(name) {
                    Some(entry) => member_from_json(entry, attribute_ty, name, path),
                    None => Value::null(),
                };
                object.insert(name.clone(), value);
            }
            for (key, entry) in entries {
                if !attributes.contains_key(key) {
                    object.insert(key.clone(), entry.clone().into());
                }
            }
            Data::Object(object)
        }

        _ => return Err(mismatch(path)),
    };

    Ok(Value::new(data))
}

/// A member that does not fit its type is kept untyped, for the composer to report
fn member_from_json(json: &Json, ty: &Type, name: &str, path: &mut Vec<String>) -> Value {
    let depth = path.len();
    path.push(name.to_string());
    let value = match from_json_at(json, ty, path) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(%err, "keeping untyped value");
            json.clone().into()
        }
    };
    path.truncate(depth);
    value
}

fn number_from_json(number: &serde_json::Number) -> Option<hcl::Number> {
    if let Some(int) = number.as_i64() {
        return Some(int.into());
    }
    if let Some(uint) = number.as_u64() {
        return Some(uint.into());
    }
    number.as_f64().and_then(hcl::Number::from_f64)
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValueError {
    #[error("{found} at `{path}` cannot be used as {expected}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: &'static str,
    },
}

/// Untyped conversion: arrays become lists and JSON objects become objects
impl From<Json> for Value {
    fn from(value: Json) -> Self {
        match value {
            Json::Null => Value::null(),
            Json::Bool(b) => b.into(),
            Json::Number(n) => match number_from_json(&n) {
                Some(n) => Value::number(n),
                None => Value::string(n.to_string()),
            },
            Json::String(s) => s.into(),
            Json::Array(elements) => Value::list(elements.into_iter().map(Value::from)),
            Json::Object(entries) => {
                Value::object(entries.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::string(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::number(value)
    }
}

impl From<hcl::Number> for Value {
    fn from(value: hcl::Number) -> Self {
        Value::number(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::list(value.into_iter().map(Into::into))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Value::null, Into::into)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn typed_import_distinguishes_sets_and_maps() {
        let ty = Type::object([
            ("tags", Type::map(Type::String)),
            ("zones", Type::set(Type::String)),
            ("size", Type::Number),
        ]);

        let value = Value::from_json(
            &json!({"tags": {"env": "dev"}, "zones": ["a", "b"], "size": 3}),
            &ty,
        )
        .unwrap();

        assert_eq!(
            value,
            Value::object([
                ("size", Value::number(3)),
                ("tags", Value::map([("env", Value::string("dev"))])),
                ("zones", Value::set([Value::string("a"), Value::string("b")])),
            ])
        );
    }

    #[test]
    fn typed_import_fills_absent_attributes_with_null() {
        let ty = Type::object([("id", Type::String), ("name", Type::String)]);
        let value = Value::from_json(&json!({"name": "x"}), &ty).unwrap();

        assert_eq!(value.get("id"), Some(&Value::null()));
        assert_eq!(value.get("name"), Some(&Value::string("x")));
    }

    #[test]
    fn typed_import_keeps_unknown_keys() {
        let ty = Type::object([("id", Type::String)]);
        let value = Value::from_json(&json!({"id": "x", "extra": [1]}), &ty).unwrap();

        assert_eq!(value.get("extra"), Some(&Value::list([Value::number(1)])));
    }

    #[test]
    fn typed_import_reports_mismatch_path() {
        let ty = Type::list(Type::Number);
        let err = Value::from_json(&json!([80, {"x": 1}]), &ty).unwrap_err();

        assert_eq!(
            err,
            ValueError::TypeMismatch {
                path: "1".into(),
                expected: "number".into(),
                found: "object",
            }
        );
    }

    #[test]
    fn typed_import_keeps_mistyped_members_untyped() {
        let ty = Type::object([
            ("name", Type::String),
            ("ports", Type::list(Type::Number)),
            ("tags", Type::map(Type::String)),
            ("labels", Type::map(Type::Number)),
        ]);
        let value = Value::from_json(
            &json!({
                "name": "web",
                "ports": [80, {"x": 1}],
                "tags": ["not", "a", "map"],
                "labels": {"a": 1, "b": "two"},
            }),
            &ty,
        )
        .unwrap();

        assert_eq!(value.get("name"), Some(&Value::string("web")));
        assert!(!value.get("ports").unwrap().conforms_to(&Type::list(Type::Number)));
        assert_eq!(
            value.get("tags"),
            Some(&Value::list([
                Value::string("not"),
                Value::string("a"),
                Value::string("map")
            ]))
        );

        let labels = value.get("labels").unwrap();
        assert_eq!(labels.get("a"), Some(&Value::number(1)));
        assert_eq!(labels.get("b"), Some(&Value::string("two")));
        assert!(!labels.conforms_to(&Type::map(Type::Number)));
    }

    #[test]
    fn primitive_conversions() {
        assert_eq!(
            Value::from_json(&json!(42), &Type::String).unwrap(),
            Value::string("42")
        );
        assert_eq!(
            Value::from_json(&json!("7"), &Type::Number).unwrap(),
            Value::number(7)
        );
        assert_eq!(
            Value::from_json(&json!("true"), &Type::Bool).unwrap(),
            Value::bool(true)
        );
        assert!(Value::from_json(&json!("yes"), &Type::Bool).is_err());
    }

    #[test]
    fn marks_propagate_through_reduction() {
        let value = Value::object([(
            "outer",
            Value::list([Value::string("a"), Value::string("b").mark()]),
        )]);

        assert!(!value.is_marked());
        assert!(value.contains_marks());
        assert!(!value.get("outer").unwrap().elements().unwrap()[0].contains_marks());
    }

    #[test]
    fn sensitive_values_document() {
        let ty = Type::object([
            ("password", Type::String),
            ("users", Type::list(Type::object([("token", Type::String)]))),
            ("name", Type::String),
        ]);
        let mut value = Value::from_json(
            &json!({"password": "p", "users": [{"token": "t"}, {"token": "u"}], "name": "n"}),
            &ty,
        )
        .unwrap();

        value.apply_sensitive_values(&json!({
            "password": true,
            "users": [{}, {"token": true}],
            "missing": true
        }));

        assert!(value.get("password").unwrap().is_marked());
        assert!(!value.get("name").unwrap().contains_marks());
        let users = value.get("users").unwrap().elements().unwrap();
        assert!(!users[0].contains_marks());
        assert!(users[1].get("token").unwrap().is_marked());
    }

    #[test]
    fn conformance() {
        let ty = Type::object([("a", Type::list(Type::String))]);

        assert!(Value::object([("a", Value::list([Value::string("x")]))]).conforms_to(&ty));
        assert!(Value::object([("a", Value::null())]).conforms_to(&ty));
        assert!(!Value::object([("a", Value::string("x"))]).conforms_to(&ty));
        assert!(!Value::object([("b", Value::null())]).conforms_to(&ty));
        assert!(Value::string("anything").conforms_to(&Type::Dynamic));
    }
}
