//! static value types
//!
//! Types are written in the same JSON notation providers use when they publish their schemas:
//! - primitives are plain strings: `"string"`, `"number"`, `"bool"`, `"dynamic"`
//! - collections are pairs: `["list", "string"]`, `["set", "number"]`, `["map", "bool"]`
//! - structural types: `["object", {"name": "string"}]`, `["tuple", ["string", "number"]]`
//!
//! Object types may carry a third element listing optional attributes. It does not change how
//! values are rendered and is ignored.
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    String,
    Number,
    Bool,
    /// Any type, only known once a value exists
    Dynamic,
    List(Box<Type>),
    Set(Box<Type>),
    Map(Box<Type>),
    Object(BTreeMap<String, Type>),
    Tuple(Vec<Type>),
}

impl Type {
    pub fn list(element: Type) -> Self {
        Type::List(Box::new(element))
    }

    pub fn set(element: Type) -> Self {
        Type::Set(Box::new(element))
    }

    pub fn map(element: Type) -> Self {
        Type::Map(Box::new(element))
    }

    pub fn object<K: Into<String>>(attributes: impl IntoIterator<Item = (K, Type)>) -> Self {
        Type::Object(
            attributes
                .into_iter()
                .map(|(name, ty)| (name.into(), ty))
                .collect(),
        )
    }

    /// Human readable name as used in generated template comments
    ///
    /// `list of string`, `map of object`, ...
    pub fn friendly_name(&self) -> String {
        match self {
            Type::String => "string".to_string(),
            Type::Number => "number".to_string(),
            Type::Bool => "bool".to_string(),
            Type::Dynamic => "dynamic".to_string(),
            Type::List(element) => format!("list of {}", element.friendly_name()),
            Type::Set(element) => format!("set of {}", element.friendly_name()),
            Type::Map(element) => format!("map of {}", element.friendly_name()),
            Type::Object(_) => "object".to_string(),
            Type::Tuple(_) => "tuple".to_string(),
        }
    }

    /// Parse the JSON type notation
    pub fn from_json(json: &serde_json::Value) -> Result<Self, TypeError> {
        use serde_json::Value as Json;

        match json {
            Json::String(name) => match name.as_str() {
                "string" => Ok(Type::String),
                "number" => Ok(Type::Number),
                "bool" => Ok(Type::Bool),
                "dynamic" => Ok(Type::Dynamic),
                other => Err(TypeError::UnknownPrimitive(other.to_string())),
            },
            Json::Array(parts) => {
                let Some(Json::String(kind)) = parts.first() else {
                    return Err(TypeError::Malformed(json.to_string()));
                };
                let Some(arg) = parts.get(1) else {
                    return Err(TypeError::Malformed(json.to_string()));
                };

                match kind.as_str() {
                    "list" => Ok(Type::list(Type::from_json(arg)?)),
                    "set" => Ok(Type::set(Type::from_json(arg)?)),
                    "map" => Ok(Type::map(Type::from_json(arg)?)),
                    "object" => {
                        let Json::Object(attributes) = arg else {
                            return Err(TypeError::Malformed(json.to_string()));
                        };
                        attributes
                            .iter()
                            .map(|(name, ty)| Ok((name.clone(), Type::from_json(ty)?)))
                            .collect::<Result<_, _>>()
                            .map(Type::Object)
                    }
                    "tuple" => {
                        let Json::Array(elements) = arg else {
                            return Err(TypeError::Malformed(json.to_string()));
                        };
                        elements
                            .iter()
                            .map(Type::from_json)
                            .collect::<Result<_, _>>()
                            .map(Type::Tuple)
                    }
                    other => Err(TypeError::UnknownKind(other.to_string())),
                }
            }
            _ => Err(TypeError::Malformed(json.to_string())),
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.friendly_name())
    }
}

impl<'de> serde::Deserialize<'de> for Type {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let json = serde_json::Value::deserialize(deserializer)?;
        Type::from_json(&json).map_err(serde::de::Error::custom)
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TypeError {
    #[error("unknown primitive type {0:?}")]
    UnknownPrimitive(String),
    #[error("unknown type kind {0:?}")]
    UnknownKind(String),
    #[error("malformed type expression {0}")]
    Malformed(String),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parse_nested_types() {
        let ty = Type::from_json(&json!(["map", ["object", {"id": "string", "ports": ["list", "number"]}]]))
            .unwrap();

        assert_eq!(
            ty,
            Type::map(Type::object([
                ("id", Type::String),
                ("ports", Type::list(Type::Number))
            ]))
        );
    }

    #[test]
    fn object_optional_attribute_list_is_ignored() {
        let ty = Type::from_json(&json!(["object", {"a": "bool"}, ["a"]])).unwrap();
        assert_eq!(ty, Type::object([("a", Type::Bool)]));
    }

    #[test]
    fn friendly_names() {
        assert_eq!(Type::set(Type::String).friendly_name(), "set of string");
        assert_eq!(
            Type::list(Type::object([("a", Type::Bool)])).friendly_name(),
            "list of object"
        );
        assert_eq!(Type::Dynamic.to_string(), "dynamic");
    }

    #[test]
    fn rejects_unknown_types() {
        assert_eq!(
            Type::from_json(&json!("integer")),
            Err(TypeError::UnknownPrimitive("integer".into()))
        );
        assert_eq!(
            Type::from_json(&json!(["queue", "string"])),
            Err(TypeError::UnknownKind("queue".into()))
        );
        assert!(Type::from_json(&json!(["list"])).is_err());
    }
}
