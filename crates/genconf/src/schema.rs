//! resource schemas
//!
//! A [Block] describes one resource (or one nested structure): its attributes and its nested
//! block types, each nested block type holding a complete [Block] of its own.
//!
//! Schemas deserialize from the JSON form providers publish (`providers schema -json`):
//!
//! ```json
//! {
//!   "version": 0,
//!   "block": {
//!     "attributes": {
//!       "id": { "type": "string", "computed": true },
//!       "tags": { "type": ["map", "string"], "optional": true },
//!       "rule": {
//!         "nested_type": { "nesting_mode": "list", "attributes": { "port": { "type": "number", "required": true } } },
//!         "optional": true
//!       }
//!     },
//!     "block_types": {
//!       "network_interface": { "nesting_mode": "list", "min_items": 1, "block": { "attributes": {} } }
//!     }
//!   }
//! }
//! ```
use crate::types::Type;
use serde::Deserialize;
use std::collections::BTreeMap;

/// A resource schema document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResourceSchema {
    #[serde(default)]
    pub version: u64,
    pub block: Block,
}

/// A resource identity schema document
///
/// Identity schemas only have attributes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IdentitySchema {
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
}

impl IdentitySchema {
    pub fn into_block(self) -> Block {
        Block {
            attributes: self.attributes,
            block_types: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
    #[serde(default)]
    pub block_types: BTreeMap<String, NestedBlock>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn with_block(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.block_types.insert(name.into(), block);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.block_types.is_empty()
    }

    /// Type of values conforming to this block
    pub fn implied_type(&self) -> Type {
        let attributes = self
            .attributes
            .iter()
            .map(|(name, attribute)| (name.clone(), attribute.implied_type()));
        let blocks = self
            .block_types
            .iter()
            .map(|(name, block)| (name.clone(), block.implied_type()));

        Type::Object(attributes.chain(blocks).collect())
    }

    /// Structural self-validation
    ///
    /// Reports every problem found, not only the first.
    pub fn validate(&self) -> Result<(), InvalidSchema> {
        let mut errors = Vec::new();
        self.validate_at("", &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(InvalidSchema { errors })
        }
    }

    fn validate_at(&self, prefix: &str, errors: &mut Vec<SchemaError>) {
        for (name, attribute) in &self.attributes {
            let path = join_path(prefix, name);
            if !is_valid_name(name) {
                errors.push(SchemaError::InvalidName { path: path.clone() });
            }
            if self.block_types.contains_key(name) {
                errors.push(SchemaError::NameCollision { path: path.clone() });
            }
            attribute.validate_at(&path, errors);
        }

        for (name, nested) in &self.block_types {
            let path = join_path(prefix, name);
            if !is_valid_name(name) {
                errors.push(SchemaError::InvalidName { path: path.clone() });
            }
            nested.validate_at(&path, errors);
        }
    }
}

/// Type of an attribute: a plain type or a nested object definition
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    Type(Type),
    Nested(Object),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawAttribute")]
pub struct Attribute {
    pub ty: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub description: Option<String>,
}

impl Attribute {
    fn with_type(ty: AttributeType) -> Self {
        Self {
            ty,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            description: None,
        }
    }

    pub fn required(ty: Type) -> Self {
        Self {
            required: true,
            ..Self::with_type(AttributeType::Type(ty))
        }
    }

    pub fn optional(ty: Type) -> Self {
        Self {
            optional: true,
            ..Self::with_type(AttributeType::Type(ty))
        }
    }

    pub fn computed(ty: Type) -> Self {
        Self {
            computed: true,
            ..Self::with_type(AttributeType::Type(ty))
        }
    }

    /// Optional attribute with a nested object definition
    pub fn nested(object: Object) -> Self {
        Self {
            optional: true,
            ..Self::with_type(AttributeType::Nested(object))
        }
    }

    pub fn and_computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn and_required(mut self) -> Self {
        self.optional = false;
        self.required = true;
        self
    }

    pub fn and_sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Computed and not settable in configuration
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    pub fn implied_type(&self) -> Type {
        match &self.ty {
            AttributeType::Type(ty) => ty.clone(),
            AttributeType::Nested(object) => object.implied_type(),
        }
    }

    fn validate_at(&self, path: &str, errors: &mut Vec<SchemaError>) {
        let path = || path.to_string();

        if self.optional && self.required {
            errors.push(SchemaError::OptionalAndRequired { path: path() });
        }
        if self.computed && self.required {
            errors.push(SchemaError::ComputedAndRequired { path: path() });
        }
        if !self.optional && !self.required && !self.computed {
            errors.push(SchemaError::NoArgumentMode { path: path() });
        }

        if let AttributeType::Nested(object) = &self.ty {
            if object.nesting_mode == NestingMode::Group {
                errors.push(SchemaError::InvalidNestingMode {
                    path: path(),
                    mode: object.nesting_mode,
                });
            }
            for (name, attribute) in &object.attributes {
                let nested_path = join_path(path().as_str(), name);
                if !is_valid_name(name) {
                    errors.push(SchemaError::InvalidName {
                        path: nested_path.clone(),
                    });
                }
                attribute.validate_at(&nested_path, errors);
            }
        }
    }
}

#[derive(Deserialize)]
struct RawAttribute {
    #[serde(rename = "type")]
    ty: Option<Type>,
    nested_type: Option<Object>,
    #[serde(default, alias = "required_for_import")]
    required: bool,
    #[serde(default, alias = "optional_for_import")]
    optional: bool,
    #[serde(default)]
    computed: bool,
    #[serde(default)]
    sensitive: bool,
    description: Option<String>,
}

impl TryFrom<RawAttribute> for Attribute {
    type Error = SchemaError;

    fn try_from(raw: RawAttribute) -> Result<Self, Self::Error> {
        let ty = match (raw.ty, raw.nested_type) {
            (Some(ty), None) => AttributeType::Type(ty),
            (None, Some(object)) => AttributeType::Nested(object),
            _ => return Err(SchemaError::AttributeType),
        };

        Ok(Self {
            ty,
            required: raw.required,
            optional: raw.optional,
            computed: raw.computed,
            sensitive: raw.sensitive,
            description: raw.description,
        })
    }
}

/// Nested object definition of an attribute
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Object {
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
    #[serde(default)]
    pub nesting_mode: NestingMode,
}

impl Object {
    pub fn new(nesting_mode: NestingMode) -> Self {
        Self {
            attributes: BTreeMap::new(),
            nesting_mode,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    fn object_type(&self) -> Type {
        Type::Object(
            self.attributes
                .iter()
                .map(|(name, attribute)| (name.clone(), attribute.implied_type()))
                .collect(),
        )
    }

    pub fn implied_type(&self) -> Type {
        self.nesting_mode.wrap(self.object_type())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NestedBlock {
    pub nesting_mode: NestingMode,
    #[serde(default)]
    pub block: Block,
    #[serde(default)]
    pub min_items: u64,
    #[serde(default)]
    pub max_items: u64,
}

impl NestedBlock {
    pub fn new(nesting_mode: NestingMode, block: Block) -> Self {
        Self {
            nesting_mode,
            block,
            min_items: 0,
            max_items: 0,
        }
    }

    pub fn with_items(mut self, min_items: u64, max_items: u64) -> Self {
        self.min_items = min_items;
        self.max_items = max_items;
        self
    }

    pub fn implied_type(&self) -> Type {
        self.nesting_mode.wrap(self.block.implied_type())
    }

    fn validate_at(&self, path: &str, errors: &mut Vec<SchemaError>) {
        let limits = |detail| SchemaError::ItemLimits {
            path: path.to_string(),
            detail,
        };

        match self.nesting_mode {
            NestingMode::Single => {
                if self.min_items != self.max_items {
                    errors.push(limits("min_items and max_items must match in single mode"));
                } else if self.min_items > 1 {
                    errors.push(limits("min_items must be 0 or 1 in single mode"));
                }
            }
            NestingMode::Group => {
                if self.min_items != 0 || self.max_items != 0 {
                    errors.push(limits("min_items and max_items cannot be used in group mode"));
                }
            }
            NestingMode::List | NestingMode::Set => {
                if self.max_items != 0 && self.min_items > self.max_items {
                    errors.push(limits("min_items must not exceed max_items"));
                }
            }
            NestingMode::Map => {
                if self.min_items != 0 || self.max_items != 0 {
                    errors.push(limits("min_items and max_items must be 0 in map mode"));
                }
            }
        }

        self.block.validate_at(path, errors);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestingMode {
    /// Exactly one nested object, possibly null
    #[default]
    Single,
    /// Exactly one nested object, never null
    Group,
    List,
    Set,
    /// Keyed by string
    Map,
}

impl NestingMode {
    /// Type of a value holding objects of type `object` in this mode
    fn wrap(self, object: Type) -> Type {
        match self {
            NestingMode::Single | NestingMode::Group => object,
            NestingMode::List => Type::list(object),
            NestingMode::Set => Type::set(object),
            NestingMode::Map => Type::map(object),
        }
    }
}

impl std::fmt::Display for NestingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            NestingMode::Single => "single",
            NestingMode::Group => "group",
            NestingMode::List => "list",
            NestingMode::Set => "set",
            NestingMode::Map => "map",
        })
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SchemaError {
    #[error("attribute must set exactly one of `type` and `nested_type`")]
    AttributeType,
    #[error("{path}: names may only contain lowercase letters, digits and underscores")]
    InvalidName { path: String },
    #[error("{path}: name is used by an attribute and a nested block")]
    NameCollision { path: String },
    #[error("{path}: attribute cannot be both optional and required")]
    OptionalAndRequired { path: String },
    #[error("{path}: attribute cannot be both computed and required")]
    ComputedAndRequired { path: String },
    #[error("{path}: attribute must be optional, required or computed")]
    NoArgumentMode { path: String },
    #[error("{path}: nesting mode {mode} is not supported for nested attribute types")]
    InvalidNestingMode { path: String, mode: NestingMode },
    #[error("{path}: {detail}")]
    ItemLimits { path: String, detail: &'static str },
}

/// All problems found by [Block::validate]
#[derive(Debug, PartialEq)]
pub struct InvalidSchema {
    pub errors: Vec<SchemaError>,
}

impl std::error::Error for InvalidSchema {}

impl std::fmt::Display for InvalidSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "invalid schema:")?;
        for error in &self.errors {
            writeln!(f, "  {error}")?;
        }
        Ok(())
    }
}
