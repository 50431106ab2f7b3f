//! schema and value to [Body]
//!
//! The [Composer] walks a schema [Block] and builds the body of a declaration.
//!
//! With a value ([Composer::state_body]) every attribute and nested block is written as it is
//! found in the value:
//! - attributes come first, then nested blocks, each in lexicographic order
//! - computed-only attributes are left out according to [ComputedAttributes]
//! - sensitive attributes, and attributes with a marked value anywhere inside, become
//!   `null # sensitive`
//! - nested blocks follow their nesting mode: `single` is left out when null, `group` is
//!   always written, `list` keeps its order, `set` is ordered by rendered text and `map`
//!   writes one labelled block per key
//!
//! Without a value ([Composer::template_body]) a template is written instead: every settable
//! attribute is `null` and annotated with `# REQUIRED <type>` or `# OPTIONAL <type>`, every
//! nested block type appears once.
//!
//! Values that do not fit the schema are never fatal. The affected part is written as `null`
//! (or left out for blocks) and a warning is recorded.
use crate::body::{Attribute, Block as BodyBlock, Body, Expr};
use crate::diagnostics::Diagnostics;
use crate::embedded;
use crate::key;
use crate::options::{ComputedAttributes, GenerateOptions};
use crate::render;
use crate::schema::{Attribute as SchemaAttribute, AttributeType, Block, NestedBlock, NestingMode, Object};
use crate::types::Type;
use crate::value::{Value, NULL};
use std::collections::BTreeMap;

pub const SENSITIVE_COMMENT: &str = "# sensitive";

/// Label used for map-mode blocks and map entries in templates
const TEMPLATE_KEY: &str = "key";

pub struct Composer<'o> {
    options: &'o GenerateOptions,
    expand_json: bool,
    diagnostics: Diagnostics,
    path: Vec<String>,
}

impl<'o> Composer<'o> {
    pub fn new(options: &'o GenerateOptions) -> Self {
        Self {
            options,
            expand_json: options.expand_json_strings,
            diagnostics: Diagnostics::new(),
            path: Vec::new(),
        }
    }

    /// Composer for identity bodies, strings are never expanded there
    pub fn identity(options: &'o GenerateOptions) -> Self {
        Self {
            expand_json: false,
            ..Self::new(options)
        }
    }

    /// Problems found so far
    pub fn finish(self) -> Diagnostics {
        self.diagnostics
    }

    pub fn state_body(&mut self, block: &Block, value: &Value) -> Body {
        self.block_body(block, value, value.is_marked())
    }

    pub fn template_body(&mut self, block: &Block) -> Body {
        let mut body = template_attributes(&block.attributes);

        for (name, nested) in &block.block_types {
            let mut template = BodyBlock::new(name, self.template_body(&nested.block));
            if nested.nesting_mode == NestingMode::Map {
                template = template.with_label(TEMPLATE_KEY);
            }
            let comment = if nested.min_items > 0 {
                "# REQUIRED block"
            } else {
                "# OPTIONAL block"
            };
            body.push(template.with_comment(comment));
        }

        body
    }

    fn block_body(&mut self, block: &Block, value: &Value, marked: bool) -> Body {
        self.check_object(value, |name| {
            block.attributes.contains_key(name) || block.block_types.contains_key(name)
        });

        let mut body = Body::new();
        for (name, attribute) in &block.attributes {
            let field = value.get(name).unwrap_or(&NULL);
            self.at(name.clone(), |c| {
                c.attribute(&mut body, name, attribute, field, marked)
            });
        }
        for (name, nested) in &block.block_types {
            let field = value.get(name).unwrap_or(&NULL);
            self.at(name.clone(), |c| c.blocks(&mut body, name, nested, field, marked));
        }
        body
    }

    fn attributes_body(&mut self, attributes: &BTreeMap<String, SchemaAttribute>, value: &Value) -> Body {
        self.check_object(value, |name| attributes.contains_key(name));

        let mut body = Body::new();
        for (name, attribute) in attributes {
            let field = value.get(name).unwrap_or(&NULL);
            self.at(name.clone(), |c| {
                c.attribute(&mut body, name, attribute, field, false)
            });
        }
        body
    }

    /// Warns about values that are not objects and keys the schema does not know
    fn check_object(&mut self, value: &Value, known: impl Fn(&str) -> bool) {
        if value.is_null() {
            return;
        }
        let Some(entries) = value.entries() else {
            self.mismatch("object", value);
            return;
        };

        for key in entries.keys().filter(|key| !known(key)) {
            self.at(key.clone(), |c| {
                c.warning(
                    "Value not in schema",
                    format!("`{key}` is neither an attribute nor a nested block and was left out"),
                )
            });
        }
    }

    fn attribute(
        &mut self,
        body: &mut Body,
        name: &str,
        attribute: &SchemaAttribute,
        value: &Value,
        marked: bool,
    ) {
        if attribute.is_computed_only() {
            match self.options.computed {
                ComputedAttributes::Omit => return,
                ComputedAttributes::OmitNull if value.is_null() => return,
                ComputedAttributes::OmitNull => {}
            }
        }

        if attribute.sensitive || marked || value.contains_marks() {
            tracing::debug!(path = %self.path(), "redacting sensitive attribute");
            body.push(Attribute::new(name, Expr::null()).with_comment(SENSITIVE_COMMENT));
            return;
        }

        let expr = match &attribute.ty {
            AttributeType::Type(ty) => self.typed_expr(ty, value),
            AttributeType::Nested(object) => self.nested_expr(object, value),
        };
        body.push(Attribute::new(name, expr));
    }

    fn typed_expr(&mut self, ty: &Type, value: &Value) -> Expr {
        if !value.conforms_to(ty) {
            self.mismatch(&ty.friendly_name(), value);
            return Expr::null();
        }

        if self.expand_json && *ty == Type::String {
            if let Some(expr) = value.as_str().and_then(embedded::expand) {
                return expr;
            }
        }

        render::value_expr(value, ty)
    }

    fn nested_expr(&mut self, object: &Object, value: &Value) -> Expr {
        if value.is_null() {
            return Expr::null();
        }

        match object.nesting_mode {
            NestingMode::Single | NestingMode::Group => self.nested_object_expr(object, value),
            NestingMode::List | NestingMode::Set => {
                let Some(elements) = value.elements() else {
                    self.mismatch(&object.implied_type().friendly_name(), value);
                    return Expr::null();
                };

                let mut exprs: Vec<Expr> = elements
                    .iter()
                    .enumerate()
                    .map(|(index, element)| {
                        self.at(format!("[{index}]"), |c| c.nested_object_expr(object, element))
                    })
                    .collect();
                if object.nesting_mode == NestingMode::Set {
                    exprs.sort_by_cached_key(|expr| expr.to_string());
                }
                Expr::Array(exprs)
            }
            NestingMode::Map => {
                let Some(entries) = value.entries() else {
                    self.mismatch(&object.implied_type().friendly_name(), value);
                    return Expr::null();
                };

                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();

                let mut body = Body::new();
                for key in keys {
                    let expr = self.at(format!("[{}]", key::quote(key)), |c| {
                        c.nested_object_expr(object, &entries[key])
                    });
                    body.push(Attribute::new(key, expr));
                }
                Expr::Object(body)
            }
        }
    }

    fn nested_object_expr(&mut self, object: &Object, value: &Value) -> Expr {
        if value.is_null() {
            return Expr::null();
        }
        if value.entries().is_none() {
            self.mismatch("object", value);
            return Expr::null();
        }

        Expr::Object(self.attributes_body(&object.attributes, value))
    }

    fn blocks(&mut self, body: &mut Body, name: &str, nested: &NestedBlock, value: &Value, marked: bool) {
        let mode = nested.nesting_mode;

        if value.is_null() && mode != NestingMode::Group {
            return;
        }
        if marked || value.is_marked() {
            tracing::debug!(path = %self.path(), "redacting sensitive block");
            body.push(sensitive_block(name));
            return;
        }

        match mode {
            NestingMode::Single | NestingMode::Group => {
                if let Some(block) = self.element_block(name, nested, value) {
                    body.push(block);
                }
            }
            NestingMode::List | NestingMode::Set => {
                let Some(elements) = value.elements() else {
                    self.mismatch(&format!("{mode} of blocks"), value);
                    return;
                };

                let mut blocks = Vec::with_capacity(elements.len());
                for (index, element) in elements.iter().enumerate() {
                    let block = self.at(format!("[{index}]"), |c| {
                        if element.is_null() {
                            c.warning("Null block", "null elements cannot be written as blocks and were left out");
                            None
                        } else if element.is_marked() {
                            Some(sensitive_block(name))
                        } else {
                            c.element_block(name, nested, element)
                        }
                    });
                    blocks.extend(block);
                }
                if mode == NestingMode::Set {
                    blocks.sort_by_cached_key(|block| block.to_string());
                }
                for block in blocks {
                    body.push(block);
                }
            }
            NestingMode::Map => {
                let Some(entries) = value.entries() else {
                    self.mismatch("map of blocks", value);
                    return;
                };

                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();

                for key in keys {
                    let element = &entries[key];
                    let block = self.at(format!("[{}]", key::quote(key)), |c| {
                        if element.is_null() {
                            c.warning("Null block", "null elements cannot be written as blocks and were left out");
                            None
                        } else if element.is_marked() {
                            Some(sensitive_block(name))
                        } else {
                            c.element_block(name, nested, element)
                        }
                    });
                    if let Some(block) = block {
                        body.push(block.with_label(key));
                    }
                }
            }
        }
    }

    /// One block for an object value, null counts as an object without values
    fn element_block(&mut self, name: &str, nested: &NestedBlock, value: &Value) -> Option<BodyBlock> {
        if !value.is_null() && value.entries().is_none() {
            self.mismatch("object", value);
            return None;
        }

        Some(BodyBlock::new(name, self.block_body(&nested.block, value, false)))
    }

    fn at<T>(&mut self, segment: String, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(segment);
        let result = f(self);
        self.path.pop();
        result
    }

    fn path(&self) -> String {
        let mut path = String::new();
        for segment in &self.path {
            if !path.is_empty() && !segment.starts_with('[') {
                path.push('.');
            }
            path.push_str(segment);
        }
        path
    }

    fn warning(&mut self, summary: &str, detail: impl Into<String>) {
        let path = self.path();
        self.diagnostics.warning(&path, summary, detail);
    }

    fn mismatch(&mut self, expected: &str, value: &Value) {
        self.warning(
            "Value does not match the schema",
            format!("expected {expected}, found {}", value.kind_name()),
        );
    }
}

fn sensitive_block(name: &str) -> BodyBlock {
    BodyBlock::new(name, Body::new()).with_comment(SENSITIVE_COMMENT)
}

fn template_attributes(attributes: &BTreeMap<String, SchemaAttribute>) -> Body {
    let mut body = Body::new();

    for (name, attribute) in attributes {
        if attribute.is_computed_only() {
            continue;
        }

        let expr = match &attribute.ty {
            AttributeType::Type(_) => Expr::null(),
            AttributeType::Nested(object) => template_object(object),
        };
        let constraint = if attribute.required {
            "REQUIRED"
        } else {
            "OPTIONAL"
        };
        let comment = format!("# {constraint} {}", attribute.implied_type().friendly_name());

        body.push(Attribute::new(name, expr).with_comment(comment));
    }

    body
}

fn template_object(object: &Object) -> Expr {
    let example = Expr::Object(template_attributes(&object.attributes));

    match object.nesting_mode {
        NestingMode::Single | NestingMode::Group => example,
        NestingMode::List | NestingMode::Set => Expr::Array(vec![example]),
        NestingMode::Map => Expr::Object(Body::from_iter([Attribute::new(TEMPLATE_KEY, example).into()])),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::schema::Attribute as A;
    use pretty_assertions::assert_eq;

    fn state(block: &Block, value: &Value) -> (String, Diagnostics) {
        let options = GenerateOptions::default();
        let mut composer = Composer::new(&options);
        let body = composer.state_body(block, value);
        (body.to_string(), composer.finish())
    }

    fn template(block: &Block) -> String {
        let options = GenerateOptions::default();
        Composer::new(&options).template_body(block).to_string()
    }

    fn nested(mode: NestingMode) -> NestedBlock {
        NestedBlock::new(mode, Block::new().with_attribute("v", A::optional(Type::String)))
    }

    fn element(v: &str) -> Value {
        Value::object([("v", Value::string(v))])
    }

    #[test]
    fn computed_only_attributes_with_values_are_kept_by_default() {
        let block = Block::new()
            .with_attribute("arn", A::computed(Type::String))
            .with_attribute("id", A::computed(Type::String));
        let value = Value::object([("id", Value::string("i-1")), ("arn", Value::null())]);

        assert_eq!(state(&block, &value).0, r#"id = "i-1""#);

        let options = GenerateOptions {
            computed: ComputedAttributes::Omit,
            ..GenerateOptions::default()
        };
        let mut composer = Composer::new(&options);
        assert!(composer.state_body(&block, &value).is_empty());
    }

    #[test]
    fn nesting_modes() {
        let block = Block::new()
            .with_block("group", nested(NestingMode::Group))
            .with_block("list", nested(NestingMode::List))
            .with_block("map", nested(NestingMode::Map))
            .with_block("set", nested(NestingMode::Set))
            .with_block("single", nested(NestingMode::Single));
        let value = Value::object([
            ("group", Value::null()),
            ("list", Value::list([element("b"), element("a")])),
            ("map", Value::map([("z z", element("1")), ("a", element("2"))])),
            ("set", Value::set([element("b"), element("a")])),
            ("single", Value::null()),
        ]);

        let expected = r#"
group {
  v = null
}
list {
  v = "b"
}
list {
  v = "a"
}
map a {
  v = "2"
}
map "z z" {
  v = "1"
}
set {
  v = "a"
}
set {
  v = "b"
}"#;
        let (text, diagnostics) = state(&block, &value);
        assert_eq!(text, expected.trim_start());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn nested_attribute_types() {
        let object = |mode| Object::new(mode).with_attribute("port", A::optional(Type::Number));
        let block = Block::new()
            .with_attribute("list", A::nested(object(NestingMode::List)))
            .with_attribute("map", A::nested(object(NestingMode::Map)))
            .with_attribute("set", A::nested(object(NestingMode::Set)))
            .with_attribute("single", A::nested(object(NestingMode::Single)));
        let port = |n: i64| Value::object([("port", Value::number(n))]);
        let value = Value::object([
            ("list", Value::list([port(2), port(1)])),
            ("map", Value::map([("web", port(80))])),
            ("set", Value::set([port(2), port(1)])),
            ("single", Value::object(Vec::<(String, Value)>::new())),
        ]);

        let expected = r#"
list = [
  {
    port = 2
  },
  {
    port = 1
  },
]
map = {
  web = {
    port = 80
  }
}
set = [
  {
    port = 1
  },
  {
    port = 2
  },
]
single = {
  port = null
}"#;
        assert_eq!(state(&block, &value).0, expected.trim_start());
    }

    #[test]
    fn marks_redact_whole_attributes_and_blocks() {
        let block = Block::new()
            .with_attribute("tags", A::optional(Type::map(Type::String)))
            .with_attribute("name", A::optional(Type::String))
            .with_block("list", nested(NestingMode::List))
            .with_block("map", nested(NestingMode::Map));
        let value = Value::object([
            (
                "tags",
                Value::map([("owner", Value::string("me")), ("secret", Value::string("hunter2").mark())]),
            ),
            ("name", Value::string("visible")),
            ("list", Value::list([element("shown"), element("hidden").mark()])),
            ("map", Value::map([("k", element("hidden"))]).mark()),
        ]);

        let expected = r#"
name = "visible"
tags = null # sensitive
list {
  v = "shown"
}
list {} # sensitive
map {}  # sensitive"#;
        let (text, _) = state(&block, &value);
        assert_eq!(text, expected.trim_start());
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("hidden"));
    }

    #[test]
    fn marked_resource_redacts_everything() {
        let block = Block::new()
            .with_attribute("name", A::optional(Type::String))
            .with_block("single", nested(NestingMode::Single));
        let value = Value::object([("name", Value::string("x")), ("single", element("y"))]).mark();

        assert_eq!(
            state(&block, &value).0,
            "name = null # sensitive\nsingle {}   # sensitive"
        );
    }

    #[test]
    fn mismatches_become_warnings() {
        let block = Block::new()
            .with_attribute("count", A::optional(Type::Number))
            .with_attribute("name", A::optional(Type::String))
            .with_block("list", nested(NestingMode::List));
        let value = Value::object([
            ("count", Value::string("not a number")),
            ("name", Value::string("x")),
            ("list", Value::list([Value::string("not an object"), Value::null()])),
            ("extra", Value::bool(true)),
        ]);

        let (text, diagnostics) = state(&block, &value);
        assert_eq!(text, "count = null\nname  = \"x\"");

        let found: Vec<_> = diagnostics
            .iter()
            .map(|d| (d.severity, d.summary.as_str(), d.path.as_deref()))
            .collect();
        assert_eq!(
            found,
            vec![
                (Severity::Warning, "Value not in schema", Some("extra")),
                (Severity::Warning, "Value does not match the schema", Some("count")),
                (Severity::Warning, "Value does not match the schema", Some("list[0]")),
                (Severity::Warning, "Null block", Some("list[1]")),
            ]
        );
    }

    #[test]
    fn json_strings_are_expanded_only_for_string_attributes() {
        let block = Block::new()
            .with_attribute("any", A::optional(Type::Dynamic))
            .with_attribute("list", A::optional(Type::list(Type::String)))
            .with_attribute("policy", A::optional(Type::String));
        let document = r#"{"a":1}"#;
        let value = Value::object([
            ("any", Value::string(document)),
            ("list", Value::list([Value::string(document)])),
            ("policy", Value::string(document)),
        ]);

        let expected = r#"
any  = "{\"a\":1}"
list = ["{\"a\":1}"]
policy = jsonencode({
  a = 1
})"#;
        assert_eq!(state(&block, &value).0, expected.trim_start());

        let options = GenerateOptions::default();
        let mut composer = Composer::identity(&options);
        let identity = Block::new().with_attribute("policy", A::optional(Type::String));
        assert_eq!(
            composer
                .state_body(&identity, &Value::object([("policy", Value::string(document))]))
                .to_string(),
            r#"policy = "{\"a\":1}""#
        );
    }

    #[test]
    fn templates() {
        let block = Block::new()
            .with_attribute("id", A::computed(Type::String))
            .with_attribute("name", A::required(Type::String))
            .with_attribute("tags", A::optional(Type::map(Type::String)).and_computed())
            .with_attribute(
                "rule",
                A::nested(Object::new(NestingMode::List).with_attribute("port", A::required(Type::Number))),
            )
            .with_block("by_key", nested(NestingMode::Map))
            .with_block("required", nested(NestingMode::List).with_items(1, 0));

        let expected = r#"
name = null # REQUIRED string
rule = [    # OPTIONAL list of object
  {
    port = null # REQUIRED number
  },
]
tags = null  # OPTIONAL map of string
by_key key { # OPTIONAL block
  v = null   # OPTIONAL string
}
required { # REQUIRED block
  v = null # OPTIONAL string
}"#;
        assert_eq!(template(&block), expected.trim_start());
    }
}
