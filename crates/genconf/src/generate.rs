//! declarations
//!
//! Entry points that turn a schema plus state into complete declarations:
//! - [generate_resource]: one `resource` (or `data`) block
//! - [generate_import]: one `import` block targeting a resource by identity
//! - [generate_list_resources]: a resource and an import block for every instance found by a
//!   bulk read, named `<name>_0`, `<name>_1`, ...
//!
//! Every generated declaration is parsed back before it is returned. Text that does not parse
//! is still returned, with a warning.
use crate::address::{ProviderRef, ResourceAddress};
use crate::body::{Attribute, Block, Body, Expr};
use crate::compose::Composer;
use crate::diagnostics::Diagnostics;
use crate::key;
use crate::options::GenerateOptions;
use crate::schema;
use crate::value::Value;
use std::fmt::{Display, Formatter};

/// Generated output and the problems found while generating it
#[derive(Debug, Clone, PartialEq)]
pub struct Generated<T> {
    pub output: T,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub addr: ResourceAddress,
    block: Block,
}

impl Resource {
    pub fn new(addr: ResourceAddress, body: Body) -> Self {
        let block = Block::new(addr.mode.keyword(), body)
            .with_quoted_label(&addr.resource_type)
            .with_quoted_label(&addr.name);
        Self { addr, block }
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.block.fmt(f)
    }
}

/// What an import block identifies its resource by
#[derive(Debug, Clone, PartialEq)]
pub enum ImportTarget {
    Identity(Body),
    Id(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportBlock {
    pub to: ResourceAddress,
    pub provider: ProviderRef,
    pub target: ImportTarget,
}

impl ImportBlock {
    /// Import by the resource's import ID
    pub fn by_id(to: ResourceAddress, provider: ProviderRef, id: impl Into<String>) -> Self {
        Self {
            to,
            provider,
            target: ImportTarget::Id(id.into()),
        }
    }

    fn block(&self) -> Block {
        let mut body = Body::new();
        body.push(Attribute::new("to", Expr::raw(self.to.to_string())));
        body.push(Attribute::new("provider", Expr::raw(self.provider.to_string())));
        body.push(match &self.target {
            ImportTarget::Identity(identity) => Attribute::new("identity", Expr::Object(identity.clone())),
            ImportTarget::Id(id) => Attribute::new("id", Expr::raw(key::quote(id))),
        });

        Block::new("import", body)
    }
}

impl Display for ImportBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.block().fmt(f)
    }
}

/// One instance of a bulk read
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    /// Without state the resource is written as a template
    pub state: Option<Value>,
    pub identity: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListResourceElement {
    pub addr: ResourceAddress,
    pub config: Resource,
    pub import: ImportBlock,
}

impl Display for ListResourceElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.config)?;
        writeln!(f, "{}", self.import)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListResourceContents {
    pub results: Vec<ListResourceElement>,
}

impl Display for ListResourceContents {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, element) in self.results.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            element.fmt(f)?;
        }
        Ok(())
    }
}

/// Generates the declaration of one resource
///
/// Without `state` the declaration is a template listing every settable attribute and nested
/// block. The `provider` line is written when `provider` is not the one the resource type
/// implies, or when [GenerateOptions::force_provider] is set.
///
/// Fails only for an empty schema. Any other problem is reported in
/// [Generated::diagnostics] next to the best-effort output.
#[tracing::instrument(level = "debug", skip_all, fields(address = %addr))]
pub fn generate_resource(
    addr: &ResourceAddress,
    schema: &schema::Block,
    provider: &ProviderRef,
    state: Option<&Value>,
    options: &GenerateOptions,
) -> Result<Generated<Resource>, Diagnostics> {
    ensure_schema(schema, "resource")?;

    let mut body = Body::new();
    if options.force_provider || !provider.is_implied_for(addr) {
        body.push(Attribute::new("provider", Expr::raw(provider.to_string())));
    }

    let mut composer = Composer::new(options);
    body.extend(match state {
        Some(state) => composer.state_body(schema, state),
        None => {
            tracing::debug!("no state, writing template");
            composer.template_body(schema)
        }
    });

    let resource = Resource::new(addr.clone(), body);
    let mut diagnostics = composer.finish();
    self_check(&resource.to_string(), &mut diagnostics);

    Ok(Generated {
        output: resource,
        diagnostics,
    })
}

/// Generates an import block that finds `to` by its identity
#[tracing::instrument(level = "debug", skip_all, fields(address = %to))]
pub fn generate_import(
    to: &ResourceAddress,
    identity_schema: &schema::Block,
    provider: &ProviderRef,
    identity: &Value,
    options: &GenerateOptions,
) -> Result<Generated<ImportBlock>, Diagnostics> {
    ensure_schema(identity_schema, "identity")?;

    let mut composer = Composer::identity(options);
    let import = ImportBlock {
        to: to.clone(),
        provider: provider.clone(),
        target: ImportTarget::Identity(composer.state_body(identity_schema, identity)),
    };

    let mut diagnostics = composer.finish();
    self_check(&import.to_string(), &mut diagnostics);

    Ok(Generated {
        output: import,
        diagnostics,
    })
}

/// Generates a resource and an import block for every entry, in order
///
/// Entry `i` is named `<name>_<i>`. The provider is always written. No entries give empty
/// contents.
#[tracing::instrument(level = "debug", skip_all, fields(address = %addr, entries = entries.len()))]
pub fn generate_list_resources(
    addr: &ResourceAddress,
    schema: &schema::Block,
    identity_schema: &schema::Block,
    provider: &ProviderRef,
    entries: &[ListEntry],
    options: &GenerateOptions,
) -> Result<Generated<ListResourceContents>, Diagnostics> {
    let mut contents = ListResourceContents::default();
    let mut diagnostics = Diagnostics::new();
    if entries.is_empty() {
        return Ok(Generated {
            output: contents,
            diagnostics,
        });
    }

    let options = GenerateOptions {
        force_provider: true,
        ..options.clone()
    };

    for (index, entry) in entries.iter().enumerate() {
        let instance = addr.with_name_suffix(index);

        let config = generate_resource(&instance, schema, provider, entry.state.as_ref(), &options)?;
        let import = generate_import(&instance, identity_schema, provider, &entry.identity, &options)?;
        diagnostics.extend(config.diagnostics);
        diagnostics.extend(import.diagnostics);

        contents.results.push(ListResourceElement {
            addr: instance,
            config: config.output,
            import: import.output,
        });
    }

    Ok(Generated {
        output: contents,
        diagnostics,
    })
}

fn ensure_schema(schema: &schema::Block, kind: &str) -> Result<(), Diagnostics> {
    if !schema.is_empty() {
        return Ok(());
    }

    let mut diagnostics = Diagnostics::new();
    diagnostics.error(
        format!("Empty {kind} schema"),
        "the schema has neither attributes nor nested blocks, nothing can be generated",
    );
    Err(diagnostics)
}

fn self_check(text: &str, diagnostics: &mut Diagnostics) {
    if let Err(error) = hcl_edit::parser::parse_body(text) {
        diagnostics.warning(
            "",
            "Generated configuration does not parse",
            error.to_string(),
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::{Attribute as A, Block as SchemaBlock};
    use crate::types::Type;
    use pretty_assertions::assert_eq;

    fn schema() -> SchemaBlock {
        SchemaBlock::new().with_attribute("name", A::optional(Type::String))
    }

    #[test]
    fn empty_schema_is_an_error() {
        let addr = ResourceAddress::new("aws_instance", "x");
        let result = generate_resource(
            &addr,
            &SchemaBlock::new(),
            &ProviderRef::new("aws"),
            None,
            &GenerateOptions::default(),
        );

        let diagnostics = result.unwrap_err();
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn data_resources() {
        let addr = ResourceAddress::new("aws_ami", "ubuntu").with_mode(crate::address::ResourceMode::Data);
        let generated = generate_resource(
            &addr,
            &schema(),
            &ProviderRef::new("aws"),
            Some(&Value::object([("name", Value::string("jammy"))])),
            &GenerateOptions::default(),
        )
        .unwrap();

        assert_eq!(
            generated.output.to_string(),
            "data \"aws_ami\" \"ubuntu\" {\n  name = \"jammy\"\n}"
        );
        assert!(generated.diagnostics.is_empty());
    }

    #[test]
    fn forced_provider() {
        let addr = ResourceAddress::new("aws_instance", "x");
        let options = GenerateOptions {
            force_provider: true,
            ..GenerateOptions::default()
        };
        let generated = generate_resource(
            &addr,
            &schema(),
            &ProviderRef::new("aws"),
            Some(&Value::object([("name", Value::string("n"))])),
            &options,
        )
        .unwrap();

        assert_eq!(
            generated.output.to_string(),
            "resource \"aws_instance\" \"x\" {\n  provider = aws\n  name     = \"n\"\n}"
        );
    }

    #[test]
    fn import_by_id() {
        let import = ImportBlock::by_id(
            "module.m.aws_instance.x".parse().unwrap(),
            ProviderRef::new("aws").with_alias("west"),
            "i-12345",
        );

        let expected = r#"
import {
  to       = module.m.aws_instance.x
  provider = aws.west
  id       = "i-12345"
}"#;
        assert_eq!(import.to_string(), expected.trim_start());
    }

    #[test]
    fn no_entries_no_output() {
        let generated = generate_list_resources(
            &ResourceAddress::new("aws_instance", "x"),
            &schema(),
            &SchemaBlock::new(),
            &ProviderRef::new("aws"),
            &[],
            &GenerateOptions::default(),
        )
        .unwrap();

        assert_eq!(generated.output.to_string(), "");
        assert!(generated.diagnostics.is_empty());
    }
}
