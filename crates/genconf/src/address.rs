//! resource addresses and provider references
//!
//! ```text
//! aws_instance.web
//! aws_instance.web[0]
//! module.network["eu"].aws_subnet.private
//! data.aws_ami.ubuntu
//! ```
use crate::key;
use hcl_edit::expr::{Expression, TraversalOperator};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResourceMode {
    #[default]
    Managed,
    Data,
}

impl ResourceMode {
    /// Block type of declarations in this mode
    pub fn keyword(self) -> &'static str {
        match self {
            ResourceMode::Managed => "resource",
            ResourceMode::Data => "data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceKey {
    Int(u64),
    Str(String),
}

impl Display for InstanceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceKey::Int(index) => write!(f, "[{index}]"),
            InstanceKey::Str(key) => write!(f, "[{}]", key::quote(key)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleStep {
    pub name: String,
    pub key: Option<InstanceKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceAddress {
    pub module: Vec<ModuleStep>,
    pub mode: ResourceMode,
    pub resource_type: String,
    pub name: String,
    pub key: Option<InstanceKey>,
}

impl ResourceAddress {
    /// Managed resource in the root module
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: Vec::new(),
            mode: ResourceMode::Managed,
            resource_type: resource_type.into(),
            name: name.into(),
            key: None,
        }
    }

    pub fn with_mode(mut self, mode: ResourceMode) -> Self {
        self.mode = mode;
        self
    }

    /// Local name of the provider a resource of this type uses when none is given
    ///
    /// This is the resource type up to the first underscore.
    pub fn implied_provider(&self) -> &str {
        match self.resource_type.split_once('_') {
            Some((prefix, _)) => prefix,
            None => &self.resource_type,
        }
    }

    /// Same address with `_<index>` appended to the name
    pub fn with_name_suffix(&self, index: usize) -> Self {
        Self {
            name: format!("{}_{index}", self.name),
            ..self.clone()
        }
    }
}

impl Display for ResourceAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for step in &self.module {
            write!(f, "module.{}", step.name)?;
            if let Some(key) = &step.key {
                write!(f, "{key}")?;
            }
            f.write_str(".")?;
        }
        if self.mode == ResourceMode::Data {
            f.write_str("data.")?;
        }
        write!(f, "{}.{}", self.resource_type, self.name)?;
        if let Some(key) = &self.key {
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

impl FromStr for ResourceAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut steps = Steps::parse(s)?;
        let mut module = Vec::new();

        loop {
            let ident = steps.name("name")?;
            if ident == "module" {
                let name = steps.name("module name")?;
                let key = steps.key();
                module.push(ModuleStep { name, key });
                continue;
            }

            let (mode, resource_type) = if ident == "data" {
                (ResourceMode::Data, steps.name("resource type")?)
            } else {
                (ResourceMode::Managed, ident)
            };
            let name = steps.name("resource name")?;
            let key = steps.key();
            steps.end()?;

            return Ok(Self {
                module,
                mode,
                resource_type,
                name,
                key,
            });
        }
    }
}

/// Provider configuration a resource is associated with: `aws` or `aws.west`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRef {
    pub local_name: String,
    pub alias: Option<String>,
}

impl ProviderRef {
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Whether `addr` would be associated with this provider without saying so
    pub fn is_implied_for(&self, addr: &ResourceAddress) -> bool {
        self.alias.is_none() && self.local_name == addr.implied_provider()
    }
}

impl Display for ProviderRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.local_name)?;
        if let Some(alias) = &self.alias {
            write!(f, ".{alias}")?;
        }
        Ok(())
    }
}

impl FromStr for ProviderRef {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut steps = Steps::parse(s)?;
        let local_name = steps.name("provider name")?;
        let alias = if steps.is_done() {
            None
        } else {
            Some(steps.name("provider alias")?)
        };
        steps.end()?;

        Ok(Self { local_name, alias })
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AddressError {
    #[error("invalid address `{input}`: {message} at offset {offset}")]
    Syntax {
        input: String,
        message: String,
        offset: usize,
    },
    #[error("invalid address `{input}`: expected {expected}")]
    Unexpected {
        input: String,
        expected: &'static str,
    },
}

enum Step {
    Name(String),
    Key(InstanceKey),
}

/// An address parsed as an HCL traversal, flattened into names and instance keys
struct Steps<'a> {
    input: &'a str,
    steps: std::iter::Peekable<std::vec::IntoIter<Step>>,
}

impl<'a> Steps<'a> {
    fn parse(input: &'a str) -> Result<Self, AddressError> {
        let expr = hcl_edit::parser::parse_expr(input).map_err(|err| AddressError::Syntax {
            input: input.to_string(),
            message: err.message().to_string(),
            offset: err.location().offset(),
        })?;

        let mut steps = Self {
            input,
            steps: Vec::new().into_iter().peekable(),
        };
        let flat = match &expr {
            Expression::Variable(ident) => vec![Step::Name(ident.as_str().to_string())],
            Expression::Traversal(traversal) => {
                let Expression::Variable(root) = &traversal.expr else {
                    return Err(steps.unexpected("name"));
                };
                let mut flat = vec![Step::Name(root.as_str().to_string())];
                for operator in &traversal.operators {
                    flat.push(steps.step(operator.value())?);
                }
                flat
            }
            _ => return Err(steps.unexpected("name")),
        };

        steps.steps = flat.into_iter().peekable();
        Ok(steps)
    }

    fn step(&self, operator: &TraversalOperator) -> Result<Step, AddressError> {
        let key = match operator {
            TraversalOperator::GetAttr(ident) => return Ok(Step::Name(ident.as_str().to_string())),
            TraversalOperator::LegacyIndex(index) => InstanceKey::Int(*index.value()),
            TraversalOperator::Index(Expression::Number(number)) => match number.as_u64() {
                Some(index) => InstanceKey::Int(index),
                None => return Err(self.unexpected("instance key")),
            },
            TraversalOperator::Index(Expression::String(key)) => {
                InstanceKey::Str(key.value().clone())
            }
            _ => return Err(self.unexpected("instance key")),
        };

        Ok(Step::Key(key))
    }

    fn unexpected(&self, expected: &'static str) -> AddressError {
        AddressError::Unexpected {
            input: self.input.to_string(),
            expected,
        }
    }

    fn name(&mut self, expected: &'static str) -> Result<String, AddressError> {
        match self.steps.next() {
            Some(Step::Name(name)) => Ok(name),
            _ => Err(self.unexpected(expected)),
        }
    }

    fn key(&mut self) -> Option<InstanceKey> {
        match self.steps.next_if(|step| matches!(step, Step::Key(_)))? {
            Step::Key(key) => Some(key),
            Step::Name(_) => None,
        }
    }

    fn is_done(&mut self) -> bool {
        self.steps.peek().is_none()
    }

    fn end(&mut self) -> Result<(), AddressError> {
        if self.is_done() {
            Ok(())
        } else {
            Err(self.unexpected("end of address"))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_and_display() {
        for input in [
            "aws_instance.web",
            "aws_instance.web[0]",
            r#"aws_instance.web["a.b"]"#,
            "data.aws_ami.ubuntu",
            r#"module.network["eu"].module.subnets[2].aws_subnet.private-a"#,
        ] {
            let addr: ResourceAddress = input.parse().unwrap();
            assert_eq!(addr.to_string(), input);
        }
    }

    #[test]
    fn parsed_parts() {
        let addr: ResourceAddress = r#"module.a[1].data.aws_ami.x["k"]"#.parse().unwrap();
        assert_eq!(
            addr,
            ResourceAddress {
                module: vec![ModuleStep {
                    name: "a".into(),
                    key: Some(InstanceKey::Int(1)),
                }],
                mode: ResourceMode::Data,
                resource_type: "aws_ami".into(),
                name: "x".into(),
                key: Some(InstanceKey::Str("k".into())),
            }
        );
    }

    #[test]
    fn invalid_addresses() {
        for input in ["", "aws_instance", "aws_instance.", "aws_instance.x[", "aws_instance.x[a]", "a.b.c", "1a.b"] {
            assert!(input.parse::<ResourceAddress>().is_err(), "{input}");
        }

        assert!(matches!(
            "aws_instance.x y".parse::<ResourceAddress>(),
            Err(AddressError::Syntax { .. })
        ));
        assert_eq!(
            "aws_instance.x.y".parse::<ResourceAddress>(),
            Err(AddressError::Unexpected {
                input: "aws_instance.x.y".into(),
                expected: "end of address",
            })
        );
        assert_eq!(
            "aws_instance.x[a]".parse::<ResourceAddress>(),
            Err(AddressError::Unexpected {
                input: "aws_instance.x[a]".into(),
                expected: "instance key",
            })
        );
    }

    #[test]
    fn string_keys_survive_display_and_parse() {
        for key in ["${a}", "%{ if x }", "a\"b\\c", "line\nbreak", "tab\there", "bell\u{7}"] {
            let addr = ResourceAddress {
                module: vec![ModuleStep {
                    name: "m".into(),
                    key: Some(InstanceKey::Str(key.into())),
                }],
                key: Some(InstanceKey::Str(key.into())),
                ..ResourceAddress::new("aws_instance", "x")
            };

            let back: ResourceAddress = addr.to_string().parse().unwrap();
            assert_eq!(back, addr, "{key:?}");
        }
    }

    #[test]
    fn legacy_index() {
        let addr: ResourceAddress = "aws_instance.x.0".parse().unwrap();
        assert_eq!(addr.key, Some(InstanceKey::Int(0)));
    }

    #[test]
    fn implied_provider() {
        assert_eq!(ResourceAddress::new("aws_instance", "x").implied_provider(), "aws");
        assert_eq!(
            ResourceAddress::new("tfcoremock_simple_resource", "x").implied_provider(),
            "tfcoremock"
        );
        assert_eq!(ResourceAddress::new("null", "x").implied_provider(), "null");
    }

    #[test]
    fn name_suffix_keeps_everything_else() {
        let addr: ResourceAddress = "module.m.aws_instance.example".parse().unwrap();
        assert_eq!(
            addr.with_name_suffix(3).to_string(),
            "module.m.aws_instance.example_3"
        );
    }

    #[test]
    fn provider_refs() {
        let plain: ProviderRef = "aws".parse().unwrap();
        assert_eq!(plain, ProviderRef::new("aws"));

        let aliased: ProviderRef = "aws.west".parse().unwrap();
        assert_eq!(aliased, ProviderRef::new("aws").with_alias("west"));
        assert_eq!(aliased.to_string(), "aws.west");

        assert!("aws.".parse::<ProviderRef>().is_err());
        assert!("aws.west.x".parse::<ProviderRef>().is_err());

        let addr = ResourceAddress::new("aws_instance", "x");
        assert!(plain.is_implied_for(&addr));
        assert!(!aliased.is_implied_for(&addr));
        assert!(!ProviderRef::new("mock").is_implied_for(&addr));
    }
}
