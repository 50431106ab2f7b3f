//! rendered configuration
//!
//! The output of composing a schema against a value, before it is turned into text.
//!
//! - a [Body] is an ordered list of [Structure]s
//! - a structure is either an [Attribute] (`key = expression`) or a [Block]
//!   (identifier, labels and a nested body)
//! - an [Expr] is the right hand side of an attribute
//!
//! Keys and labels are stored in their final written form (quoted if needed). Bodies are
//! built once per generation and not modified afterwards; [crate::format] turns them into text.
use crate::key;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body(Vec<Structure>);

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, structure: impl Into<Structure>) {
        self.0.push(structure.into());
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Structure> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Body {
    type Item = &'a Structure;
    type IntoIter = std::slice::Iter<'a, Structure>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Body {
    type Item = Structure;
    type IntoIter = std::vec::IntoIter<Structure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Extend<Structure> for Body {
    fn extend<T: IntoIterator<Item = Structure>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl FromIterator<Structure> for Body {
    fn from_iter<T: IntoIterator<Item = Structure>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Structure {
    Attribute(Attribute),
    Block(Block),
}

impl From<Attribute> for Structure {
    fn from(value: Attribute) -> Self {
        Structure::Attribute(value)
    }
}

impl From<Block> for Structure {
    fn from(value: Block) -> Self {
        Structure::Block(value)
    }
}

/// `key = expression`, optionally followed by a line comment
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub expr: Expr,
    pub comment: Option<String>,
}

impl Attribute {
    /// Quotes `name` if it is not a bare identifier
    pub fn new(name: &str, expr: Expr) -> Self {
        Self {
            key: key::key(name),
            expr,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub ident: String,
    pub labels: Vec<String>,
    pub body: Body,
    /// Comment on the line that opens the block
    pub comment: Option<String>,
}

impl Block {
    pub fn new(ident: impl Into<String>, body: Body) -> Self {
        Self {
            ident: ident.into(),
            labels: Vec::new(),
            body,
            comment: None,
        }
    }

    /// Adds a label, bare if possible
    pub fn with_label(mut self, label: &str) -> Self {
        self.labels.push(key::key(label));
        self
    }

    /// Adds a label that is always quoted
    pub fn with_quoted_label(mut self, label: &str) -> Self {
        self.labels.push(key::quote(label));
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal or traversal written as-is (`null`, `42`, `"text"`, `aws.west`)
    Raw(String),
    /// `[a, b]` on one line when every element is simple, one element per line otherwise
    Array(Vec<Expr>),
    /// `{ key = value ... }`, always multi-line unless empty
    Object(Body),
    /// `function(arg)`
    Call { function: String, arg: Box<Expr> },
}

impl Expr {
    pub fn null() -> Self {
        Expr::Raw("null".to_string())
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Expr::Raw(text.into())
    }

    pub fn call(function: impl Into<String>, arg: Expr) -> Self {
        Expr::Call {
            function: function.into(),
            arg: Box::new(arg),
        }
    }

    /// Whether the expression fits on the line of its attribute
    pub fn is_simple(&self) -> bool {
        match self {
            Expr::Raw(_) => true,
            Expr::Array(elements) => elements.iter().all(Expr::is_simple),
            Expr::Object(body) => body.is_empty(),
            Expr::Call { arg, .. } => arg.is_simple(),
        }
    }
}
