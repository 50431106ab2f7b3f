//! # genconf - configuration from state
//!
//! Generates HCL configuration for resources that already exist: given the schema of a
//! resource type and the state of one (or many) resources, write the `resource` block that
//! would describe them, plus `import` blocks to adopt them.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `genconf` works internally.
//!
//! ### Inputs
//!
//! - a schema ([schema::Block]): attributes (with a [types::Type] or a nested object
//!   definition) and nested block types (with a [schema::NestingMode] and a schema of their own)
//! - a value ([value::Value]): the state, usually loaded from JSON with [value::Value::from_json]
//!   and [value::Value::apply_sensitive_values]. Every node of a value may carry a sensitivity
//!   mark.
//! - an address ([address::ResourceAddress]) and a provider ([address::ProviderRef])
//!
//! ### Composing
//!
//! see [compose::Composer]
//!
//! The schema is walked in lexicographic order and every attribute and nested block is looked
//! up in the value. The result is a [body::Body]: a tree of attributes (`key = expression`) and
//! blocks, not text yet.
//!
//! Along the way:
//! - values are turned into expressions by [render::value_expr]
//! - strings holding JSON objects or arrays become `jsonencode(...)` ([embedded])
//! - anything sensitive becomes `null # sensitive`
//! - values that do not fit the schema are recorded in [diagnostics::Diagnostics] and written
//!   as `null` (or left out)
//!
//! **Example**
//!
//! ```hcl
//! resource "aws_instance" "web" {
//!   provider = aws.west
//!   name     = "web"
//!   policy = jsonencode({
//!     Version = "2012-10-17"
//!   })
//!   password = null # sensitive
//!   network_interface {
//!     subnet_id = "subnet-123"
//!   }
//! }
//! ```
//!
//! ### Formatting
//!
//! see the `format` module
//!
//! Bodies are flattened into lines. Runs of single-line attributes align their `=`, trailing
//! comments of consecutive lines align their `#`.
//!
//! ### Declarations
//!
//! see [generate]
//!
//! [generate::generate_resource] wraps a body into a `resource` block,
//! [generate::generate_list_resources] does so for every instance of a bulk read and pairs each
//! one with an `import` block. The text is parsed with [hcl_edit] before it is handed out.
//!
pub mod address;
pub mod body;
pub mod compose;
pub mod diagnostics;
pub mod embedded;
mod format;
pub mod generate;
pub mod key;
pub mod options;
pub mod render;
pub mod schema;
pub mod types;
pub mod value;

pub use address::{ProviderRef, ResourceAddress};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use generate::{
    generate_import, generate_list_resources, generate_resource, Generated, ImportBlock,
    ListEntry, ListResourceContents, Resource,
};
pub use options::{ComputedAttributes, GenerateOptions};
pub use value::Value;
