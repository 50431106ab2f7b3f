//! generation options
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Always write the `provider = ...` line
    pub force_provider: bool,
    pub computed: ComputedAttributes,
    /// Write strings holding JSON objects or arrays as `jsonencode(...)`
    pub expand_json_strings: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            force_provider: false,
            computed: ComputedAttributes::default(),
            expand_json_strings: true,
        }
    }
}

/// Handling of attributes that are computed and cannot be set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputedAttributes {
    /// Written only when they hold a value
    #[default]
    OmitNull,
    /// Never written
    Omit,
}
