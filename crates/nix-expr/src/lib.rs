#![doc = include_str!("../README.md")]

mod config;
mod convert;
mod error;
mod format;
pub mod identifier;
pub mod node;
mod value;

pub use config::{Config, FormatConfig, NewlineStyle};
pub use convert::{to_node, to_node_with_config};
pub use error::Error;
pub use node::{
    ArgSpec, Assert, AttrReference, AttrSet, Float, Formal, FunInvocation, Function, If, Inherit,
    Let, MergeAttrs, NixPath, Node, Url, With,
};
pub use value::Value;

/// Convert a native value and print it with default layout.
pub fn to_string(value: &Value) -> Result<String> {
    Ok(to_node(value)?.to_nix())
}

/// Convert a native value and print it with a custom layout.
pub fn to_string_with_config(value: &Value, config: &FormatConfig) -> Result<String> {
    Ok(to_node(value)?.to_expr(0, config))
}


/// Result type for nix-expr operations
pub type Result<T> = std::result::Result<T, Error>;
