//! Shared intermediate representation for the sdkgen pipeline.
//!
//! This crate contains the language-neutral records produced by the parser and
//! consumed by every downstream stage (collector, generators, validator).
//! It has no behaviour beyond small accessors.

pub mod ir;
pub mod validation;

// Re-export commonly used types
pub use ir::{
    DefinitionKind, DiscriminatedUnion, EventInfo, GeneratedCode, ParsedApi, ParsedParameter,
    ParsedProperty, ParsedType, ParsedTypeDefinition, TypeKind,
};
pub use validation::{ValidationError, ValidationErrorKind, ValidationResult};

/// Capitalize the first character of an identifier (`getItem` -> `GetItem`).
pub fn to_pascal_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}
