//! Type collection for one generation run.
//!
//! [`GenerationContext`] maps IR types to C# type names and records every
//! nested class, enum and result wrapper the mapping needs. Anonymous object
//! shapes are deduplicated by structural fingerprint, so identical shapes
//! share one class no matter how many APIs use them. The context is created
//! per run and threaded through every collector and generator call.

mod callback;
mod fingerprint;
mod support;

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use sdkgen_common::{
    DefinitionKind, DiscriminatedUnion, ParsedProperty, ParsedType, ParsedTypeDefinition,
    TypeKind, to_pascal_case,
};
use tracing::warn;

pub use callback::{CallbackPattern, CallbackShape, callback_pattern, classify_callback, subscription_payload};
pub use fingerprint::fingerprint;
pub use support::check_supported;

/// Nesting depth past which a type is emitted as `object`.
pub const MAX_DEPTH: usize = 8;

static VALUE_TYPES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "int", "double", "float", "bool", "long", "short", "byte", "char", "decimal", "DateTime",
    ]
    .into_iter()
    .collect()
});

// =============================================================================
// Registry records
// =============================================================================

/// Output file a nested type belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Owner {
    /// Named corpus types, emitted once in `AIT.Types.cs`.
    Shared,
    /// Types first needed by an API of this category.
    Category(String),
}

/// One field of a generated class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsField {
    /// Property name on the wire.
    pub json_name: String,
    /// C# member name.
    pub name: String,
    /// C# type.
    pub ty: String,
    /// The source property was optional.
    pub optional: bool,
    /// Field documentation.
    pub description: Option<String>,
    /// Delegate-typed fields are not serialized.
    pub ignore: bool,
}

/// One enum member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsEnumMember {
    /// C# identifier.
    pub name: String,
    /// Wire value.
    pub value: String,
}

/// Payload of a [`NestedType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NestedKind {
    /// A serializable class.
    Class {
        /// Ordered fields.
        fields: Vec<CsField>,
    },
    /// A string enum.
    Enum {
        /// Ordered, deduplicated members.
        members: Vec<CsEnumMember>,
    },
    /// A success-or-error-code wrapper.
    Result {
        /// C# type of the success payload.
        success: String,
        /// Name of the error code enum.
        error_code: String,
    },
}

/// A type the generated code declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedType {
    /// C# type name, unique in a run.
    pub name: String,
    /// Output file.
    pub owner: Owner,
    /// Type documentation.
    pub description: Option<String>,
    /// Shape.
    pub kind: NestedKind,
}

/// How a value crosses the WebGL boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marshal {
    /// No value.
    Void,
    /// UTF-8 string.
    String,
    /// Boolean.
    Bool,
    /// Number.
    Double,
    /// String enum value.
    Enum,
    /// JSON text.
    Json,
}

// =============================================================================
// Context
// =============================================================================

/// Caches and registries for one generation run.
#[derive(Debug, Default)]
pub struct GenerationContext {
    /// Structural fingerprint to class name.
    inline_types: HashMap<String, String>,
    nested: Vec<NestedType>,
    by_name: HashMap<String, usize>,
    descriptions: HashMap<String, String>,
    in_progress: Vec<String>,
    diagnostics: Vec<String>,
}

impl GenerationContext {
    /// Create a context that knows the corpus' named type definitions.
    pub fn new(definitions: &[ParsedTypeDefinition]) -> Self {
        let mut descriptions = HashMap::new();
        for definition in definitions {
            if let Some(description) = &definition.description {
                descriptions
                    .entry(type_identifier(&definition.name))
                    .or_insert_with(|| description.clone());
            }
        }
        let mut context = Self {
            descriptions,
            ..Self::default()
        };
        // Enum definitions are emitted even when only referenced by name
        for definition in definitions {
            if let DefinitionKind::Enum { values } = &definition.kind {
                let values: Vec<&str> = values.iter().map(String::as_str).collect();
                context.enum_type(&type_identifier(&definition.name), &values, &Owner::Shared);
            }
        }
        context
    }

    /// C# type for `ty`, registering whatever nested types it needs.
    ///
    /// `hint` names anonymous shapes (`<Parent><Property>`); `owner` is the
    /// output file of newly registered anonymous types.
    pub fn csharp_type(&mut self, ty: &ParsedType, hint: &str, owner: &Owner) -> String {
        self.map(ty, hint, owner, 0)
    }

    /// C# type of an API's resolved value (`void` for no payload).
    ///
    /// Anonymous payloads are named `<api>Result`, discriminated unions get a
    /// `<api>Result` wrapper and a `<api>ErrorCode` enum.
    pub fn return_type(&mut self, api_pascal: &str, ty: &ParsedType, owner: &Owner) -> String {
        let inner = ty.unwrap_promise();
        if inner.is_void() {
            return "void".to_string();
        }
        if let Some(discriminated) = inner.discriminated() {
            return self.result_type(api_pascal, discriminated, owner, 0);
        }
        self.map(inner, &format!("{api_pascal}Result"), owner, 0)
    }

    /// Every registered type in registration order.
    pub fn nested_types(&self) -> &[NestedType] {
        &self.nested
    }

    /// Types emitted into one output file.
    pub fn types_for<'a>(&'a self, owner: &'a Owner) -> impl Iterator<Item = &'a NestedType> {
        self.nested.iter().filter(move |t| &t.owner == owner)
    }

    /// Look up a registered type.
    pub fn get(&self, name: &str) -> Option<&NestedType> {
        self.by_name.get(name).map(|&i| &self.nested[i])
    }

    /// Whether `name` is a generated enum.
    pub fn is_enum(&self, name: &str) -> bool {
        self.get(name.trim_end_matches('?'))
            .is_some_and(|t| matches!(t.kind, NestedKind::Enum { .. }))
    }

    /// Whether values of `cs_type` are C# value types.
    pub fn is_value_type(&self, cs_type: &str) -> bool {
        VALUE_TYPES.contains(cs_type) || self.is_enum(cs_type)
    }

    /// Boundary encoding for values of `cs_type`.
    pub fn marshal(&self, cs_type: &str) -> Marshal {
        match cs_type.trim_end_matches('?') {
            "void" => Marshal::Void,
            "string" => Marshal::String,
            "bool" => Marshal::Bool,
            "double" | "int" | "float" | "long" => Marshal::Double,
            other if self.is_enum(other) => Marshal::Enum,
            _ => Marshal::Json,
        }
    }

    /// Non-fatal problems found while collecting.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    fn diagnose(&mut self, message: String) {
        warn!("{message}");
        if !self.diagnostics.contains(&message) {
            self.diagnostics.push(message);
        }
    }

    // =========================================================================
    // Mapping
    // =========================================================================

    fn map(&mut self, ty: &ParsedType, hint: &str, owner: &Owner, depth: usize) -> String {
        if depth > MAX_DEPTH {
            self.diagnose(format!(
                "type '{}' at {hint} is nested deeper than {MAX_DEPTH} levels; emitted as object",
                ty.raw
            ));
            return "object".to_string();
        }
        let mapped = match &ty.kind {
            TypeKind::Primitive => primitive(&ty.name).to_string(),
            TypeKind::Unknown => "object".to_string(),
            TypeKind::Promise { resolved } => self.map(resolved, hint, owner, depth + 1),
            TypeKind::Array { element } => {
                let element = self.map(element, &singular(hint), owner, depth + 1);
                format!("{element}[]")
            }
            TypeKind::Record { key, value } => {
                let key = self.map(key, &format!("{hint}Key"), owner, depth + 1);
                let value = match &value.kind {
                    TypeKind::Union { .. } => "object".to_string(),
                    TypeKind::Primitive if value.name == "never" => "object".to_string(),
                    _ => self.map(value, &format!("{hint}Value"), owner, depth + 1),
                };
                format!("Dictionary<{key}, {value}>")
            }
            TypeKind::Function { params, .. } => {
                let args: Vec<String> = params
                    .iter()
                    .filter(|p| !p.ty.is_void())
                    .map(|p| {
                        let hint = format!("{hint}{}", to_pascal_case(&identifier(&p.name)));
                        self.map(&p.ty, &hint, owner, depth + 1)
                    })
                    .collect();
                if args.is_empty() {
                    "System.Action".to_string()
                } else {
                    format!("System.Action<{}>", args.join(", "))
                }
            }
            TypeKind::Object { properties } => self.object(ty, properties, hint, owner, depth),
            TypeKind::Union {
                members,
                discriminated,
            } => match discriminated {
                Some(d) => self.result_type(hint, d, owner, depth),
                None => self.union(ty, members, hint, owner, depth),
            },
        };
        if ty.nullable && self.is_value_type(&mapped) {
            format!("{mapped}?")
        } else {
            mapped
        }
    }

    fn object(
        &mut self,
        ty: &ParsedType,
        properties: &[ParsedProperty],
        hint: &str,
        owner: &Owner,
        depth: usize,
    ) -> String {
        if is_anonymous(&ty.name) {
            if properties.is_empty() {
                return "object".to_string();
            }
            let key = fingerprint(properties);
            if let Some(existing) = self.inline_types.get(&key) {
                return existing.clone();
            }
            let name = self.unique_name(hint);
            self.inline_types.insert(key, name.clone());
            return self.class(name, owner.clone(), properties, depth);
        }

        let name = type_identifier(&ty.name);
        if self.in_progress.contains(&name) {
            self.diagnose(format!(
                "type '{name}' is reachable from itself; nested occurrence emitted as object"
            ));
            return "object".to_string();
        }
        match self.get(&name).map(|t| &t.kind) {
            Some(NestedKind::Class { .. }) => name,
            Some(_) => {
                let name = self.unique_name(&name);
                self.class(name, Owner::Shared, properties, depth)
            }
            None => self.class(name, Owner::Shared, properties, depth),
        }
    }

    fn class(&mut self, name: String, owner: Owner, properties: &[ParsedProperty], depth: usize) -> String {
        let description = self.descriptions.get(&name).cloned();
        let index = self.register(NestedType {
            name: name.clone(),
            owner: owner.clone(),
            description,
            kind: NestedKind::Class { fields: Vec::new() },
        });
        self.in_progress.push(name.clone());
        let fields: Vec<CsField> = properties
            .iter()
            .map(|p| self.field(p, &name, &owner, depth))
            .collect();
        self.in_progress.pop();
        self.nested[index].kind = NestedKind::Class { fields };
        name
    }

    fn field(&mut self, property: &ParsedProperty, parent: &str, owner: &Owner, depth: usize) -> CsField {
        let mut name = to_pascal_case(&identifier(&property.name));
        if name == parent {
            name.push_str("Value");
        }
        let hint = format!("{parent}{name}");
        let ty = self.map(&property.ty, &hint, owner, depth + 1);
        CsField {
            json_name: property.name.clone(),
            ignore: ty.starts_with("System.Action"),
            name,
            ty,
            optional: property.optional,
            description: property.description.clone(),
        }
    }

    fn union(
        &mut self,
        ty: &ParsedType,
        members: &[ParsedType],
        hint: &str,
        owner: &Owner,
        depth: usize,
    ) -> String {
        let literals: Option<Vec<&str>> = members.iter().map(ParsedType::as_string_literal).collect();
        if let Some(values) = literals {
            return if is_anonymous(&ty.name) {
                self.enum_type(hint, &values, owner)
            } else {
                self.enum_type(&type_identifier(&ty.name), &values, &Owner::Shared)
            };
        }

        // Object alternatives merge into one class; fields missing from
        // some alternative become optional
        if members.iter().all(|m| matches!(m.kind, TypeKind::Object { .. })) {
            let mut properties: Vec<ParsedProperty> = Vec::new();
            for member in members {
                for property in member.properties() {
                    if !properties.iter().any(|p| p.name == property.name) {
                        let everywhere = members.iter().all(|m| m.property(&property.name).is_some());
                        properties.push(ParsedProperty {
                            optional: property.optional || !everywhere,
                            ..property.clone()
                        });
                    }
                }
            }
            let merged = ParsedType::object(&ty.name, &ty.raw, properties);
            return self.map(&merged, hint, owner, depth);
        }

        match members.first() {
            Some(first)
                if members
                    .iter()
                    .all(|m| matches!(m.kind, TypeKind::Primitive) && m.name == first.name) =>
            {
                primitive(&first.name).to_string()
            }
            _ => "object".to_string(),
        }
    }

    fn enum_type(&mut self, name: &str, values: &[&str], owner: &Owner) -> String {
        let mut seen = HashSet::new();
        let mut members: Vec<CsEnumMember> = Vec::new();
        for value in values {
            if !seen.insert(*value) {
                continue;
            }
            let mut member = enum_member_name(value);
            while members.iter().any(|m| m.name == member) {
                member.push('_');
            }
            members.push(CsEnumMember {
                name: member,
                value: (*value).to_string(),
            });
        }

        let name = match self.get(name).map(|t| &t.kind) {
            Some(NestedKind::Enum { members: existing }) if *existing == members => {
                return name.to_string();
            }
            Some(_) => self.unique_name(name),
            None => name.to_string(),
        };
        let description = self.descriptions.get(&name).cloned();
        self.register(NestedType {
            name: name.clone(),
            owner: owner.clone(),
            description,
            kind: NestedKind::Enum { members },
        });
        name
    }

    fn result_type(
        &mut self,
        base: &str,
        discriminated: &DiscriminatedUnion,
        owner: &Owner,
        depth: usize,
    ) -> String {
        let base = base.strip_suffix("Result").unwrap_or(base);
        let name = format!("{base}Result");
        if matches!(self.get(&name).map(|t| &t.kind), Some(NestedKind::Result { .. })) {
            return name;
        }
        let name = self.unique_name(&name);
        let index = self.register(NestedType {
            name: name.clone(),
            owner: owner.clone(),
            description: None,
            kind: NestedKind::Result {
                success: String::new(),
                error_code: String::new(),
            },
        });
        let success = self.map(&discriminated.success, &format!("{base}Success"), owner, depth + 1);
        let codes: Vec<&str> = discriminated.error_codes.iter().map(String::as_str).collect();
        let error_code = self.enum_type(&format!("{base}ErrorCode"), &codes, owner);
        self.nested[index].kind = NestedKind::Result { success, error_code };
        name
    }

    fn register(&mut self, ty: NestedType) -> usize {
        let index = self.nested.len();
        self.by_name.insert(ty.name.clone(), index);
        self.nested.push(ty);
        index
    }

    fn unique_name(&self, base: &str) -> String {
        if !self.by_name.contains_key(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base}{n}"))
            .find(|candidate| !self.by_name.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

// =============================================================================
// Naming helpers
// =============================================================================

/// Names the parser gives to shapes without a declaration.
pub(crate) fn is_anonymous(name: &str) -> bool {
    matches!(name, "object" | "union" | "__type" | "") || name.starts_with('{')
}

fn primitive(name: &str) -> &'static str {
    match name {
        "string" => "string",
        "number" | "bigint" => "double",
        "boolean" => "bool",
        "void" | "undefined" => "void",
        "Date" => "DateTime",
        "ArrayBuffer" | "Uint8Array" => "byte[]",
        "Error" => "Exception",
        _ => "object",
    }
}

/// `items` -> `item` for array element class names.
fn singular(hint: &str) -> String {
    if hint.ends_with("ss") {
        return hint.to_string();
    }
    hint.strip_suffix('s').unwrap_or(hint).to_string()
}

/// Letters, digits and underscores of `name`, word boundaries capitalized.
pub(crate) fn identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if upper && !out.is_empty() {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            upper = false;
        } else {
            upper = true;
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// C# type name for a declared type name (`import("x").Foo` -> `Foo`).
pub(crate) fn type_identifier(name: &str) -> String {
    let last = name.rsplit('.').next().unwrap_or(name);
    let base = last.split('<').next().unwrap_or(last);
    to_pascal_case(&identifier(base))
}

/// Enum member identifier for a wire value.
fn enum_member_name(value: &str) -> String {
    let member = if value.chars().any(|c| c.is_ascii_lowercase()) {
        value
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|s| !s.is_empty())
            .map(to_pascal_case)
            .collect::<String>()
    } else {
        identifier(value)
    };
    if member.is_empty() {
        return "Empty".to_string();
    }
    if member.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{member}")
    } else {
        member
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use sdkgen_common::ParsedParameter;

    fn category() -> Owner {
        Owner::Category("Location".to_string())
    }

    fn prop(name: &str, ty: ParsedType) -> ParsedProperty {
        ParsedProperty {
            name: name.to_string(),
            ty,
            optional: false,
            description: None,
        }
    }

    fn point() -> ParsedType {
        ParsedType::object(
            "object",
            "{ x: number, y: number }",
            vec![
                prop("x", ParsedType::primitive("number")),
                prop("y", ParsedType::primitive("number")),
            ],
        )
    }

    fn literal_union(name: &str, values: &[&str]) -> ParsedType {
        ParsedType {
            name: name.to_string(),
            raw: values.iter().map(|v| format!("'{v}'")).collect::<Vec<_>>().join(" | "),
            nullable: false,
            kind: TypeKind::Union {
                members: values.iter().map(|v| ParsedType::string_literal(v)).collect(),
                discriminated: None,
            },
        }
    }

    #[test]
    fn test_primitive_mapping() {
        let mut ctx = GenerationContext::default();
        let owner = category();
        assert_eq!(ctx.csharp_type(&ParsedType::primitive("string"), "A", &owner), "string");
        assert_eq!(ctx.csharp_type(&ParsedType::primitive("number"), "A", &owner), "double");
        assert_eq!(ctx.csharp_type(&ParsedType::primitive("boolean"), "A", &owner), "bool");
        assert_eq!(
            ctx.csharp_type(&ParsedType::primitive("number").into_nullable(), "A", &owner),
            "double?"
        );
        assert_eq!(
            ctx.csharp_type(&ParsedType::primitive("string").into_nullable(), "A", &owner),
            "string"
        );
        assert_eq!(ctx.csharp_type(&ParsedType::primitive("Uint8Array"), "A", &owner), "byte[]");
        assert!(ctx.nested_types().is_empty());
    }

    #[test]
    fn test_identical_inline_shapes_share_one_class() {
        let mut ctx = GenerationContext::default();
        let owner = category();
        let first = ctx.csharp_type(&point(), "MoveToTarget", &owner);
        let second = ctx.csharp_type(&point(), "DrawAtOrigin", &Owner::Category("Media".to_string()));
        assert_eq!(first, "MoveToTarget");
        assert_eq!(second, "MoveToTarget");
        assert_eq!(ctx.nested_types().len(), 1);
        assert_eq!(ctx.nested_types()[0].owner, owner);
    }

    #[test]
    fn test_named_object_is_shared_and_nested_names_follow_parent() {
        let mut ctx = GenerationContext::default();
        let location = ParsedType::object(
            "Location",
            "Location",
            vec![
                prop("coords", point()),
                prop(
                    "history",
                    ParsedType {
                        name: "object[]".to_string(),
                        raw: "{ at: number }[]".to_string(),
                        nullable: false,
                        kind: TypeKind::Array {
                            element: Box::new(ParsedType::object(
                                "object",
                                "{ at: number }",
                                vec![prop("at", ParsedType::primitive("number"))],
                            )),
                        },
                    },
                ),
            ],
        );
        assert_eq!(ctx.csharp_type(&location, "GetLocationResult", &category()), "Location");
        let names: Vec<&str> = ctx.nested_types().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Location", "LocationCoords", "LocationHistory"]);
        assert!(ctx.nested_types().iter().all(|t| t.owner == Owner::Shared));
        let NestedKind::Class { fields } = &ctx.get("Location").unwrap().kind else {
            panic!("expected class");
        };
        assert_eq!(fields[1].ty, "LocationHistory[]");
        assert_eq!(fields[1].json_name, "history");
        assert_eq!(fields[1].name, "History");
    }

    #[test]
    fn test_inline_literal_union_becomes_enum() {
        let mut ctx = GenerationContext::default();
        let ty = literal_union("union", &["low", "high", "low", "2x"]);
        let name = ctx.csharp_type(&ty, "SetQualityLevel", &category());
        assert_eq!(name, "SetQualityLevel");
        let NestedKind::Enum { members } = &ctx.get(&name).unwrap().kind else {
            panic!("expected enum");
        };
        let pairs: Vec<(&str, &str)> = members.iter().map(|m| (m.name.as_str(), m.value.as_str())).collect();
        assert_eq!(pairs, vec![("Low", "low"), ("High", "high"), ("_2x", "2x")]);
        assert!(ctx.is_enum("SetQualityLevel"));
        assert_eq!(ctx.csharp_type(&ty.into_nullable(), "SetQualityLevel", &category()), "SetQualityLevel?");
    }

    #[test]
    fn test_named_enum_definitions_are_registered_up_front() {
        let definitions = vec![ParsedTypeDefinition {
            name: "Accuracy".to_string(),
            file: "location.d.ts".to_string(),
            description: Some("Accuracy levels.".to_string()),
            kind: DefinitionKind::Enum {
                values: vec!["LOW".to_string(), "HIGH".to_string()],
            },
        }];
        let ctx = GenerationContext::new(&definitions);
        let accuracy = ctx.get("Accuracy").unwrap();
        assert_eq!(accuracy.owner, Owner::Shared);
        assert_eq!(accuracy.description.as_deref(), Some("Accuracy levels."));
        let NestedKind::Enum { members } = &accuracy.kind else {
            panic!("expected enum");
        };
        assert_eq!(members[0].name, "LOW");
    }

    #[test]
    fn test_discriminated_return_gets_result_and_error_code() {
        let mut ctx = GenerationContext::default();
        let union = ParsedType {
            name: "union".to_string(),
            raw: "{ hash: string } | 'NOT_FOUND' | 'INVALID'".to_string(),
            nullable: false,
            kind: TypeKind::Union {
                members: Vec::new(),
                discriminated: Some(DiscriminatedUnion {
                    success: Box::new(ParsedType::object(
                        "object",
                        "{ hash: string }",
                        vec![prop("hash", ParsedType::primitive("string"))],
                    )),
                    error_codes: vec!["NOT_FOUND".to_string(), "INVALID".to_string()],
                }),
            },
        };
        let promise = ParsedType {
            name: "Promise".to_string(),
            raw: "Promise<...>".to_string(),
            nullable: false,
            kind: TypeKind::Promise {
                resolved: Box::new(union),
            },
        };
        assert_eq!(ctx.return_type("GetHash", &promise, &category()), "GetHashResult");
        let NestedKind::Result { success, error_code } = &ctx.get("GetHashResult").unwrap().kind else {
            panic!("expected result");
        };
        assert_eq!(success, "GetHashSuccess");
        assert_eq!(error_code, "GetHashErrorCode");
        let NestedKind::Enum { members } = &ctx.get("GetHashErrorCode").unwrap().kind else {
            panic!("expected enum");
        };
        let values: Vec<&str> = members.iter().map(|m| m.value.as_str()).collect();
        assert_eq!(values, vec!["NOT_FOUND", "INVALID"]);
    }

    #[test]
    fn test_return_type_void_and_anonymous_payload() {
        let mut ctx = GenerationContext::default();
        assert_eq!(ctx.return_type("Share", &ParsedType::primitive("void"), &category()), "void");
        assert_eq!(ctx.return_type("Share", &ParsedType::primitive("any"), &category()), "void");
        assert_eq!(ctx.return_type("GetPoint", &point(), &category()), "GetPointResult");
    }

    #[test]
    fn test_self_reference_becomes_object_with_diagnostic() {
        let mut ctx = GenerationContext::default();
        // The parser cuts cycles with a name-only object of the same name
        let node = ParsedType::object(
            "TreeNode",
            "TreeNode",
            vec![
                prop("label", ParsedType::primitive("string")),
                prop("parent", ParsedType::object("TreeNode", "TreeNode", Vec::new())),
            ],
        );
        assert_eq!(ctx.csharp_type(&node, "X", &category()), "TreeNode");
        let NestedKind::Class { fields } = &ctx.get("TreeNode").unwrap().kind else {
            panic!("expected class");
        };
        assert_eq!(fields[1].ty, "object");
        assert_eq!(ctx.diagnostics().len(), 1);
    }

    #[test]
    fn test_depth_guard() {
        let mut ctx = GenerationContext::default();
        let mut ty = ParsedType::primitive("string");
        for _ in 0..12 {
            ty = ParsedType::object("object", "{...}", vec![prop("inner", ty)]);
        }
        ctx.csharp_type(&ty, "Deep", &category());
        assert!(ctx.diagnostics()[0].contains("deeper than 8 levels"));
        assert!(ctx.nested_types().len() <= MAX_DEPTH + 1);
    }

    #[test]
    fn test_function_and_record_mapping() {
        let mut ctx = GenerationContext::default();
        let handler = ParsedType {
            name: "function".to_string(),
            raw: "(value: string) => void".to_string(),
            nullable: false,
            kind: TypeKind::Function {
                params: vec![ParsedParameter {
                    name: "value".to_string(),
                    ty: ParsedType::primitive("string"),
                    optional: false,
                    description: None,
                }],
                returns: Box::new(ParsedType::primitive("void")),
            },
        };
        assert_eq!(ctx.csharp_type(&handler, "A", &category()), "System.Action<string>");
        let record = ParsedType {
            name: "Record".to_string(),
            raw: "Record<string, number>".to_string(),
            nullable: false,
            kind: TypeKind::Record {
                key: Box::new(ParsedType::primitive("string")),
                value: Box::new(ParsedType::primitive("number")),
            },
        };
        assert_eq!(ctx.csharp_type(&record, "A", &category()), "Dictionary<string, double>");
    }

    #[test]
    fn test_marshal() {
        let mut ctx = GenerationContext::default();
        ctx.csharp_type(&literal_union("Mode", &["a", "b"]), "X", &category());
        assert_eq!(ctx.marshal("string"), Marshal::String);
        assert_eq!(ctx.marshal("double?"), Marshal::Double);
        assert_eq!(ctx.marshal("Mode"), Marshal::Enum);
        assert_eq!(ctx.marshal("Location"), Marshal::Json);
        assert_eq!(ctx.marshal("void"), Marshal::Void);
    }

    #[test]
    fn test_naming_helpers() {
        assert_eq!(identifier("content-type"), "contentType");
        assert_eq!(type_identifier("import(\"x\").Foo"), "Foo");
        assert_eq!(singular("LocationItems"), "LocationItem");
        assert_eq!(singular("Address"), "Address");
        assert_eq!(enum_member_name("NOT_FOUND"), "NOT_FOUND");
        assert_eq!(enum_member_name("low-power"), "LowPower");
    }
}
