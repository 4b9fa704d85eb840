//! IR records describing discovered APIs and their types.
//!
//! Everything here is created once per run by the parser and collector and is
//! treated as immutable afterwards.

use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

// =============================================================================
// Types
// =============================================================================

/// A resolved type reachable from a parameter, property or return position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedType {
    /// Declared name (`string`, `DeviceInfo`, `object` for anonymous shapes).
    pub name: String,
    /// Source text of the type, preserved for fallback and diagnostics.
    pub raw: String,
    /// Set when the source type was `T | null` or `T | undefined`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
    /// Kind tag plus its single kind-specific payload.
    #[serde(flatten)]
    pub kind: TypeKind,
}

/// Kind-specific payload of a [`ParsedType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeKind {
    /// `string`, `number`, `boolean`, `void`, ... and string literals.
    Primitive,
    /// Object shape (interface or literal type).
    Object {
        /// Ordered fields.
        properties: Vec<ParsedProperty>,
    },
    /// `T[]` or `Array<T>`.
    Array {
        /// Element type.
        element: Box<ParsedType>,
    },
    /// `Promise<T>`.
    Promise {
        /// Resolved value type.
        resolved: Box<ParsedType>,
    },
    /// Function-valued type.
    Function {
        /// Ordered parameters.
        params: Vec<ParsedParameter>,
        /// Return type.
        returns: Box<ParsedType>,
    },
    /// Union of two or more members.
    Union {
        /// Ordered members (null/undefined already folded into `nullable`).
        members: Vec<ParsedType>,
        /// Present when the union is "object payload or string error codes".
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discriminated: Option<DiscriminatedUnion>,
    },
    /// `Record<K, V>` or a lone index signature.
    Record {
        /// Key type.
        key: Box<ParsedType>,
        /// Value type.
        value: Box<ParsedType>,
    },
    /// Anything without a rendering rule.
    Unknown,
}

/// Success payload plus named failure codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscriminatedUnion {
    /// The single object-kind member.
    pub success: Box<ParsedType>,
    /// String literal members, in source order, without quotes.
    pub error_codes: Vec<String>,
}

impl ParsedType {
    /// Build a primitive type whose raw text equals its name.
    pub fn primitive(name: &str) -> Self {
        Self {
            name: name.to_string(),
            raw: name.to_string(),
            nullable: false,
            kind: TypeKind::Primitive,
        }
    }

    /// Build a string literal type (`"NOT_FOUND"`).
    pub fn string_literal(value: &str) -> Self {
        Self {
            name: "string".to_string(),
            raw: format!("\"{value}\""),
            nullable: false,
            kind: TypeKind::Primitive,
        }
    }

    /// Build an object type.
    pub fn object(name: &str, raw: &str, properties: Vec<ParsedProperty>) -> Self {
        Self {
            name: name.to_string(),
            raw: raw.to_string(),
            nullable: false,
            kind: TypeKind::Object { properties },
        }
    }

    /// Build an unknown type, keeping the written name.
    pub fn unknown(name: &str, raw: &str) -> Self {
        Self {
            name: name.to_string(),
            raw: raw.to_string(),
            nullable: false,
            kind: TypeKind::Unknown,
        }
    }

    /// Short kind label used in reports.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            TypeKind::Primitive => "primitive",
            TypeKind::Object { .. } => "object",
            TypeKind::Array { .. } => "array",
            TypeKind::Promise { .. } => "promise",
            TypeKind::Function { .. } => "function",
            TypeKind::Union { .. } => "union",
            TypeKind::Record { .. } => "record",
            TypeKind::Unknown => "unknown",
        }
    }

    /// `void`/`undefined` (and `any`, which is treated as "no payload").
    pub fn is_void(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive)
            && matches!(self.name.as_str(), "void" | "undefined" | "any" | "never")
    }

    /// The unquoted value if this is a string literal type.
    pub fn as_string_literal(&self) -> Option<&str> {
        if !matches!(self.kind, TypeKind::Primitive) || self.name != "string" {
            return None;
        }
        let raw = self.raw.as_str();
        let quoted = (raw.starts_with('"') && raw.ends_with('"'))
            || (raw.starts_with('\'') && raw.ends_with('\''));
        (quoted && raw.len() >= 2).then(|| &raw[1..raw.len() - 1])
    }

    /// Object fields, or an empty slice for every other kind.
    pub fn properties(&self) -> &[ParsedProperty] {
        match &self.kind {
            TypeKind::Object { properties } => properties,
            _ => &[],
        }
    }

    /// Look up an object field by name.
    pub fn property(&self, name: &str) -> Option<&ParsedProperty> {
        self.properties().iter().find(|p| p.name == name)
    }

    /// Whether the type is function-valued.
    pub fn is_function(&self) -> bool {
        matches!(self.kind, TypeKind::Function { .. })
    }

    /// Whether the type is a promise.
    pub fn is_promise(&self) -> bool {
        matches!(self.kind, TypeKind::Promise { .. })
    }

    /// The promise payload for promises, the type itself otherwise.
    pub fn unwrap_promise(&self) -> &ParsedType {
        match &self.kind {
            TypeKind::Promise { resolved } => resolved,
            _ => self,
        }
    }

    /// The discriminated union payload, if any.
    pub fn discriminated(&self) -> Option<&DiscriminatedUnion> {
        match &self.kind {
            TypeKind::Union { discriminated, .. } => discriminated.as_ref(),
            _ => None,
        }
    }

    /// Return a copy flagged nullable.
    pub fn into_nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// An object field or interface member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedProperty {
    /// Field name as written in the source.
    pub name: String,
    /// Field type.
    #[serde(rename = "type")]
    pub ty: ParsedType,
    /// `name?:`
    pub optional: bool,
    /// JSDoc text attached to the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// =============================================================================
// APIs
// =============================================================================

/// One parameter of an API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedParameter {
    /// Parameter name (`options` for destructured parameters).
    pub name: String,
    /// Parameter type.
    #[serde(rename = "type")]
    pub ty: ParsedType,
    /// `name?:` or a default value.
    pub optional: bool,
    /// `@param` text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Event subscription details for event APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    /// Event key passed to `addEventListener`.
    pub event_name: String,
    /// Payload delivered to `onEvent`, `None` for payload-less events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ParsedType>,
}

/// One discovered callable surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedApi {
    /// Unique key for the run (`getDeviceId`, `Storage.getItem`).
    pub name: String,
    /// C# method name (`GetDeviceId`, `StorageGetItem`).
    pub pascal_name: String,
    /// Member name as written in the source, used by the glue call.
    pub original_name: String,
    /// Output partition.
    pub category: String,
    /// Originating file, relative to the corpus root.
    pub file: String,
    /// Owning namespace object, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Leading JSDoc text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `@returns` text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_description: Option<String>,
    /// `@example` blocks in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    /// Ordered parameters.
    pub parameters: Vec<ParsedParameter>,
    /// Declared return type.
    pub return_type: ParsedType,
    /// The return type is a promise.
    pub is_async: bool,
    /// The returned value exposes permission helpers.
    pub has_permission: bool,
    /// `@deprecated` message (empty when the tag has no text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    /// Set for event subscription APIs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EventInfo>,
}

impl ParsedApi {
    /// Symbol shared by the C# `DllImport` and the jslib function.
    pub fn native_symbol(&self) -> String {
        format!("__{}_Internal", self.pascal_name)
    }

    /// Base name of the originating file.
    pub fn file_name(&self) -> &str {
        self.file.rsplit(['/', '\\']).next().unwrap_or(&self.file)
    }
}

// =============================================================================
// Type definitions and output
// =============================================================================

/// A named, reusable type extracted from the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTypeDefinition {
    /// Type name.
    pub name: String,
    /// Originating file.
    pub file: String,
    /// JSDoc text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Enum values or interface members.
    #[serde(flatten)]
    pub kind: DefinitionKind,
}

/// Payload of a [`ParsedTypeDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DefinitionKind {
    /// Ordered, deduplicated string values.
    Enum {
        /// Enum values.
        values: Vec<String>,
    },
    /// Interface members.
    Interface {
        /// Ordered fields.
        properties: Vec<ParsedProperty>,
    },
}

/// Output pairing for one API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCode {
    /// The API this code was generated from.
    pub api: ParsedApi,
    /// C# method text.
    pub csharp: String,
    /// jslib function text.
    pub jslib: String,
    /// Both fragments came from a manual template.
    pub manual: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_string_literal_accessor() {
        assert_eq!(
            ParsedType::string_literal("NOT_FOUND").as_string_literal(),
            Some("NOT_FOUND")
        );
        let single = ParsedType {
            raw: "'camera'".to_string(),
            ..ParsedType::primitive("string")
        };
        assert_eq!(single.as_string_literal(), Some("camera"));
        assert_eq!(ParsedType::primitive("string").as_string_literal(), None);
    }

    #[test]
    fn test_kind_serializes_as_tag() {
        let ty = ParsedType::object(
            "Point",
            "Point",
            vec![ParsedProperty {
                name: "x".to_string(),
                ty: ParsedType::primitive("number"),
                optional: false,
                description: None,
            }],
        );
        let json = serde_json::to_value(&ty).unwrap();
        assert_eq!(json["kind"], "object");
        assert_eq!(json["properties"][0]["type"]["kind"], "primitive");
        assert!(json.get("nullable").is_none());
    }

    #[test]
    fn test_unwrap_promise() {
        let inner = ParsedType::primitive("string");
        let promise = ParsedType {
            name: "Promise".to_string(),
            raw: "Promise<string>".to_string(),
            nullable: false,
            kind: TypeKind::Promise {
                resolved: Box::new(inner.clone()),
            },
        };
        assert!(promise.is_promise());
        assert_eq!(promise.unwrap_promise(), &inner);
        assert_eq!(inner.unwrap_promise(), &inner);
    }

    #[test]
    fn test_native_symbol_and_file_name() {
        let api = ParsedApi {
            name: "Storage.getItem".to_string(),
            pascal_name: "StorageGetItem".to_string(),
            original_name: "getItem".to_string(),
            category: "Storage".to_string(),
            file: "bridge/storage.d.ts".to_string(),
            namespace: Some("Storage".to_string()),
            description: None,
            return_description: None,
            examples: Vec::new(),
            parameters: Vec::new(),
            return_type: ParsedType::primitive("void"),
            is_async: false,
            has_permission: false,
            deprecated: None,
            event: None,
        };
        assert_eq!(api.native_symbol(), "__StorageGetItem_Internal");
        assert_eq!(api.file_name(), "storage.d.ts");
    }
}
