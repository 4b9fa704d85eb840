//! Type-support check.
//!
//! A type is supported when every node of its graph has a C# rendering rule.
//! Function-valued types and discriminated unions are always supported; an
//! unresolvable reference is supported only when it is nullable (it then
//! renders as an optional `object`).

use std::collections::HashSet;
use std::sync::LazyLock;

use sdkgen_common::{ParsedType, TypeKind};

static SUPPORTED_PRIMITIVES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "string",
        "number",
        "boolean",
        "void",
        "any",
        "unknown",
        "object",
        "null",
        "undefined",
        "never",
        "Date",
        "Error",
        "ArrayBuffer",
        "Uint8Array",
    ]
    .into_iter()
    .collect()
});

/// `Err` names the first node without a rendering rule.
pub fn check_supported(ty: &ParsedType) -> Result<(), String> {
    match &ty.kind {
        TypeKind::Primitive => {
            if SUPPORTED_PRIMITIVES.contains(ty.name.as_str()) {
                Ok(())
            } else {
                Err(format!("primitive '{}' has no C# mapping", ty.raw))
            }
        }
        TypeKind::Unknown => {
            if ty.nullable {
                Ok(())
            } else {
                Err(format!("type '{}' could not be resolved", ty.name))
            }
        }
        TypeKind::Object { properties } => properties.iter().try_for_each(|p| {
            check_supported(&p.ty).map_err(|e| format!("property '{}': {e}", p.name))
        }),
        TypeKind::Array { element } => check_supported(element),
        TypeKind::Promise { resolved } => check_supported(resolved),
        TypeKind::Record { key, value } => {
            check_supported(key)?;
            check_supported(value)
        }
        TypeKind::Function { .. } => Ok(()),
        TypeKind::Union {
            members,
            discriminated,
        } => {
            if discriminated.is_some() {
                return Ok(());
            }
            members.iter().try_for_each(check_supported)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sdkgen_common::ParsedProperty;

    #[test]
    fn test_primitives_and_objects() {
        assert!(check_supported(&ParsedType::primitive("string")).is_ok());
        let object = ParsedType::object(
            "Point",
            "Point",
            vec![ParsedProperty {
                name: "x".to_string(),
                ty: ParsedType::primitive("number"),
                optional: false,
                description: None,
            }],
        );
        assert!(check_supported(&object).is_ok());
    }

    #[test]
    fn test_unknown_reference_is_reported_with_path() {
        let object = ParsedType::object(
            "object",
            "{ handle: Mystery }",
            vec![ParsedProperty {
                name: "handle".to_string(),
                ty: ParsedType::unknown("Mystery", "Mystery"),
                optional: false,
                description: None,
            }],
        );
        let err = check_supported(&object).unwrap_err();
        assert_eq!(err, "property 'handle': type 'Mystery' could not be resolved");
    }

    #[test]
    fn test_nullable_unknown_is_tolerated() {
        let ty = ParsedType::unknown("Mystery", "Mystery | null").into_nullable();
        assert!(check_supported(&ty).is_ok());
    }
}
