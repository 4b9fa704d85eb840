//! Content-addressed structural fingerprints.
//!
//! Two anonymous object shapes with the same sorted list of
//! (property name, optionality, type signature) triples hash to the same key.

use sha2::{Digest, Sha256};

use sdkgen_common::{ParsedProperty, ParsedType, TypeKind};

/// Hex SHA-256 of the sorted property triples.
pub fn fingerprint(properties: &[ParsedProperty]) -> String {
    let digest = Sha256::digest(triples(properties).as_bytes());
    hex::encode(digest)
}

fn triples(properties: &[ParsedProperty]) -> String {
    let mut entries: Vec<String> = properties
        .iter()
        .map(|p| format!("{}|{}|{}", p.name, p.optional, signature(&p.ty)))
        .collect();
    entries.sort();
    entries.join(";")
}

/// Canonical text of a type, independent of member order.
fn signature(ty: &ParsedType) -> String {
    let base = match &ty.kind {
        TypeKind::Primitive => ty
            .as_string_literal()
            .map_or_else(|| ty.name.clone(), |v| format!("'{v}'")),
        TypeKind::Object { properties } => {
            if super::is_anonymous(&ty.name) {
                format!("{{{}}}", triples(properties))
            } else {
                ty.name.clone()
            }
        }
        TypeKind::Array { element } => format!("{}[]", signature(element)),
        TypeKind::Promise { resolved } => format!("Promise<{}>", signature(resolved)),
        TypeKind::Function { params, returns } => {
            let params: Vec<String> = params.iter().map(|p| signature(&p.ty)).collect();
            format!("({})=>{}", params.join(","), signature(returns))
        }
        TypeKind::Union { members, .. } => {
            let mut members: Vec<String> = members.iter().map(signature).collect();
            members.sort();
            members.join("|")
        }
        TypeKind::Record { key, value } => {
            format!("Record<{},{}>", signature(key), signature(value))
        }
        TypeKind::Unknown => format!("?{}", ty.name),
    };
    if ty.nullable { format!("{base}?") } else { base }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn prop(name: &str, ty: ParsedType, optional: bool) -> ParsedProperty {
        ParsedProperty {
            name: name.to_string(),
            ty,
            optional,
            description: None,
        }
    }

    #[test]
    fn test_member_order_does_not_matter() {
        let a = vec![
            prop("x", ParsedType::primitive("number"), false),
            prop("y", ParsedType::primitive("number"), false),
        ];
        let b = vec![
            prop("y", ParsedType::primitive("number"), false),
            prop("x", ParsedType::primitive("number"), false),
        ];
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a).len(), 64);
    }

    #[test]
    fn test_optionality_and_types_matter() {
        let base = vec![prop("x", ParsedType::primitive("number"), false)];
        let optional = vec![prop("x", ParsedType::primitive("number"), true)];
        let string = vec![prop("x", ParsedType::primitive("string"), false)];
        assert_ne!(fingerprint(&base), fingerprint(&optional));
        assert_ne!(fingerprint(&base), fingerprint(&string));
    }

    #[test]
    fn test_literal_values_matter() {
        let a = vec![prop("mode", ParsedType::string_literal("fast"), false)];
        let b = vec![prop("mode", ParsedType::string_literal("slow"), false)];
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }
}
