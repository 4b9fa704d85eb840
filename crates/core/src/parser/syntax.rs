//! Declaration-level syntax tree for `.d.ts` files.
//!
//! The tree is deliberately shallow: only what the detector and the type
//! resolver need. Anything the generator has no use for (conditional types,
//! mapped types, `infer`) is kept as opaque source text.

use super::jsdoc::JsDoc;

// =============================================================================
// Type expressions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `string`, `number`, `void`, `null`, `object`, ...
    Keyword(String),
    /// `Foo`, `ns.Foo`, `Promise<T>`; qualified names keep their dots.
    Reference { name: String, args: Vec<TypeExpr> },
    StringLiteral(String),
    NumberLiteral(String),
    BooleanLiteral(bool),
    TemplateLiteral(String),
    Array(Box<TypeExpr>),
    Tuple(Vec<TypeExpr>),
    Union(Vec<TypeExpr>),
    Intersection(Vec<TypeExpr>),
    Function {
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        returns: Box<TypeExpr>,
    },
    Object(Vec<Member>),
    /// `typeof name`
    TypeQuery(String),
    Keyof(Box<TypeExpr>),
    IndexedAccess {
        object: Box<TypeExpr>,
        index: Box<TypeExpr>,
    },
    /// Conditional, mapped and other shapes with no rendering rule.
    Opaque(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub name: String,
    pub constraint: Option<TypeExpr>,
    pub default: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub optional: bool,
    pub rest: bool,
    /// `{ a, b }: T` or `[a, b]: T`
    pub destructured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub doc: Option<JsDoc>,
    pub optional: bool,
    pub kind: MemberKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    Property(TypeExpr),
    Method {
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        returns: TypeExpr,
    },
    /// `(args): R` inside an object type.
    Call {
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        returns: TypeExpr,
    },
    /// `[key: K]: V`
    Index { key: TypeExpr, value: TypeExpr },
}

impl Member {
    /// The member's type when used as a value: methods become function types.
    pub fn value_type(&self) -> Option<TypeExpr> {
        match &self.kind {
            MemberKind::Property(ty) => Some(ty.clone()),
            MemberKind::Method {
                type_params,
                params,
                returns,
            } => Some(TypeExpr::Function {
                type_params: type_params.clone(),
                params: params.clone(),
                returns: Box::new(returns.clone()),
            }),
            MemberKind::Call { .. } | MemberKind::Index { .. } => None,
        }
    }
}

// =============================================================================
// Declarations
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub doc: Option<JsDoc>,
    pub line: usize,
    pub exported: bool,
    pub kind: DeclKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    Function {
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        returns: TypeExpr,
    },
    Variable {
        ty: Option<TypeExpr>,
    },
    Interface {
        type_params: Vec<TypeParam>,
        extends: Vec<TypeExpr>,
        members: Vec<Member>,
    },
    TypeAlias {
        type_params: Vec<TypeParam>,
        ty: TypeExpr,
    },
    Enum {
        members: Vec<EnumMember>,
    },
    Class {
        extends: Option<TypeExpr>,
        members: Vec<Member>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub init: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the corpus root, `/`-separated.
    pub path: String,
    pub declarations: Vec<Declaration>,
    /// Recoverable parse problems (`line`, `message`).
    pub errors: Vec<(usize, String)>,
}

// =============================================================================
// Emission back to TypeScript text
// =============================================================================

/// Trait for printing syntax nodes back to TypeScript source text.
pub trait Emit {
    /// Convert the node to its TypeScript representation.
    fn emit(&self) -> String;
}

fn join<T: Emit>(items: &[T], sep: &str) -> String {
    items.iter().map(Emit::emit).collect::<Vec<_>>().join(sep)
}

impl Emit for TypeExpr {
    fn emit(&self) -> String {
        match self {
            TypeExpr::Keyword(k) => k.clone(),
            TypeExpr::Reference { name, args } => {
                if args.is_empty() {
                    name.clone()
                } else {
                    format!("{name}<{}>", join(args, ", "))
                }
            }
            TypeExpr::StringLiteral(s) => format!("\"{s}\""),
            TypeExpr::NumberLiteral(n) => n.clone(),
            TypeExpr::BooleanLiteral(b) => b.to_string(),
            TypeExpr::TemplateLiteral(t) => format!("`{t}`"),
            TypeExpr::Array(inner) => {
                let inner_str = inner.emit();
                // Wrap complex types in parentheses
                if matches!(
                    **inner,
                    TypeExpr::Union(_) | TypeExpr::Intersection(_) | TypeExpr::Function { .. }
                ) {
                    format!("({inner_str})[]")
                } else {
                    format!("{inner_str}[]")
                }
            }
            TypeExpr::Tuple(items) => format!("[{}]", join(items, ", ")),
            TypeExpr::Union(types) => join(types, " | "),
            TypeExpr::Intersection(types) => types
                .iter()
                .map(|t| {
                    let s = t.emit();
                    if matches!(t, TypeExpr::Union(_) | TypeExpr::Function { .. }) {
                        format!("({s})")
                    } else {
                        s
                    }
                })
                .collect::<Vec<_>>()
                .join(" & "),
            TypeExpr::Function {
                type_params,
                params,
                returns,
            } => format!(
                "{}({}) => {}",
                emit_type_params(type_params),
                join(params, ", "),
                returns.emit()
            ),
            TypeExpr::Object(members) => {
                if members.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{ {}; }}", join(members, "; "))
                }
            }
            TypeExpr::TypeQuery(name) => format!("typeof {name}"),
            TypeExpr::Keyof(inner) => format!("keyof {}", inner.emit()),
            TypeExpr::IndexedAccess { object, index } => {
                format!("{}[{}]", object.emit(), index.emit())
            }
            TypeExpr::Opaque(raw) => raw.clone(),
        }
    }
}

fn emit_type_params(params: &[TypeParam]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let items: Vec<String> = params
        .iter()
        .map(|p| {
            let mut s = p.name.clone();
            if let Some(c) = &p.constraint {
                s.push_str(" extends ");
                s.push_str(&c.emit());
            }
            if let Some(d) = &p.default {
                s.push_str(" = ");
                s.push_str(&d.emit());
            }
            s
        })
        .collect();
    format!("<{}>", items.join(", "))
}

impl Emit for Param {
    fn emit(&self) -> String {
        let mut s = String::new();
        if self.rest {
            s.push_str("...");
        }
        s.push_str(if self.destructured { "{}" } else { &self.name });
        if self.optional {
            s.push('?');
        }
        if let Some(ty) = &self.ty {
            s.push_str(": ");
            s.push_str(&ty.emit());
        }
        s
    }
}

impl Emit for Member {
    fn emit(&self) -> String {
        let opt = if self.optional { "?" } else { "" };
        match &self.kind {
            MemberKind::Property(ty) => format!("{}{opt}: {}", self.name, ty.emit()),
            MemberKind::Method {
                type_params,
                params,
                returns,
            } => format!(
                "{}{opt}{}({}): {}",
                self.name,
                emit_type_params(type_params),
                join(params, ", "),
                returns.emit()
            ),
            MemberKind::Call {
                type_params,
                params,
                returns,
            } => format!(
                "{}({}): {}",
                emit_type_params(type_params),
                join(params, ", "),
                returns.emit()
            ),
            MemberKind::Index { key, value } => {
                format!("[key: {}]: {}", key.emit(), value.emit())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn reference(name: &str) -> TypeExpr {
        TypeExpr::Reference {
            name: name.to_string(),
            args: Vec::new(),
        }
    }

    #[test]
    fn test_emit_union_array() {
        let ty = TypeExpr::Array(Box::new(TypeExpr::Union(vec![
            TypeExpr::Keyword("string".into()),
            TypeExpr::Keyword("number".into()),
        ])));
        assert_eq!(ty.emit(), "(string | number)[]");
    }

    #[test]
    fn test_emit_function_and_object() {
        let ty = TypeExpr::Function {
            type_params: Vec::new(),
            params: vec![Param {
                name: "point".into(),
                ty: Some(TypeExpr::Object(vec![Member {
                    name: "x".into(),
                    doc: None,
                    optional: true,
                    kind: MemberKind::Property(TypeExpr::Keyword("number".into())),
                }])),
                optional: false,
                rest: false,
                destructured: false,
            }],
            returns: Box::new(TypeExpr::Reference {
                name: "Promise".into(),
                args: vec![reference("Result")],
            }),
        };
        assert_eq!(ty.emit(), "(point: { x?: number; }) => Promise<Result>");
    }

    #[test]
    fn test_member_value_type_for_method() {
        let member = Member {
            name: "getItem".into(),
            doc: None,
            optional: false,
            kind: MemberKind::Method {
                type_params: Vec::new(),
                params: Vec::new(),
                returns: TypeExpr::Keyword("void".into()),
            },
        };
        assert_eq!(member.value_type().unwrap().emit(), "() => void");
    }
}
