//! Structural to nominal type resolution.
//!
//! Syntax-level [`TypeExpr`]s are resolved against a corpus-wide symbol
//! table into IR [`ParsedType`]s. Resolution never fails: anything without a
//! rule becomes either the opaque primitive `unknown` or the `Unknown` kind
//! (for references that name nothing).

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use sdkgen_common::{
    DiscriminatedUnion, ParsedParameter, ParsedProperty, ParsedType, TypeKind,
};

use super::jsdoc::JsDoc;
use super::syntax::{DeclKind, Declaration, Emit, Member, MemberKind, Param, SourceFile, TypeExpr, TypeParam};

/// Reference chains longer than this are cut with a name-only placeholder.
const MAX_DEPTH: usize = 24;

/// Browser DOM types; referenced only as opaque handles.
static DOM_TYPES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "HTMLElement",
        "HTMLDivElement",
        "HTMLCanvasElement",
        "HTMLImageElement",
        "HTMLInputElement",
        "HTMLIFrameElement",
        "HTMLVideoElement",
        "HTMLAudioElement",
        "Element",
        "Node",
        "Document",
        "Window",
        "Event",
        "EventTarget",
        "MouseEvent",
        "KeyboardEvent",
        "TouchEvent",
        "PointerEvent",
        "MessageEvent",
        "CustomEvent",
        "CSSStyleDeclaration",
        "Blob",
        "File",
        "FileList",
        "Response",
        "Request",
        "Headers",
        "AbortSignal",
        "DOMRect",
        "ShadowRoot",
    ]
    .into_iter()
    .collect()
});

// =============================================================================
// Symbol table
// =============================================================================

/// Every named declaration of the corpus, by name.
#[derive(Debug, Default)]
pub(crate) struct SymbolTable<'a> {
    /// Interface declarations; merged in file order.
    interfaces: HashMap<&'a str, Vec<&'a Declaration>>,
    aliases: HashMap<&'a str, &'a Declaration>,
    enums: HashMap<&'a str, &'a Declaration>,
    classes: HashMap<&'a str, &'a Declaration>,
    /// Functions (first overload) and variables.
    values: HashMap<&'a str, &'a Declaration>,
}

impl<'a> SymbolTable<'a> {
    pub(crate) fn build(files: &'a [SourceFile]) -> Self {
        let mut table = Self::default();
        for file in files {
            for decl in &file.declarations {
                let name = decl.name.as_str();
                match &decl.kind {
                    DeclKind::Interface { .. } => {
                        table.interfaces.entry(name).or_default().push(decl);
                    }
                    DeclKind::TypeAlias { .. } => {
                        table.aliases.entry(name).or_insert(decl);
                    }
                    DeclKind::Enum { .. } => {
                        table.enums.entry(name).or_insert(decl);
                    }
                    DeclKind::Class { .. } => {
                        table.classes.entry(name).or_insert(decl);
                    }
                    DeclKind::Function { .. } | DeclKind::Variable { .. } => {
                        table.values.entry(name).or_insert(decl);
                    }
                }
            }
        }
        table
    }

    /// Look up a possibly qualified name, falling back to its last segment.
    fn find<'m, T>(map: &'m HashMap<&'a str, T>, name: &str) -> Option<&'m T> {
        map.get(name).or_else(|| {
            let last = name.rsplit('.').next()?;
            map.get(last)
        })
    }

    pub(crate) fn value(&self, name: &str) -> Option<&'a Declaration> {
        Self::find(&self.values, name).copied()
    }

    pub(crate) fn alias(&self, name: &str) -> Option<&'a Declaration> {
        Self::find(&self.aliases, name).copied()
    }

    pub(crate) fn class(&self, name: &str) -> Option<&'a Declaration> {
        Self::find(&self.classes, name).copied()
    }

    fn interface(&self, name: &str) -> Option<&Vec<&'a Declaration>> {
        Self::find(&self.interfaces, name)
    }

    fn enumeration(&self, name: &str) -> Option<&'a Declaration> {
        Self::find(&self.enums, name).copied()
    }

    /// Members of an object-like type, following references to interfaces
    /// and aliases. Used where member docs matter (namespace objects).
    pub(crate) fn object_members(&self, ty: &'a TypeExpr) -> Option<Vec<&'a Member>> {
        self.object_members_at(ty, 0)
    }

    fn object_members_at(&self, ty: &'a TypeExpr, depth: usize) -> Option<Vec<&'a Member>> {
        if depth > MAX_DEPTH {
            return None;
        }
        match ty {
            TypeExpr::Object(members) => Some(members.iter().collect()),
            TypeExpr::Intersection(parts) => {
                let mut all = Vec::new();
                for part in parts {
                    all.extend(self.object_members_at(part, depth + 1)?);
                }
                Some(all)
            }
            TypeExpr::Reference { name, .. } => self.named_members_at(name, depth + 1),
            _ => None,
        }
    }

    /// Members of the interface or object alias called `name`.
    pub(crate) fn named_members(&self, name: &str) -> Option<Vec<&'a Member>> {
        self.named_members_at(name, 0)
    }

    fn named_members_at(&self, name: &str, depth: usize) -> Option<Vec<&'a Member>> {
        if depth > MAX_DEPTH {
            return None;
        }
        if let Some(decls) = self.interface(name) {
            let mut all = Vec::new();
            for decl in decls {
                if let DeclKind::Interface { extends, members, .. } = &decl.kind {
                    for parent in extends {
                        all.extend(self.object_members_at(parent, depth + 1).unwrap_or_default());
                    }
                    all.extend(members.iter());
                }
            }
            return Some(all);
        }
        match &self.alias(name)?.kind {
            DeclKind::TypeAlias { ty, .. } => self.object_members_at(ty, depth + 1),
            _ => None,
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves syntax types into IR types for one run.
#[derive(Debug)]
pub(crate) struct Resolver<'s, 'a> {
    symbols: &'s SymbolTable<'a>,
    /// Named declarations currently being expanded.
    stack: Vec<String>,
    /// Generic parameter bindings, innermost last.
    scopes: Vec<HashMap<String, ParsedType>>,
    depth: usize,
    /// Non-fatal findings (cycles, depth cuts).
    pub(crate) diagnostics: Vec<String>,
}

impl<'s, 'a> Resolver<'s, 'a> {
    pub(crate) fn new(symbols: &'s SymbolTable<'a>) -> Self {
        Self {
            symbols,
            stack: Vec::new(),
            scopes: Vec::new(),
            depth: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Run `f` with generic parameters bound to `args` (or their defaults,
    /// constraints, or `unknown`).
    pub(crate) fn with_type_params<T>(
        &mut self,
        params: &[TypeParam],
        args: &[TypeExpr],
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        if params.is_empty() {
            return f(self);
        }
        let mut scope = HashMap::new();
        for (i, param) in params.iter().enumerate() {
            let bound = match (args.get(i), &param.default, &param.constraint) {
                (Some(arg), _, _) => self.resolve(arg),
                (None, Some(default), _) => self.resolve(default),
                (None, None, Some(constraint)) => self.resolve(constraint),
                (None, None, None) => ParsedType::primitive("unknown"),
            };
            scope.insert(param.name.clone(), bound);
        }
        self.scopes.push(scope);
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// Resolve a type expression.
    pub(crate) fn resolve(&mut self, ty: &TypeExpr) -> ParsedType {
        self.depth += 1;
        let resolved = if self.depth > MAX_DEPTH * 4 {
            self.diagnostics
                .push(format!("type '{}' nested too deeply; treated as object", ty.emit()));
            opaque(&ty.emit())
        } else {
            self.resolve_inner(ty)
        };
        self.depth -= 1;
        resolved
    }

    fn resolve_inner(&mut self, ty: &TypeExpr) -> ParsedType {
        let raw = ty.emit();
        match ty {
            TypeExpr::Keyword(word) => match word.as_str() {
                "this" => opaque(&raw),
                "bigint" => ParsedType { raw, ..ParsedType::primitive("number") },
                "symbol" => ParsedType::unknown("symbol", &raw),
                other => ParsedType::primitive(other),
            },
            TypeExpr::StringLiteral(value) => ParsedType::string_literal(value),
            TypeExpr::NumberLiteral(_) => ParsedType { raw, ..ParsedType::primitive("number") },
            TypeExpr::BooleanLiteral(_) => ParsedType { raw, ..ParsedType::primitive("boolean") },
            TypeExpr::TemplateLiteral(_) => ParsedType { raw, ..ParsedType::primitive("string") },
            TypeExpr::Array(inner) => {
                let element = self.resolve(inner);
                array_of(element, raw)
            }
            TypeExpr::Tuple(items) => {
                let resolved: Vec<ParsedType> = items.iter().map(|t| self.resolve(t)).collect();
                let element = match resolved.first() {
                    Some(first) if resolved.iter().all(|t| t.name == first.name) => first.clone(),
                    _ => ParsedType::primitive("unknown"),
                };
                array_of(element, raw)
            }
            TypeExpr::Union(members) => self.resolve_union(members, raw),
            TypeExpr::Intersection(members) => self.resolve_intersection(members, raw),
            TypeExpr::Function {
                type_params,
                params,
                returns,
            } => self.with_type_params(type_params, &[], |r| r.function(params, returns, None, raw)),
            TypeExpr::Object(members) => self.resolve_object(members, raw),
            TypeExpr::TypeQuery(name) => self.resolve_type_query(name, raw),
            TypeExpr::Keyof(_) => ParsedType { raw, ..ParsedType::primitive("string") },
            TypeExpr::IndexedAccess { object, index } => self.resolve_indexed(object, index, raw),
            TypeExpr::Opaque(_) => ParsedType { raw, ..ParsedType::primitive("unknown") },
            TypeExpr::Reference { name, args } => self.resolve_reference(name, args, raw),
        }
    }

    fn function(
        &mut self,
        params: &[Param],
        returns: &TypeExpr,
        doc: Option<&JsDoc>,
        raw: String,
    ) -> ParsedType {
        let params = self.resolve_params(params, doc);
        let returns = self.resolve(returns);
        ParsedType {
            name: "function".to_string(),
            raw,
            nullable: false,
            kind: TypeKind::Function {
                params,
                returns: Box::new(returns),
            },
        }
    }

    /// Resolve a parameter list, attaching `@param` text from `doc`.
    pub(crate) fn resolve_params(&mut self, params: &[Param], doc: Option<&JsDoc>) -> Vec<ParsedParameter> {
        let destructured = params.iter().filter(|p| p.destructured).count();
        let mut index = 0;
        params
            .iter()
            .filter(|p| p.name != "this")
            .map(|param| {
                let name = if param.destructured {
                    index += 1;
                    if destructured > 1 {
                        format!("options{index}")
                    } else {
                        "options".to_string()
                    }
                } else {
                    param.name.clone()
                };
                let ty = match &param.ty {
                    Some(ty) => self.resolve(ty),
                    None => ParsedType::primitive("any"),
                };
                let description = doc
                    .and_then(|d| d.param(&name).or_else(|| d.param(&param.name)))
                    .filter(|d| !d.is_empty())
                    .map(str::to_string);
                ParsedParameter {
                    name,
                    ty,
                    optional: param.optional,
                    description,
                }
            })
            .collect()
    }

    /// Properties of an object literal or interface body.
    fn resolve_members(&mut self, members: &[Member]) -> Vec<ParsedProperty> {
        let mut properties: Vec<ParsedProperty> = Vec::new();
        for member in members {
            let Some(value) = member.value_type() else {
                continue;
            };
            let property = ParsedProperty {
                name: member.name.clone(),
                ty: self.resolve(&value),
                optional: member.optional,
                description: member.doc.as_ref().and_then(|d| d.description.clone()),
            };
            // Later declarations override (interface merging, extends)
            if let Some(existing) = properties.iter_mut().find(|p| p.name == property.name) {
                *existing = property;
            } else {
                properties.push(property);
            }
        }
        properties
    }

    fn resolve_object(&mut self, members: &[Member], raw: String) -> ParsedType {
        // A bare index signature is a dictionary
        if let [
            Member {
                kind: MemberKind::Index { key, value },
                ..
            },
        ] = members
        {
            return self.record(key, value, raw);
        }
        // Callable object: the first call signature is the value
        if let Some(MemberKind::Call { type_params, params, returns }) = members
            .iter()
            .map(|m| &m.kind)
            .find(|k| matches!(k, MemberKind::Call { .. }))
        {
            return self.with_type_params(type_params, &[], |r| r.function(params, returns, None, raw));
        }
        let properties = self.resolve_members(members);
        ParsedType::object("object", &raw, properties)
    }

    fn record(&mut self, key: &TypeExpr, value: &TypeExpr, raw: String) -> ParsedType {
        let key = self.resolve(key);
        let value = self.resolve(value);
        ParsedType {
            name: "Record".to_string(),
            raw,
            nullable: false,
            kind: TypeKind::Record {
                key: Box::new(key),
                value: Box::new(value),
            },
        }
    }

    fn resolve_type_query(&mut self, name: &str, raw: String) -> ParsedType {
        let Some(decl) = self.symbols.value(name) else {
            return ParsedType::unknown(name, &raw);
        };
        if self.stack.iter().any(|n| n == name) {
            return opaque(&raw);
        }
        self.stack.push(name.to_string());
        let resolved = match &decl.kind {
            DeclKind::Function {
                type_params,
                params,
                returns,
            } => {
                let doc = decl.doc.clone();
                self.with_type_params(type_params, &[], |r| r.function(params, returns, doc.as_ref(), raw))
            }
            DeclKind::Variable { ty: Some(ty) } => self.resolve(ty),
            _ => ParsedType::unknown(name, &raw),
        };
        self.stack.pop();
        resolved
    }

    fn resolve_indexed(&mut self, object: &TypeExpr, index: &TypeExpr, raw: String) -> ParsedType {
        // Parameters<F>[n]
        if let (TypeExpr::Reference { name, args }, TypeExpr::NumberLiteral(n)) = (object, index) {
            if name == "Parameters" {
                if let Some(function) = args.first() {
                    let resolved = self.resolve(function);
                    if let TypeKind::Function { params, .. } = resolved.kind {
                        let position = n.parse::<usize>().unwrap_or(usize::MAX);
                        if let Some(param) = params.into_iter().nth(position) {
                            return param.ty;
                        }
                    }
                }
            }
        }
        let container = self.resolve(object);
        match (&container.kind, index) {
            (TypeKind::Object { properties }, TypeExpr::StringLiteral(key)) => properties
                .iter()
                .find(|p| &p.name == key)
                .map_or_else(|| ParsedType { raw: raw.clone(), ..ParsedType::primitive("unknown") }, |p| p.ty.clone()),
            (TypeKind::Array { element }, TypeExpr::NumberLiteral(_) | TypeExpr::Keyword(_)) => {
                (**element).clone()
            }
            _ => ParsedType { raw, ..ParsedType::primitive("unknown") },
        }
    }

    // =========================================================================
    // Unions and intersections
    // =========================================================================

    fn resolve_union(&mut self, members: &[TypeExpr], raw: String) -> ParsedType {
        let mut nullable = false;
        let mut resolved: Vec<ParsedType> = Vec::new();
        for member in members {
            let ty = self.resolve(member);
            match &ty.kind {
                TypeKind::Primitive if ty.name == "null" || ty.name == "undefined" => nullable = true,
                // Flatten anonymous nested unions
                TypeKind::Union { members: inner, discriminated: None } if ty.name == "union" => {
                    nullable |= ty.nullable;
                    resolved.extend(inner.iter().cloned());
                }
                _ => resolved.push(ty),
            }
        }

        // `true | false` is `boolean`
        let booleans = resolved
            .iter()
            .filter(|t| matches!(t.kind, TypeKind::Primitive) && t.name == "boolean")
            .count();
        if booleans > 1 {
            let mut seen = false;
            resolved.retain(|t| {
                let is_bool = matches!(t.kind, TypeKind::Primitive) && t.name == "boolean";
                let keep = !is_bool || !seen;
                seen |= is_bool;
                keep
            });
            for t in &mut resolved {
                if matches!(t.kind, TypeKind::Primitive) && t.name == "boolean" {
                    t.raw = "boolean".to_string();
                }
            }
        }

        if resolved.is_empty() {
            let mut only = ParsedType::primitive("null");
            only.raw = raw;
            return only;
        }
        if resolved.len() == 1 {
            let mut only = resolved.remove(0);
            only.nullable |= nullable;
            return only;
        }

        let discriminated = discriminate(&resolved);
        ParsedType {
            name: "union".to_string(),
            raw,
            nullable,
            kind: TypeKind::Union {
                members: resolved,
                discriminated,
            },
        }
    }

    fn resolve_intersection(&mut self, members: &[TypeExpr], raw: String) -> ParsedType {
        let resolved: Vec<ParsedType> = members.iter().map(|m| self.resolve(m)).collect();
        if resolved
            .iter()
            .all(|t| matches!(t.kind, TypeKind::Object { .. }))
        {
            let mut properties: Vec<ParsedProperty> = Vec::new();
            for part in resolved {
                for property in part.properties() {
                    if let Some(existing) = properties.iter_mut().find(|p| p.name == property.name) {
                        *existing = property.clone();
                    } else {
                        properties.push(property.clone());
                    }
                }
            }
            return ParsedType::object("object", &raw, properties);
        }
        resolved
            .into_iter()
            .find(|t| !matches!(t.kind, TypeKind::Object { .. }))
            .unwrap_or_else(|| opaque(&raw))
    }

    // =========================================================================
    // References
    // =========================================================================

    fn resolve_reference(&mut self, name: &str, args: &[TypeExpr], raw: String) -> ParsedType {
        if args.is_empty() {
            if let Some(bound) = self.scopes.iter().rev().find_map(|s| s.get(name)) {
                return bound.clone();
            }
        }
        if let Some(builtin) = self.resolve_builtin(name, args, &raw) {
            return builtin;
        }

        let has_symbol = self.symbols.interface(name).is_some()
            || self.symbols.alias(name).is_some()
            || self.symbols.enumeration(name).is_some()
            || self.symbols.class(name).is_some();
        if !has_symbol {
            return ParsedType::unknown(name, &raw);
        }

        if self.stack.iter().any(|n| n == name) || self.stack.len() >= MAX_DEPTH {
            self.diagnostics.push(format!(
                "type '{name}' is reachable from itself; nested occurrence treated as object"
            ));
            return ParsedType::object(name, &raw, Vec::new());
        }

        self.stack.push(name.to_string());
        let resolved = self.resolve_symbol(name, args, raw);
        self.stack.pop();
        resolved
    }

    fn resolve_symbol(&mut self, name: &str, args: &[TypeExpr], raw: String) -> ParsedType {
        let symbols = self.symbols;
        if let Some(decls) = symbols.interface(name) {
            let decls = decls.clone();
            let display = decls.first().map_or(name, |d| d.name.as_str()).to_string();
            let mut properties: Vec<ParsedProperty> = Vec::new();
            let mut call: Option<ParsedType> = None;
            for decl in decls {
                let DeclKind::Interface {
                    type_params,
                    extends,
                    members,
                } = &decl.kind
                else {
                    continue;
                };
                self.with_type_params(type_params, args, |r| {
                    for parent in extends {
                        let parent = r.resolve(parent);
                        merge_properties(&mut properties, parent.properties());
                    }
                    if call.is_none() {
                        if let Some(MemberKind::Call { type_params, params, returns }) =
                            members.iter().map(|m| &m.kind).find(|k| matches!(k, MemberKind::Call { .. }))
                        {
                            call = Some(r.with_type_params(type_params, &[], |r| {
                                r.function(params, returns, None, raw.clone())
                            }));
                        }
                    }
                    let own = r.resolve_members(members);
                    merge_properties(&mut properties, &own);
                });
            }
            if let Some(function) = call {
                return function;
            }
            return ParsedType::object(&display, &raw, properties);
        }

        if let Some(decl) = symbols.alias(name) {
            let DeclKind::TypeAlias { type_params, ty } = &decl.kind else {
                return ParsedType::unknown(name, &raw);
            };
            let mut resolved = self.with_type_params(type_params, args, |r| r.resolve(ty));
            let nominal = matches!(
                ty,
                TypeExpr::Object(_) | TypeExpr::Intersection(_) | TypeExpr::Union(_)
            ) && matches!(
                resolved.kind,
                TypeKind::Object { .. } | TypeKind::Union { .. }
            ) && matches!(resolved.name.as_str(), "object" | "union");
            if nominal {
                resolved.name = decl.name.clone();
                resolved.raw = raw;
            }
            return resolved;
        }

        if let Some(decl) = symbols.enumeration(name) {
            let DeclKind::Enum { members } = &decl.kind else {
                return ParsedType::unknown(name, &raw);
            };
            let values: Vec<ParsedType> = members
                .iter()
                .map(|m| ParsedType::string_literal(&enum_value(&m.name, m.init.as_deref())))
                .collect();
            return ParsedType {
                name: decl.name.clone(),
                raw,
                nullable: false,
                kind: TypeKind::Union {
                    members: values,
                    discriminated: None,
                },
            };
        }

        if let Some(decl) = symbols.class(name) {
            if let DeclKind::Class { members, .. } = &decl.kind {
                let fields: Vec<Member> = members
                    .iter()
                    .filter(|m| matches!(m.kind, MemberKind::Property(_)))
                    .cloned()
                    .collect();
                let properties = self.resolve_members(&fields);
                return ParsedType::object(&decl.name, &raw, properties);
            }
        }

        ParsedType::unknown(name, &raw)
    }

    fn resolve_builtin(&mut self, name: &str, args: &[TypeExpr], raw: &str) -> Option<ParsedType> {
        let first = |r: &mut Self| -> ParsedType {
            args.first()
                .map_or_else(|| ParsedType::primitive("unknown"), |a| r.resolve(a))
        };
        let resolved = match name {
            "Promise" | "PromiseLike" => {
                let inner = args
                    .first()
                    .map_or_else(|| ParsedType::primitive("void"), |a| self.resolve(a));
                ParsedType {
                    name: "Promise".to_string(),
                    raw: raw.to_string(),
                    nullable: false,
                    kind: TypeKind::Promise {
                        resolved: Box::new(inner),
                    },
                }
            }
            "Array" | "ReadonlyArray" | "Set" | "ReadonlySet" => {
                let element = first(self);
                array_of(element, raw.to_string())
            }
            "Record" | "Map" | "ReadonlyMap" => match args {
                [key, value] => self.record(key, value, raw.to_string()),
                _ => return None,
            },
            "Partial" | "Required" => {
                let mut inner = first(self);
                let optional = name == "Partial";
                if let TypeKind::Object { properties } = &mut inner.kind {
                    for property in properties {
                        property.optional = optional;
                    }
                }
                inner
            }
            "Readonly" => first(self),
            "NonNullable" => {
                let mut inner = first(self);
                inner.nullable = false;
                inner
            }
            "Awaited" => first(self).unwrap_promise().clone(),
            "ReturnType" => {
                let function = first(self);
                match function.kind {
                    TypeKind::Function { returns, .. } => *returns,
                    _ => ParsedType::primitive("unknown"),
                }
            }
            "Pick" | "Omit" => {
                let mut inner = first(self);
                let keys = literal_keys(args.get(1));
                let pick = name == "Pick";
                if let TypeKind::Object { properties } = &mut inner.kind {
                    properties.retain(|p| keys.contains(&p.name) == pick);
                }
                inner.name = "object".to_string();
                inner.raw = raw.to_string();
                inner
            }
            "Exclude" | "Extract" => {
                let mut inner = first(self);
                let keys = literal_keys(args.get(1));
                let extract = name == "Extract";
                if let TypeKind::Union { members, .. } = &mut inner.kind {
                    members.retain(|m| {
                        m.as_string_literal()
                            .is_some_and(|v| keys.iter().any(|k| k == v))
                            == extract
                    });
                    if members.len() == 1 {
                        return Some(members.remove(0));
                    }
                }
                inner
            }
            "Date" | "Error" | "ArrayBuffer" | "Uint8Array" => ParsedType::primitive(name),
            "String" => ParsedType::primitive("string"),
            "Number" => ParsedType::primitive("number"),
            "Boolean" => ParsedType::primitive("boolean"),
            "Object" => ParsedType::primitive("object"),
            "Function" => ParsedType {
                name: "function".to_string(),
                raw: raw.to_string(),
                nullable: false,
                kind: TypeKind::Function {
                    params: Vec::new(),
                    returns: Box::new(ParsedType::primitive("void")),
                },
            },
            dom if DOM_TYPES.contains(dom) => opaque(raw),
            _ => return None,
        };
        Some(resolved)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// The opaque `object` placeholder.
fn opaque(raw: &str) -> ParsedType {
    ParsedType {
        raw: raw.to_string(),
        ..ParsedType::primitive("object")
    }
}

fn array_of(element: ParsedType, raw: String) -> ParsedType {
    ParsedType {
        name: format!("{}[]", element.name),
        raw,
        nullable: false,
        kind: TypeKind::Array {
            element: Box::new(element),
        },
    }
}

fn merge_properties(into: &mut Vec<ParsedProperty>, from: &[ParsedProperty]) {
    for property in from {
        if let Some(existing) = into.iter_mut().find(|p| p.name == property.name) {
            *existing = property.clone();
        } else {
            into.push(property.clone());
        }
    }
}

/// Success payload plus error codes: exactly one object and at least one
/// string literal, nothing else.
fn discriminate(members: &[ParsedType]) -> Option<DiscriminatedUnion> {
    let objects: Vec<&ParsedType> = members
        .iter()
        .filter(|m| matches!(m.kind, TypeKind::Object { .. }))
        .collect();
    let codes: Vec<String> = members
        .iter()
        .filter_map(|m| m.as_string_literal().map(str::to_string))
        .collect();
    if objects.len() != 1 || codes.is_empty() || objects.len() + codes.len() != members.len() {
        return None;
    }
    Some(DiscriminatedUnion {
        success: Box::new(objects[0].clone()),
        error_codes: codes,
    })
}

/// String keys named by `'a' | 'b'`.
fn literal_keys(ty: Option<&TypeExpr>) -> Vec<String> {
    match ty {
        Some(TypeExpr::StringLiteral(s)) => vec![s.clone()],
        Some(TypeExpr::Union(items)) => items
            .iter()
            .filter_map(|t| match t {
                TypeExpr::StringLiteral(s) => Some(s.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Runtime value of an enum member: its string initializer, else its name.
pub(crate) fn enum_value(name: &str, init: Option<&str>) -> String {
    init.map(str::trim)
        .and_then(|i| {
            let quoted = (i.starts_with('"') && i.ends_with('"'))
                || (i.starts_with('\'') && i.ends_with('\''));
            (quoted && i.len() >= 2).then(|| i[1..i.len() - 1].to_string())
        })
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::parser::declarations::parse_source;

    fn resolve_alias(source: &str, alias: &str) -> ParsedType {
        let files = vec![parse_source("a.d.ts", source).unwrap()];
        assert!(files[0].errors.is_empty(), "{:?}", files[0].errors);
        let symbols = SymbolTable::build(&files);
        let mut resolver = Resolver::new(&symbols);
        let target = TypeExpr::Reference {
            name: alias.to_string(),
            args: Vec::new(),
        };
        resolver.resolve(&target)
    }

    #[test]
    fn test_nullable_folding_and_boolean_collapse() {
        let ty = resolve_alias("type T = string | null | undefined;", "T");
        assert_eq!(ty.name, "string");
        assert!(ty.nullable);

        let ty = resolve_alias("type B = true | false;", "B");
        assert_eq!(ty.name, "boolean");
        assert!(matches!(ty.kind, TypeKind::Primitive));
    }

    #[test]
    fn test_discriminated_union() {
        let ty = resolve_alias(
            "type R = { hash: string } | 'NOT_FOUND' | 'INVALID';",
            "R",
        );
        assert_eq!(ty.name, "R");
        let d = ty.discriminated().unwrap();
        assert_eq!(d.error_codes, vec!["NOT_FOUND", "INVALID"]);
        assert!(d.success.property("hash").is_some());
    }

    #[test]
    fn test_interface_extends_and_generics() {
        let ty = resolve_alias(
            "interface Base { id: string }\ninterface Item<T> extends Base { value: T; tags?: string[] }\ntype S = Item<number>;",
            "S",
        );
        let names: Vec<&str> = ty.properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "value", "tags"]);
        assert_eq!(ty.property("value").unwrap().ty.name, "number");
        assert!(ty.property("tags").unwrap().optional);
    }

    #[test]
    fn test_enum_becomes_named_literal_union() {
        let ty = resolve_alias("enum Level { Low = 'low', High = 'high' }", "Level");
        assert_eq!(ty.name, "Level");
        let TypeKind::Union { members, .. } = &ty.kind else {
            panic!("expected union");
        };
        let values: Vec<&str> = members.iter().filter_map(ParsedType::as_string_literal).collect();
        assert_eq!(values, vec!["low", "high"]);
    }

    #[test]
    fn test_cycle_produces_name_only_object() {
        let files = vec![parse_source(
            "a.d.ts",
            "interface Node2 { child: Node2; label: string }",
        )
        .unwrap()];
        let symbols = SymbolTable::build(&files);
        let mut resolver = Resolver::new(&symbols);
        let ty = resolver.resolve(&TypeExpr::Reference {
            name: "Node2".to_string(),
            args: Vec::new(),
        });
        let child = &ty.property("child").unwrap().ty;
        assert_eq!(child.name, "Node2");
        assert!(child.properties().is_empty());
        assert_eq!(resolver.diagnostics.len(), 1);
    }

    #[test]
    fn test_unresolved_reference_is_unknown_kind() {
        let ty = resolve_alias("type T = Missing;", "T");
        assert!(matches!(ty.kind, TypeKind::Unknown));
        assert_eq!(ty.name, "Missing");
    }

    #[test]
    fn test_dom_types_are_opaque_objects() {
        let ty = resolve_alias("type T = HTMLElement;", "T");
        assert_eq!(ty.name, "object");
        assert!(matches!(ty.kind, TypeKind::Primitive));
    }

    #[test]
    fn test_utility_types() {
        let ty = resolve_alias(
            "interface P { a: string; b: number; c: boolean }\ntype T = Pick<P, 'a' | 'c'>;",
            "T",
        );
        let names: Vec<&str> = ty.properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);

        let ty = resolve_alias("type T = Record<string, number>;", "T");
        assert!(matches!(ty.kind, TypeKind::Record { .. }));

        let ty = resolve_alias("type T = Promise<string[]>;", "T");
        assert_eq!(ty.unwrap_promise().name, "string[]");
    }
}
