//! Detection of the API authoring shapes.
//!
//! A declaration file exposes callable surface in four ways:
//!
//! 1. exported function declarations,
//! 2. `const` bindings whose type is a function (or `typeof` one),
//! 3. namespace objects: a `const` whose object type has callable members,
//! 4. event definitions: event namespaces (`addEventListener` objects) and
//!    event-definition classes (`name` literal plus `listener(data)`).
//!
//! Anything else that is an exported value is skipped with a warning.

use std::collections::HashSet;

use sdkgen_common::{EventInfo, ParsedApi, ParsedType, TypeKind, to_pascal_case};
use tracing::{debug, warn};

use super::jsdoc::JsDoc;
use super::resolve::{Resolver, SymbolTable};
use super::syntax::{DeclKind, Declaration, Member, MemberKind, Param, SourceFile, TypeExpr, TypeParam};
use super::{ParseOptions, ParseWarning, SkippedDeclaration};

/// Members that mark a returned value (or the function itself) as exposing
/// permission helpers.
const PERMISSION_MEMBERS: &[&str] = &["getPermission", "openPermissionDialog"];

/// Nesting limit when chasing `typeof`/alias chains to a call signature.
const MAX_SIGNATURE_DEPTH: usize = 8;

/// A call signature found behind a value's type.
struct Signature<'a> {
    type_params: &'a [TypeParam],
    params: &'a [Param],
    returns: &'a TypeExpr,
    /// Docs of the declaration the signature came from.
    doc: Option<&'a JsDoc>,
    /// Non-call members living next to the signature (`fn & { getPermission }`).
    siblings: Vec<&'a str>,
}

/// Naming of one API.
struct ApiNames {
    name: String,
    pascal_name: String,
    original_name: String,
    namespace: Option<String>,
}

pub(crate) struct Detector<'s, 'a> {
    symbols: &'s SymbolTable<'a>,
    resolver: Resolver<'s, 'a>,
    include_deprecated: bool,
    seen: HashSet<String>,
    pub(crate) apis: Vec<ParsedApi>,
    pub(crate) skipped: Vec<SkippedDeclaration>,
    pub(crate) warnings: Vec<ParseWarning>,
}

impl<'s, 'a> Detector<'s, 'a> {
    pub(crate) fn new(symbols: &'s SymbolTable<'a>, options: &ParseOptions) -> Self {
        Self {
            symbols,
            resolver: Resolver::new(symbols),
            include_deprecated: options.include_deprecated,
            seen: HashSet::new(),
            apis: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Detect every API declared in `file`.
    pub(crate) fn detect_file(&mut self, file: &'a SourceFile) {
        let barrel = is_barrel(&file.path);
        // Script-style files (no exports at all) expose every declaration
        let module = file.declarations.iter().any(|d| d.exported);
        for decl in &file.declarations {
            if module && !decl.exported {
                continue;
            }
            self.detect_declaration(file, decl, barrel);
            self.drain_diagnostics(&file.path, decl.line);
        }
    }

    fn detect_declaration(&mut self, file: &'a SourceFile, decl: &'a Declaration, barrel: bool) {
        match &decl.kind {
            DeclKind::Function {
                type_params,
                params,
                returns,
            } => {
                let signature = Signature {
                    type_params,
                    params,
                    returns,
                    doc: decl.doc.as_ref(),
                    siblings: Vec::new(),
                };
                let names = ApiNames {
                    name: decl.name.clone(),
                    pascal_name: to_pascal_case(&decl.name),
                    original_name: decl.name.clone(),
                    namespace: None,
                };
                self.push_api(file, decl, names, &signature, decl.doc.as_ref());
            }
            DeclKind::Variable { ty: Some(ty) } => self.detect_variable(file, decl, ty, barrel),
            DeclKind::Variable { ty: None } => {
                self.skip(file, decl, "variable has no type annotation");
            }
            DeclKind::Class { members, .. } => {
                if !self.detect_event_class(file, decl, members) {
                    self.skip(file, decl, "class is not an event definition");
                }
            }
            DeclKind::Interface { .. } | DeclKind::TypeAlias { .. } | DeclKind::Enum { .. } => {}
        }
    }

    fn detect_variable(&mut self, file: &'a SourceFile, decl: &'a Declaration, ty: &'a TypeExpr, barrel: bool) {
        // Event namespace
        if let Some(members) = self.symbols.object_members(ty) {
            if let Some(listener) = members.iter().find(|m| m.name == "addEventListener") {
                self.detect_event_namespace(file, decl, listener);
                return;
            }
        }

        // Function-valued const
        if let Some(signature) = self.callable_signature(ty, 0) {
            if barrel {
                return;
            }
            let names = ApiNames {
                name: decl.name.clone(),
                pascal_name: to_pascal_case(&decl.name),
                original_name: decl.name.clone(),
                namespace: None,
            };
            self.push_api(file, decl, names, &signature, decl.doc.as_ref());
            return;
        }

        // Namespace object
        if let Some(members) = self.symbols.object_members(ty) {
            let mut found = 0;
            for member in members {
                let Some(value) = member_value(member) else {
                    continue;
                };
                let Some(signature) = self.member_signature(member, value) else {
                    continue;
                };
                found += 1;
                let names = ApiNames {
                    name: format!("{}.{}", decl.name, member.name),
                    pascal_name: format!("{}{}", to_pascal_case(&decl.name), to_pascal_case(&member.name)),
                    original_name: member.name.clone(),
                    namespace: Some(decl.name.clone()),
                };
                let doc = member.doc.as_ref().or(signature.doc);
                self.push_api(file, decl, names, &signature, doc);
            }
            if found > 0 {
                return;
            }
        }

        self.skip(file, decl, "value is neither a function nor an object with callable members");
    }

    fn member_signature(&self, member: &'a Member, value: &'a TypeExpr) -> Option<Signature<'a>> {
        match &member.kind {
            MemberKind::Method {
                type_params,
                params,
                returns,
            } => Some(Signature {
                type_params,
                params,
                returns,
                doc: member.doc.as_ref(),
                siblings: Vec::new(),
            }),
            _ => self.callable_signature(value, 0),
        }
    }

    /// Follow a value type to its call signature.
    fn callable_signature(&self, ty: &'a TypeExpr, depth: usize) -> Option<Signature<'a>> {
        if depth > MAX_SIGNATURE_DEPTH {
            return None;
        }
        match ty {
            TypeExpr::Function {
                type_params,
                params,
                returns,
            } => Some(Signature {
                type_params,
                params,
                returns,
                doc: None,
                siblings: Vec::new(),
            }),
            TypeExpr::TypeQuery(name) => {
                let decl = self.symbols.value(name)?;
                match &decl.kind {
                    DeclKind::Function {
                        type_params,
                        params,
                        returns,
                    } => Some(Signature {
                        type_params,
                        params,
                        returns,
                        doc: decl.doc.as_ref(),
                        siblings: Vec::new(),
                    }),
                    DeclKind::Variable { ty: Some(inner) } => {
                        let mut signature = self.callable_signature(inner, depth + 1)?;
                        signature.doc = signature.doc.or(decl.doc.as_ref());
                        Some(signature)
                    }
                    _ => None,
                }
            }
            TypeExpr::Reference { name, args } => {
                if let Some(alias) = self.symbols.alias(name) {
                    if let DeclKind::TypeAlias { type_params, ty: inner } = &alias.kind {
                        // `type Wrapped<T> = T & { ... }`: substitute direct uses of T
                        return match inner {
                            TypeExpr::Intersection(parts) => self.intersection_signature(
                                parts.iter().map(|p| bind_type_param(p, type_params, args)),
                                depth,
                            ),
                            other => self.callable_signature(bind_type_param(other, type_params, args), depth + 1),
                        };
                    }
                }
                let members = self.symbols.named_members(name)?;
                call_signature(&members)
            }
            TypeExpr::Object(members) => {
                let members: Vec<&Member> = members.iter().collect();
                call_signature(&members)
            }
            TypeExpr::Intersection(parts) => self.intersection_signature(parts.iter(), depth),
            _ => None,
        }
    }

    fn intersection_signature(
        &self,
        parts: impl Iterator<Item = &'a TypeExpr>,
        depth: usize,
    ) -> Option<Signature<'a>> {
        let mut signature: Option<Signature<'a>> = None;
        let mut siblings = Vec::new();
        for part in parts {
            if signature.is_none() {
                if let Some(found) = self.callable_signature(part, depth + 1) {
                    siblings.extend(found.siblings.iter().copied());
                    signature = Some(found);
                    continue;
                }
            }
            if let Some(members) = self.symbols.object_members(part) {
                siblings.extend(members.iter().map(|m| m.name.as_str()));
            }
        }
        signature.map(|mut s| {
            s.siblings = siblings;
            s
        })
    }

    // =========================================================================
    // Events
    // =========================================================================

    fn detect_event_namespace(&mut self, file: &'a SourceFile, decl: &'a Declaration, listener: &'a Member) {
        let namespace = decl.name.as_str();
        let map_name = event_map_name(listener).unwrap_or_else(|| to_pascal_case(namespace));
        let Some(entries) = self.symbols.named_members(&map_name) else {
            self.skip(
                file,
                decl,
                &format!("event namespace has no event map '{map_name}'"),
            );
            return;
        };

        let prefix = to_pascal_case(namespace);
        let prefix = prefix.strip_suffix("Event").unwrap_or(&prefix).to_string();
        let mut found = 0;
        for entry in entries {
            let Some(value) = entry.value_type() else {
                continue;
            };
            let resolved = self.resolver.resolve(&value);
            let Some(on_event) = resolved.property("onEvent") else {
                continue;
            };
            let fallback = format!("{prefix}{}Data", to_pascal_case(&entry.name));
            let data = event_payload(&on_event.ty, &fallback);
            found += 1;

            let name = format!("{namespace}.{}", entry.name);
            let description = entry
                .doc
                .as_ref()
                .and_then(|d| d.description.clone())
                .unwrap_or_else(|| format!("Subscribes to the {name} event."));
            let api = event_api(
                ApiNames {
                    pascal_name: format!("{}Subscribe{}", to_pascal_case(namespace), to_pascal_case(&entry.name)),
                    name,
                    original_name: "addEventListener".to_string(),
                    namespace: Some(namespace.to_string()),
                },
                &file.path,
                description,
                EventInfo {
                    event_name: entry.name.clone(),
                    data,
                },
            );
            self.record(api, decl.line, &file.path);
        }
        if found == 0 {
            self.skip(file, decl, &format!("event map '{map_name}' lists no subscribable events"));
        }
    }

    /// Classes with a literal `name` field and a `listener(data)` method.
    fn detect_event_class(&mut self, file: &'a SourceFile, decl: &'a Declaration, members: &'a [Member]) -> bool {
        let event_name = members.iter().find_map(|m| match &m.kind {
            MemberKind::Property(TypeExpr::StringLiteral(value)) if m.name == "name" => Some(value.clone()),
            _ => None,
        });
        let listener = members.iter().find_map(|m| match &m.kind {
            MemberKind::Method { params, .. } if m.name == "listener" => Some(params),
            _ => None,
        });
        let (Some(event_name), Some(params)) = (event_name, listener) else {
            return false;
        };
        if self.is_excluded_deprecated(decl.doc.as_ref(), &decl.name) {
            return true;
        }

        let data = params.first().and_then(|p| p.ty.as_ref()).and_then(|ty| {
            let resolved = self.resolver.resolve(ty);
            let fallback = format!("{}Data", decl.name);
            normalize_payload(resolved, &fallback)
        });
        let description = decl
            .doc
            .as_ref()
            .and_then(|d| d.description.clone())
            .unwrap_or_else(|| format!("Subscribes to the {event_name} event."));
        let api = event_api(
            ApiNames {
                name: decl.name.clone(),
                pascal_name: format!("Subscribe{}", to_pascal_case(&event_name)),
                original_name: "addEventListener".to_string(),
                namespace: None,
            },
            &file.path,
            description,
            EventInfo { event_name, data },
        );
        self.record(api, decl.line, &file.path);
        true
    }

    // =========================================================================
    // Recording
    // =========================================================================

    fn push_api(
        &mut self,
        file: &SourceFile,
        decl: &Declaration,
        names: ApiNames,
        signature: &Signature<'a>,
        doc: Option<&'a JsDoc>,
    ) {
        if self.seen.contains(&names.name) {
            // Later overloads of an already recorded function
            return;
        }
        let doc = doc.or(signature.doc);
        if self.is_excluded_deprecated(doc, &names.name) {
            return;
        }

        let (parameters, return_type) = self.resolver.with_type_params(signature.type_params, &[], |r| {
            (r.resolve_params(signature.params, doc), r.resolve(signature.returns))
        });

        let has_permission = signature
            .siblings
            .iter()
            .any(|m| PERMISSION_MEMBERS.contains(m))
            || return_type
                .unwrap_promise()
                .properties()
                .iter()
                .any(|p| PERMISSION_MEMBERS.contains(&p.name.as_str()));

        let api = ParsedApi {
            name: names.name,
            pascal_name: names.pascal_name,
            original_name: names.original_name,
            category: String::new(),
            file: file.path.clone(),
            namespace: names.namespace,
            description: doc.and_then(|d| d.description.clone()),
            return_description: doc.and_then(|d| d.returns.clone()),
            examples: doc.map(|d| d.examples.clone()).unwrap_or_default(),
            parameters,
            is_async: return_type.is_promise(),
            return_type,
            has_permission,
            deprecated: doc.and_then(|d| d.deprecated.clone()),
            event: None,
        };
        self.record(api, decl.line, &file.path);
    }

    fn record(&mut self, api: ParsedApi, line: usize, file: &str) {
        if !self.seen.insert(api.name.clone()) {
            return;
        }
        debug!(api = %api.name, file = %file, line, "Detected API");
        self.apis.push(api);
    }

    fn is_excluded_deprecated(&self, doc: Option<&JsDoc>, name: &str) -> bool {
        let deprecated = doc.is_some_and(|d| d.deprecated.is_some());
        if deprecated && !self.include_deprecated {
            debug!(api = %name, "Skipping deprecated declaration");
            return true;
        }
        false
    }

    fn skip(&mut self, file: &SourceFile, decl: &Declaration, reason: &str) {
        warn!(file = %file.path, line = decl.line, name = %decl.name, "Skipping declaration: {reason}");
        self.warnings.push(ParseWarning {
            file: file.path.clone(),
            line: decl.line,
            message: format!("'{}' skipped: {reason}", decl.name),
        });
        self.skipped.push(SkippedDeclaration {
            name: decl.name.clone(),
            file: file.path.clone(),
            line: decl.line,
            reason: reason.to_string(),
        });
    }

    fn drain_diagnostics(&mut self, file: &str, line: usize) {
        for message in self.resolver.diagnostics.drain(..) {
            warn!(file = %file, line, "{message}");
            self.warnings.push(ParseWarning {
                file: file.to_string(),
                line,
                message,
            });
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// `index.d.ts` only re-exports; it contributes namespace, event and
/// function shapes but no const-bound functions.
fn is_barrel(path: &str) -> bool {
    path.rsplit('/').next() == Some("index.d.ts")
}

fn member_value(member: &Member) -> Option<&TypeExpr> {
    match &member.kind {
        MemberKind::Property(ty) => Some(ty),
        MemberKind::Method { returns, .. } => Some(returns),
        MemberKind::Call { .. } | MemberKind::Index { .. } => None,
    }
}

/// The first call signature of an object type, with its other members.
fn call_signature<'a>(members: &[&'a Member]) -> Option<Signature<'a>> {
    let call = members.iter().find_map(|m| match &m.kind {
        MemberKind::Call {
            type_params,
            params,
            returns,
        } => Some((type_params, params, returns, m.doc.as_ref())),
        _ => None,
    })?;
    Some(Signature {
        type_params: call.0,
        params: call.1,
        returns: call.2,
        doc: call.3,
        siblings: members
            .iter()
            .filter(|m| !m.name.is_empty())
            .map(|m| m.name.as_str())
            .collect(),
    })
}

/// The argument bound to `ty` when it names one of `params`.
fn bind_type_param<'a>(ty: &'a TypeExpr, params: &[TypeParam], args: &'a [TypeExpr]) -> &'a TypeExpr {
    if let TypeExpr::Reference { name, args: own } = ty {
        if own.is_empty() {
            if let Some(index) = params.iter().position(|p| &p.name == name) {
                return args.get(index).unwrap_or(ty);
            }
        }
    }
    ty
}

/// `addEventListener<K extends keyof Map>(...)` -> `Map`
fn event_map_name(listener: &Member) -> Option<String> {
    let type_params = match &listener.kind {
        MemberKind::Method { type_params, .. } => type_params,
        MemberKind::Property(TypeExpr::Function { type_params, .. }) => type_params,
        _ => return None,
    };
    type_params.iter().find_map(|tp| match &tp.constraint {
        Some(TypeExpr::Keyof(inner)) => match inner.as_ref() {
            TypeExpr::Reference { name, .. } => Some(name.clone()),
            _ => None,
        },
        _ => None,
    })
}

/// Payload delivered by an `onEvent` handler.
fn event_payload(on_event: &ParsedType, fallback: &str) -> Option<ParsedType> {
    match &on_event.kind {
        TypeKind::Function { params, .. } => params
            .first()
            .and_then(|p| normalize_payload(p.ty.clone(), fallback)),
        _ => None,
    }
}

/// Drop void payloads and name anonymous object payloads.
fn normalize_payload(mut ty: ParsedType, fallback: &str) -> Option<ParsedType> {
    if ty.is_void() {
        return None;
    }
    if matches!(ty.kind, TypeKind::Object { .. }) && ty.name == "object" {
        ty.name = fallback.to_string();
    }
    Some(ty)
}

fn event_api(names: ApiNames, file: &str, description: String, event: EventInfo) -> ParsedApi {
    ParsedApi {
        name: names.name,
        pascal_name: names.pascal_name,
        original_name: names.original_name,
        category: String::new(),
        file: file.to_string(),
        namespace: names.namespace,
        description: Some(description),
        return_description: None,
        examples: Vec::new(),
        parameters: Vec::new(),
        return_type: ParsedType {
            name: "function".to_string(),
            raw: "() => void".to_string(),
            nullable: false,
            kind: TypeKind::Function {
                params: Vec::new(),
                returns: Box::new(ParsedType::primitive("void")),
            },
        },
        is_async: false,
        has_permission: false,
        deprecated: None,
        event: Some(event),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::parser::declarations::parse_source;

    fn detect(sources: &[(&str, &str)], include_deprecated: bool) -> (Vec<ParsedApi>, Vec<SkippedDeclaration>) {
        let files: Vec<SourceFile> = sources
            .iter()
            .map(|(path, source)| parse_source(path, source).unwrap())
            .collect();
        let symbols = SymbolTable::build(&files);
        let options = ParseOptions { include_deprecated };
        let mut detector = Detector::new(&symbols, &options);
        for file in &files {
            detector.detect_file(file);
        }
        (detector.apis, detector.skipped)
    }

    #[test]
    fn test_plain_function_and_first_overload() {
        let (apis, _) = detect(
            &[(
                "getDeviceId.d.ts",
                "/** Returns the device id. */\nexport declare function getDeviceId(): string;\nexport declare function getDeviceId(x: number): string;",
            )],
            false,
        );
        assert_eq!(apis.len(), 1);
        assert_eq!(apis[0].name, "getDeviceId");
        assert_eq!(apis[0].pascal_name, "GetDeviceId");
        assert!(apis[0].parameters.is_empty());
        assert!(!apis[0].is_async);
        assert_eq!(apis[0].description.as_deref(), Some("Returns the device id."));
    }

    #[test]
    fn test_namespace_object_members() {
        let (apis, _) = detect(
            &[(
                "storage.d.ts",
                "declare function getItem(key: string): Promise<string | null>;\n\
                 export declare const Storage: {\n  getItem: typeof getItem;\n  /** Stores a value. */\n  setItem: (key: string, value: string) => Promise<void>;\n  version: string;\n};",
            )],
            false,
        );
        let names: Vec<&str> = apis.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Storage.getItem", "Storage.setItem"]);
        assert_eq!(apis[0].pascal_name, "StorageGetItem");
        assert_eq!(apis[0].original_name, "getItem");
        assert!(apis[0].is_async);
        assert!(apis[0].return_type.unwrap_promise().nullable);
        assert_eq!(apis[1].description.as_deref(), Some("Stores a value."));
    }

    #[test]
    fn test_const_function_with_permission_helpers() {
        let (apis, _) = detect(
            &[(
                "getClipboardText.d.ts",
                "type PermissionFn<T> = T & { getPermission(): Promise<string>; openPermissionDialog(): Promise<string> };\n\
                 export declare const getClipboardText: PermissionFn<() => Promise<string>>;\n\
                 export declare const openCamera: { (options: { base64: boolean }): Promise<string>; getPermission(): Promise<string> };",
            )],
            false,
        );
        let clipboard = apis.iter().find(|a| a.name == "getClipboardText").unwrap();
        assert!(clipboard.has_permission);
        assert!(clipboard.is_async);
        assert!(!apis.iter().any(|a| a.name.starts_with("getClipboardText.")));
        let camera = apis.iter().find(|a| a.name == "openCamera").unwrap();
        assert!(camera.has_permission);
        assert_eq!(camera.parameters[0].name, "options");
    }

    #[test]
    fn test_event_namespace() {
        let (apis, _) = detect(
            &[(
                "events.d.ts",
                "export type GraniteEvent = { backEvent: { onEvent: () => void; onError?: (e: Error) => void } };\n\
                 export type TdsEvent = { navigationAccessoryEvent: { onEvent: (data: { id: string }) => void } };\n\
                 export declare const graniteEvent: { addEventListener<K extends keyof GraniteEvent>(event: K, handlers: GraniteEvent[K]): () => void };\n\
                 export declare const tdsEvent: { addEventListener<K extends keyof TdsEvent>(event: K, handlers: TdsEvent[K]): () => void };",
            )],
            false,
        );
        assert_eq!(apis.len(), 2);
        assert_eq!(apis[0].name, "graniteEvent.backEvent");
        assert_eq!(apis[0].pascal_name, "GraniteEventSubscribeBackEvent");
        assert!(apis[0].event.as_ref().unwrap().data.is_none());
        let tds = apis[1].event.as_ref().unwrap();
        assert_eq!(tds.event_name, "navigationAccessoryEvent");
        assert_eq!(
            tds.data.as_ref().unwrap().name,
            "TdsNavigationAccessoryEventData"
        );
    }

    #[test]
    fn test_event_definition_class() {
        let (apis, _) = detect(
            &[(
                "entry.d.ts",
                "export declare class EntryMessageExitedEvent extends GraniteEventDefinition<void, void> {\n  name: \"entryMessageExited\";\n  remove(): void;\n  listener(_: void): void;\n}",
            )],
            false,
        );
        assert_eq!(apis[0].name, "EntryMessageExitedEvent");
        assert_eq!(apis[0].pascal_name, "SubscribeEntryMessageExited");
        assert!(apis[0].event.as_ref().unwrap().data.is_none());
    }

    #[test]
    fn test_deprecated_filter() {
        let source = "/** @deprecated use b */\nexport declare function a(): void;\nexport declare function b(): void;";
        let (apis, _) = detect(&[("x.d.ts", source)], false);
        assert_eq!(apis.len(), 1);
        let (apis, _) = detect(&[("x.d.ts", source)], true);
        assert_eq!(apis.len(), 2);
        assert_eq!(apis[0].deprecated.as_deref(), Some("use b"));
    }

    #[test]
    fn test_unclassified_value_is_skipped() {
        let (apis, skipped) = detect(&[("x.d.ts", "export declare const VERSION: string;")], false);
        assert!(apis.is_empty());
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].name, "VERSION");
    }
}
