//! Identifier helpers shared by the C# and jslib emitters.

use std::collections::HashSet;
use std::sync::LazyLock;

/// C# reserved words that cannot be used as parameter names.
pub static CSHARP_KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "abstract",
        "as",
        "base",
        "bool",
        "break",
        "byte",
        "case",
        "catch",
        "char",
        "checked",
        "class",
        "const",
        "continue",
        "decimal",
        "default",
        "delegate",
        "do",
        "double",
        "else",
        "enum",
        "event",
        "explicit",
        "extern",
        "false",
        "finally",
        "fixed",
        "float",
        "for",
        "foreach",
        "goto",
        "if",
        "implicit",
        "in",
        "int",
        "interface",
        "internal",
        "is",
        "lock",
        "long",
        "namespace",
        "new",
        "null",
        "object",
        "operator",
        "out",
        "override",
        "params",
        "private",
        "protected",
        "public",
        "readonly",
        "ref",
        "return",
        "sbyte",
        "sealed",
        "short",
        "sizeof",
        "stackalloc",
        "static",
        "string",
        "struct",
        "switch",
        "this",
        "throw",
        "true",
        "try",
        "typeof",
        "uint",
        "ulong",
        "unchecked",
        "unsafe",
        "ushort",
        "using",
        "virtual",
        "void",
        "volatile",
        "while",
    ]
    .into_iter()
    .collect()
});

/// Names the generated C# methods, externs and jslib glue declare
/// themselves, including lambda and handler parameters.
const GENERATED_LOCALS: &[&str] = &[
    // C#
    "tcs",
    "callbackId",
    "subscriptionId",
    "typeName",
    "onEvent",
    "onError",
    "result",
    "error",
    // jslib
    "callback",
    "typeNameStr",
    "subId",
    "send",
    "resolve",
    "reject",
    "unsubscribe",
];

/// Escape a parameter name for C# (`params` -> `paramsParam`).
pub fn escape_csharp_identifier(name: &str) -> String {
    let name = crate::collector::identifier(name);
    if CSHARP_KEYWORDS.contains(name.as_str()) || GENERATED_LOCALS.contains(&name.as_str()) {
        format!("{name}Param")
    } else {
        name
    }
}

/// Escape `text` for the inside of a C# regular string literal.
pub fn escape_csharp_string(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Quote `text` as a single-quoted JavaScript string literal.
pub fn js_string(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// Whether `name` can follow a `.` in JavaScript.
pub fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// `window.AppsInToss.<namespace>.<member>` with bracket access where needed.
pub fn bridge_path(namespace: Option<&str>, member: &str) -> String {
    let mut path = "window.AppsInToss".to_string();
    for segment in namespace.into_iter().chain(std::iter::once(member)) {
        if is_js_identifier(segment) {
            path.push('.');
            path.push_str(segment);
        } else {
            path.push('[');
            path.push_str(&js_string(segment));
            path.push(']');
        }
    }
    path
}
