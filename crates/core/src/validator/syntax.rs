//! Structural checks on generated files.
//!
//! These are not a compiler. They catch the template mistakes that show up
//! in practice: unbalanced delimiters, a missing `DllImport`, a jslib file
//! that never reaches `mergeInto` and a parameter declared twice in one
//! signature.

use std::collections::HashSet;

use sdkgen_common::{ValidationError, ValidationErrorKind};

use crate::generator::GeneratedFile;

const MERGE_INTO: &str = "mergeInto(LibraryManager.library";
const DLL_IMPORT: &str = "DllImport(\"__Internal\")";

/// Delimiter counts of one file, ignoring string literals and comments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balance {
    /// `{` minus `}`.
    pub braces: i64,
    /// `(` minus `)`.
    pub parens: i64,
    /// Line of the first closing delimiter without an opener.
    pub underflow: Option<usize>,
}

impl Balance {
    /// Whether every delimiter is closed in order.
    pub fn is_balanced(&self) -> bool {
        self.braces == 0 && self.parens == 0 && self.underflow.is_none()
    }
}

/// Count delimiters outside `//` and `/* */` comments and quoted literals.
pub fn balance(source: &str) -> Balance {
    let mut result = Balance::default();
    let mut chars = source.chars().peekable();
    let mut line = 1;
    let mut quote: Option<char> = None;
    let mut block_comment = false;

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
        }
        if block_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                block_comment = false;
            }
            continue;
        }
        if let Some(open) = quote {
            match c {
                '\\' => {
                    if chars.peek() == Some(&'\n') {
                        line += 1;
                    }
                    chars.next();
                }
                _ if c == open || c == '\n' => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '/' if chars.peek() == Some(&'/') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                block_comment = true;
            }
            '"' | '\'' => quote = Some(c),
            '{' => result.braces += 1,
            '(' => result.parens += 1,
            '}' | ')' => {
                let count = if c == '}' { &mut result.braces } else { &mut result.parens };
                *count -= 1;
                if *count < 0 && result.underflow.is_none() {
                    result.underflow = Some(line);
                }
            }
            _ => {}
        }
    }
    result
}

/// All syntax errors of one generated file.
pub fn check_file(file: &GeneratedFile) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let counts = balance(&file.contents);
    if !counts.is_balanced() {
        let mut message = format!(
            "{}: unbalanced delimiters (braces {:+}, parentheses {:+})",
            file.path, counts.braces, counts.parens
        );
        if let Some(line) = counts.underflow {
            message.push_str(&format!(", unexpected close on line {line}"));
        }
        errors.push(ValidationError::new(ValidationErrorKind::SyntaxError, message));
    }

    if file.path.ends_with(".cs") {
        if file.contents.contains("static extern") && !file.contents.contains(DLL_IMPORT) {
            errors.push(ValidationError::new(
                ValidationErrorKind::SyntaxError,
                format!("{}: extern methods without {DLL_IMPORT}", file.path),
            ));
        }
    } else if file.path.ends_with(".jslib") && !file.contents.contains(MERGE_INTO) {
        errors.push(ValidationError::new(
            ValidationErrorKind::SyntaxError,
            format!("{}: missing {MERGE_INTO}", file.path),
        ));
    }

    for (line, name) in duplicate_parameters(file) {
        errors.push(ValidationError::new(
            ValidationErrorKind::SyntaxError,
            format!("{}:{line}: parameter '{name}' declared more than once", file.path),
        ));
    }
    errors
}

/// Parameters repeated within one method, extern or glue signature, with
/// their 1-based line. Generated signatures always fit on one line.
fn duplicate_parameters(file: &GeneratedFile) -> Vec<(usize, String)> {
    let csharp = file.path.ends_with(".cs");
    if !csharp && !file.path.ends_with(".jslib") {
        return Vec::new();
    }

    let mut found = Vec::new();
    for (index, line) in file.contents.lines().enumerate() {
        let line = line.trim();
        let list = if csharp {
            if !(line.starts_with("public static") || line.starts_with("private static")) {
                continue;
            }
            line.find('(')
                .zip(line.rfind(')'))
                .filter(|(open, close)| open < close)
                .map(|(open, close)| &line[open + 1..close])
        } else {
            line.split_once(": function(")
                .and_then(|(_, rest)| rest.split_once(')'))
                .map(|(params, _)| params)
        };
        let Some(list) = list else {
            continue;
        };

        let mut seen = HashSet::new();
        for param in split_top_level(list) {
            // `Type name = default` in C#, a bare name in JavaScript
            let declared = param.split('=').next().unwrap_or_default().trim();
            let name = if csharp {
                declared.rsplit(char::is_whitespace).next().unwrap_or_default()
            } else {
                declared
            };
            if !name.is_empty() && !seen.insert(name) {
                found.push((index + 1, name.to_string()));
            }
        }
    }
    found
}

/// Split on commas outside `<>`, `()` and `[]`.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}
