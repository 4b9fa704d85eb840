//! Declaration-file parsing.
//!
//! [`parse_corpus`] walks a directory of `.d.ts` files, builds a syntax tree
//! per file, resolves types across the whole corpus and detects the callable
//! surface. A file that cannot be tokenized aborts the run; statement-level
//! problems never do and are returned as [`ParseWarning`]s.

mod declarations;
mod detection;
mod jsdoc;
mod lexer;
mod resolve;
mod syntax;

use std::collections::HashSet;
use std::path::Path;

use sdkgen_common::{DefinitionKind, ParsedApi, ParsedTypeDefinition, TypeKind};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use declarations::parse_source;
use detection::Detector;
use resolve::{Resolver, SymbolTable, enum_value};
use syntax::{DeclKind, SourceFile, TypeExpr};

/// Files that only aggregate or describe the bridge itself.
const SKIPPED_FILES: &[&str] = &["index.d.cts", "types.d.ts", "bridge.d.ts"];

/// Parser switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Keep `@deprecated` declarations.
    pub include_deprecated: bool,
}

/// A non-fatal problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// File relative to the corpus root.
    pub file: String,
    /// 1-based line, 0 when unknown.
    pub line: usize,
    /// What went wrong.
    pub message: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.message)
    }
}

/// An exported value that matched none of the API shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDeclaration {
    /// Declared name.
    pub name: String,
    /// File relative to the corpus root.
    pub file: String,
    /// 1-based line.
    pub line: usize,
    /// Why it was skipped.
    pub reason: String,
}

/// Everything extracted from a corpus.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    /// Detected APIs in file then declaration order.
    pub apis: Vec<ParsedApi>,
    /// Named interfaces, object aliases and string enums.
    pub type_definitions: Vec<ParsedTypeDefinition>,
    /// Collected non-fatal problems.
    pub warnings: Vec<ParseWarning>,
    /// Declarations that were not turned into APIs.
    pub skipped: Vec<SkippedDeclaration>,
}

/// Parse every declaration file under `root`.
pub fn parse_corpus(root: &Path, options: &ParseOptions) -> Result<ParseOutput, String> {
    if !root.is_dir() {
        return Err(format!("Source directory not found: {}", root.display()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| format!("Failed to walk {}: {e}", root.display()))?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !entry.file_type().is_file() || !name.ends_with(".d.ts") || SKIPPED_FILES.contains(&name) {
            continue;
        }
        if path.components().any(|c| c.as_os_str() == "node_modules") {
            continue;
        }
        paths.push(path.to_path_buf());
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let source = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        let relative = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        debug!(file = %relative, "Parsing declaration file");
        files.push(parse_source(&relative, &source)?);
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let output = analyze(&files, options);
    info!(
        files = files.len(),
        apis = output.apis.len(),
        types = output.type_definitions.len(),
        warnings = output.warnings.len(),
        "Parsed declaration corpus"
    );
    Ok(output)
}

/// Parse in-memory sources, as `(relative path, text)` pairs.
pub fn parse_sources(sources: &[(&str, &str)], options: &ParseOptions) -> Result<ParseOutput, String> {
    let mut files = sources
        .iter()
        .map(|(path, source)| parse_source(path, source))
        .collect::<Result<Vec<SourceFile>, String>>()?;
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(analyze(&files, options))
}

fn analyze(files: &[SourceFile], options: &ParseOptions) -> ParseOutput {
    let symbols = SymbolTable::build(files);
    let mut warnings = Vec::new();

    for file in files {
        for (line, message) in &file.errors {
            warn!(file = %file.path, line, "{message}");
            warnings.push(ParseWarning {
                file: file.path.clone(),
                line: *line,
                message: message.clone(),
            });
        }
    }

    let mut detector = Detector::new(&symbols, options);
    for file in files {
        detector.detect_file(file);
    }
    let type_definitions = type_definitions(files, &symbols, &mut warnings);

    warnings.append(&mut detector.warnings);
    ParseOutput {
        apis: detector.apis,
        type_definitions,
        warnings,
        skipped: detector.skipped,
    }
}

// =============================================================================
// Named type definitions
// =============================================================================

fn type_definitions(
    files: &[SourceFile],
    symbols: &SymbolTable<'_>,
    warnings: &mut Vec<ParseWarning>,
) -> Vec<ParsedTypeDefinition> {
    let mut resolver = Resolver::new(symbols);
    let mut seen = HashSet::new();
    let mut definitions = Vec::new();

    for file in files {
        if file.path.rsplit('/').next() == Some("index.d.ts") {
            continue;
        }
        for decl in &file.declarations {
            if seen.contains(decl.name.as_str()) {
                continue;
            }
            let description = decl.doc.as_ref().and_then(|d| d.description.clone());
            let kind = match &decl.kind {
                DeclKind::Interface { type_params, .. } if type_params.is_empty() => {
                    let reference = TypeExpr::Reference {
                        name: decl.name.clone(),
                        args: Vec::new(),
                    };
                    match resolver.resolve(&reference).kind {
                        TypeKind::Object { properties } => Some(DefinitionKind::Interface { properties }),
                        _ => None,
                    }
                }
                DeclKind::TypeAlias { type_params, ty } if type_params.is_empty() => {
                    let resolved = resolver.resolve(ty);
                    let literals: Option<Vec<String>> = match &resolved.kind {
                        TypeKind::Union { members, .. } => members
                            .iter()
                            .map(|m| m.as_string_literal().map(str::to_string))
                            .collect(),
                        _ => resolved.as_string_literal().map(|v| vec![v.to_string()]),
                    };
                    match (literals, resolved.kind) {
                        (Some(values), _) => Some(DefinitionKind::Enum { values: dedup(values) }),
                        (None, TypeKind::Object { properties }) => {
                            Some(DefinitionKind::Interface { properties })
                        }
                        _ => None,
                    }
                }
                DeclKind::Enum { members } => Some(DefinitionKind::Enum {
                    values: dedup(
                        members
                            .iter()
                            .map(|m| enum_value(&m.name, m.init.as_deref()))
                            .collect(),
                    ),
                }),
                _ => None,
            };
            for message in resolver.diagnostics.drain(..) {
                warnings.push(ParseWarning {
                    file: file.path.clone(),
                    line: decl.line,
                    message,
                });
            }
            if let Some(kind) = kind {
                seen.insert(decl.name.as_str());
                definitions.push(ParsedTypeDefinition {
                    name: decl.name.clone(),
                    file: file.path.clone(),
                    description,
                    kind,
                });
            }
        }
    }
    definitions
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values.into_iter().filter(|v| seen.insert(v.clone())).collect()
}
