//! Generate a Unity C# SDK and WebGL jslib glue from a TypeScript
//! declaration corpus.
//!
//! The pipeline runs parse, classify, generate, format, validate and write
//! in that order. Validation happens before anything touches the output
//! directory, so a failing run leaves the previous output in place.

pub mod categories;
pub mod collector;
pub mod config;
pub mod error;
pub mod formatter;
pub mod generator;
pub mod golden;
pub mod parser;
pub mod validator;
pub mod writer;

pub use error::GenerateError;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use categories::CategoryTable;
use config::Config;
use formatter::Formatter;
use generator::{BRIDGE_FILE, GeneratorOptions, ManualTemplates};
use parser::{ParseOptions, ParseWarning};
use validator::CompletenessSummary;
use writer::WriteSummary;

// ============================================================================
// Options
// ============================================================================

/// Inputs of one generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Root of the `.d.ts` corpus.
    pub source: PathBuf,
    /// Directory receiving `AIT*.cs` and `Plugins/`.
    pub output: PathBuf,
    /// Bridge exposure file; `<output>/unity-bridge.ts` when unset.
    pub bridge_output: Option<PathBuf>,
    /// Hand-written overrides.
    pub manual_templates: Option<PathBuf>,
    /// Generate `@deprecated` APIs too.
    pub include_deprecated: bool,
    /// Web framework version recorded in headers.
    pub tag: String,
    /// Module imported by the bridge file.
    pub bridge_module: String,
    /// C# formatter.
    pub formatter: Formatter,
    /// Extra category assignments.
    pub categories: BTreeMap<String, Vec<String>>,
}

impl GenerateOptions {
    /// Options seeded from a configuration file.
    pub fn from_config(source: PathBuf, output: PathBuf, config: &Config) -> Self {
        Self {
            source,
            output,
            bridge_output: None,
            manual_templates: config.manual_templates.clone(),
            include_deprecated: config.include_deprecated,
            tag: config.web_framework_tag.clone(),
            bridge_module: config.bridge_module.clone(),
            formatter: config.formatter.formatter(),
            categories: config.categories.clone(),
        }
    }

    /// Where the bridge exposure file is written.
    pub fn bridge_path(&self) -> PathBuf {
        self.bridge_output
            .clone()
            .unwrap_or_else(|| self.output.join(BRIDGE_FILE))
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct GenerateReport {
    /// Parsed versus generated counts.
    pub summary: CompletenessSummary,
    /// Non-fatal parser findings.
    pub warnings: Vec<ParseWarning>,
    /// Non-fatal collector findings.
    pub diagnostics: Vec<String>,
    /// Output directory changes.
    pub written: WriteSummary,
    /// Location of the bridge exposure file.
    pub bridge_path: PathBuf,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Run the whole pipeline.
pub fn generate(options: &GenerateOptions) -> Result<GenerateReport, GenerateError> {
    let parse_options = ParseOptions {
        include_deprecated: options.include_deprecated,
    };
    let mut parsed = parser::parse_corpus(&options.source, &parse_options).map_err(GenerateError::Parse)?;
    for warning in &parsed.warnings {
        warn!(file = %warning.file, line = warning.line, "{}", warning.message);
    }
    for skipped in &parsed.skipped {
        warn!(file = %skipped.file, line = skipped.line, name = %skipped.name, "Skipped declaration: {}", skipped.reason);
    }

    let table = CategoryTable::new(&options.categories);
    for api in &mut parsed.apis {
        api.category = table.classify(api);
    }

    let manual = match &options.manual_templates {
        Some(dir) => ManualTemplates::load(dir).map_err(GenerateError::Config)?,
        None => ManualTemplates::default(),
    };
    let generator_options = GeneratorOptions {
        tag: options.tag.clone(),
        bridge_module: options.bridge_module.clone(),
    };
    let mut output = generator::generate(&parsed.apis, &parsed.type_definitions, &manual, &generator_options)
        .map_err(GenerateError::Template)?;
    for diagnostic in &output.diagnostics {
        warn!("{diagnostic}");
    }

    let formatter = usable_formatter(&options.formatter);
    for file in output.files.iter_mut().filter(|f| f.path.ends_with(".cs")) {
        file.contents = formatter.format(&file.contents);
    }

    let report = validator::validate(&parsed, &output, &table);
    if !report.result.success {
        return Err(GenerateError::Validation(Box::new(report)));
    }

    let written = writer::write_output(&options.output, &output.files).map_err(GenerateError::Output)?;
    let bridge_path = options.bridge_path();
    writer::write_file(&bridge_path, &output.bridge).map_err(GenerateError::Output)?;

    info!(
        apis = report.summary.total,
        categories = output.categories.len(),
        output = %options.output.display(),
        "Generation complete"
    );
    Ok(GenerateReport {
        summary: report.summary,
        warnings: parsed.warnings,
        diagnostics: output.diagnostics,
        written,
        bridge_path,
    })
}

/// Format every `.cs` file under `dir` in place. Returns the number of
/// files that changed.
pub fn format_directory(dir: &Path, formatter: &Formatter) -> Result<usize, GenerateError> {
    let formatter = usable_formatter(formatter);
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| GenerateError::Io {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "cs") {
            paths.push(entry.into_path());
        }
    }

    let mut changed = 0;
    for path in paths {
        let source = fs::read_to_string(&path).map_err(|source| GenerateError::Io {
            path: path.clone(),
            source,
        })?;
        let formatted = formatter.format(&source);
        if formatted != source {
            fs::write(&path, formatted).map_err(|source| GenerateError::Io {
                path: path.clone(),
                source,
            })?;
            changed += 1;
        }
    }
    info!(dir = %dir.display(), changed, "Formatted C# files");
    Ok(changed)
}

/// Warn once and fall back to doc repair only when the formatter binary is
/// not installed.
fn usable_formatter(formatter: &Formatter) -> Formatter {
    if formatter.is_enabled() && !formatter.is_available() {
        warn!("C# formatter not found on PATH, skipping formatting");
        return Formatter::disabled();
    }
    formatter.clone()
}
