//! C# formatting through an external formatter (CSharpier by default).
//!
//! Formatting never fails a run: a missing binary, a non-zero exit or an I/O
//! error logs a warning and hands back the input. Doc-comment repair runs in
//! every case.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::TempDir;
use tracing::{debug, warn};

/// Default formatter invocation; the file path is appended.
pub const DEFAULT_COMMAND: &[&str] = &["dotnet", "csharpier", "format"];

/// External formatter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatter {
    command: Vec<String>,
    enabled: bool,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND.iter().map(|s| (*s).to_string()).collect(), true)
    }
}

impl Formatter {
    /// Formatter running `command <file>`.
    pub fn new(command: Vec<String>, enabled: bool) -> Self {
        Self { command, enabled }
    }

    /// A formatter that only repairs doc comments.
    pub fn disabled() -> Self {
        Self {
            command: Vec::new(),
            enabled: false,
        }
    }

    /// Whether the external command is run.
    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.command.is_empty()
    }

    /// Whether the external command can be found on `PATH`.
    pub fn is_available(&self) -> bool {
        self.program().is_ok()
    }

    /// Repair doc comments, then run the external formatter if enabled.
    pub fn format(&self, source: &str) -> String {
        let repaired = repair_doc_comments(source);
        if !self.is_enabled() {
            return repaired;
        }
        match self.run(&repaired) {
            Ok(formatted) => formatted,
            Err(err) => {
                warn!("C# formatting failed, keeping unformatted code: {err}");
                repaired
            }
        }
    }

    fn program(&self) -> Result<PathBuf, String> {
        let name = self
            .command
            .first()
            .ok_or_else(|| "Formatter command is empty".to_string())?;
        which::which(name).map_err(|e| format!("Formatter '{name}' not found: {e}"))
    }

    fn run(&self, source: &str) -> Result<String, String> {
        let program = self.program()?;
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        // Removed when `dir` drops, on every return path
        let dir: TempDir = tempfile::Builder::new()
            .prefix(&format!("sdkgen-format-{nanos}-"))
            .tempdir()
            .map_err(|e| format!("Failed to create formatter directory: {e}"))?;
        let file = dir.path().join("temp.cs");
        fs::write(&file, source).map_err(|e| format!("Failed to write {}: {e}", file.display()))?;

        debug!(program = %program.display(), file = %file.display(), "Running C# formatter");
        let output = Command::new(&program)
            .args(&self.command[1..])
            .arg(&file)
            .output()
            .map_err(|e| format!("Failed to run {}: {e}", program.display()))?;
        if !output.status.success() {
            return Err(format!(
                "{} exited with {}: {}",
                program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        fs::read_to_string(&file).map_err(|e| format!("Failed to read {}: {e}", file.display()))
    }
}

/// Clean markdown leftovers out of `///` comments.
///
/// Backticks are dropped, markdown list lines that continue a doc comment
/// get a `/// ` prefix, and `<returns>: Type}` annotations are removed.
pub fn repair_doc_comments(source: &str) -> String {
    let source = source.replace('`', "");
    let mut lines: Vec<String> = Vec::new();
    for line in source.split('\n') {
        let continues_doc = lines.last().is_some_and(|prev| prev.trim_start().starts_with("///"));
        let trimmed = line.trim_start();
        if continues_doc && is_list_item(trimmed) {
            let indent = &line[..line.len() - trimmed.len()];
            lines.push(format!("{indent}/// {trimmed}"));
        } else {
            lines.push(strip_returns_annotation(line));
        }
    }
    lines.join("\n")
}

fn is_list_item(line: &str) -> bool {
    line.strip_prefix('-')
        .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

/// `<returns>: Promise<T>} text` -> `<returns> text`
fn strip_returns_annotation(line: &str) -> String {
    let mut out = line.to_string();
    let mut from = 0;
    while let Some(found) = out[from..].find("<returns>") {
        let tag_end = from + found + "<returns>".len();
        let rest = &out[tag_end..];
        let after_ws = rest.trim_start();
        if let Some(annotation) = after_ws.strip_prefix(':')
            && let Some(close) = annotation.find('}')
        {
            let tail = annotation[close + 1..].trim_start().to_string();
            out = format!("{} {tail}", &out[..tag_end]);
        }
        from = tag_end;
    }
    out
}
