//! Golden snapshots of selected generated files.
//!
//! `update` copies `<output>/<file>` to `<fixtures>/<file>.golden`; `check`
//! compares the two and renders a unified diff for every drifted file.

use std::fs;
use std::path::{Path, PathBuf};

use similar::TextDiff;
use tracing::{debug, info};

use crate::generator::{CORE_FILE, TYPES_FILE};

/// Files snapshotted when none are configured.
pub const DEFAULT_GOLDEN_FILES: &[&str] = &[TYPES_FILE, CORE_FILE];

/// Extension of snapshot files.
pub const GOLDEN_EXTENSION: &str = "golden";

/// Outcome for one snapshotted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoldenStatus {
    /// Snapshot written.
    Updated,
    /// Snapshot matches the output.
    Matches,
    /// Output differs; holds a unified diff from snapshot to output.
    Drifted(String),
    /// No snapshot exists yet.
    MissingGolden,
}

/// One file of a golden run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldenEntry {
    /// File name relative to the output directory.
    pub file: String,
    /// What happened.
    pub status: GoldenStatus,
}

impl GoldenEntry {
    /// Whether this entry fails a check run.
    pub fn is_failure(&self) -> bool {
        matches!(self.status, GoldenStatus::Drifted(_) | GoldenStatus::MissingGolden)
    }
}

/// Snapshot location of `file`.
pub fn golden_path(fixtures: &Path, file: &str) -> PathBuf {
    fixtures.join(format!("{file}.{GOLDEN_EXTENSION}"))
}

/// Copy every file to its snapshot. Fails before writing anything when an
/// output file is absent.
pub fn update(output_dir: &Path, fixtures: &Path, files: &[String]) -> Result<Vec<GoldenEntry>, String> {
    let sources = read_outputs(output_dir, files)?;
    fs::create_dir_all(fixtures)
        .map_err(|e| format!("Failed to create fixtures directory {}: {e}", fixtures.display()))?;

    let mut entries = Vec::with_capacity(sources.len());
    for (file, contents) in sources {
        let target = golden_path(fixtures, &file);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create directory {}: {e}", parent.display()))?;
        }
        fs::write(&target, contents).map_err(|e| format!("Failed to write {}: {e}", target.display()))?;
        debug!(file = %file, golden = %target.display(), "Updated golden file");
        entries.push(GoldenEntry {
            file,
            status: GoldenStatus::Updated,
        });
    }
    info!(count = entries.len(), "Updated golden files");
    Ok(entries)
}

/// Compare every file against its snapshot without writing.
pub fn check(output_dir: &Path, fixtures: &Path, files: &[String]) -> Result<Vec<GoldenEntry>, String> {
    let sources = read_outputs(output_dir, files)?;
    let mut entries = Vec::with_capacity(sources.len());
    for (file, actual) in sources {
        let target = golden_path(fixtures, &file);
        let status = match fs::read_to_string(&target) {
            Err(_) => GoldenStatus::MissingGolden,
            Ok(expected) if expected == actual => GoldenStatus::Matches,
            Ok(expected) => GoldenStatus::Drifted(unified_diff(&file, &expected, &actual)),
        };
        let entry = GoldenEntry { file, status };
        debug!(file = %entry.file, failed = entry.is_failure(), "Checked golden file");
        entries.push(entry);
    }
    Ok(entries)
}

/// Unified diff from the snapshot to the current output.
pub fn unified_diff(file: &str, expected: &str, actual: &str) -> String {
    TextDiff::from_lines(expected, actual)
        .unified_diff()
        .context_radius(3)
        .header(&format!("{file}.{GOLDEN_EXTENSION}"), file)
        .to_string()
}

fn read_outputs(output_dir: &Path, files: &[String]) -> Result<Vec<(String, String)>, String> {
    let missing: Vec<&str> = files
        .iter()
        .filter(|f| !output_dir.join(f).is_file())
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(format!(
            "Generated file(s) not found in {}: {}",
            output_dir.display(),
            missing.join(", ")
        ));
    }

    files
        .iter()
        .map(|file| {
            let path = output_dir.join(file);
            fs::read_to_string(&path)
                .map(|contents| (file.clone(), contents))
                .map_err(|e| format!("Failed to read {}: {e}", path.display()))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn names() -> Vec<String> {
        DEFAULT_GOLDEN_FILES.iter().map(|f| (*f).to_string()).collect()
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out");
        let fixtures = dir.path().join("fixtures");
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join(TYPES_FILE), "namespace AppsInToss\n{\n}\n").unwrap();
        fs::write(output.join(CORE_FILE), "class AITCore\n{\n}\n").unwrap();
        (dir, output, fixtures)
    }

    #[test]
    fn test_update_then_check_matches() {
        let (_dir, output, fixtures) = setup();
        let updated = update(&output, &fixtures, &names()).unwrap();
        assert!(updated.iter().all(|e| e.status == GoldenStatus::Updated));
        assert!(golden_path(&fixtures, CORE_FILE).is_file());

        let checked = check(&output, &fixtures, &names()).unwrap();
        assert!(checked.iter().all(|e| e.status == GoldenStatus::Matches));
    }

    #[test]
    fn test_check_reports_drift() {
        let (_dir, output, fixtures) = setup();
        update(&output, &fixtures, &names()).unwrap();
        fs::write(output.join(CORE_FILE), "class AITCore\n{\n    int x;\n}\n").unwrap();

        let checked = check(&output, &fixtures, &names()).unwrap();
        assert_eq!(checked[0].status, GoldenStatus::Matches);
        let GoldenStatus::Drifted(diff) = &checked[1].status else {
            unreachable!("expected drift, got {:?}", checked[1].status);
        };
        assert!(checked[1].is_failure());
        assert!(diff.contains("--- AITCore.cs.golden"));
        assert!(diff.contains("+    int x;"));
    }

    #[test]
    fn test_missing_output_fails() {
        let (_dir, output, fixtures) = setup();
        fs::remove_file(output.join(TYPES_FILE)).unwrap();
        let err = update(&output, &fixtures, &names()).unwrap_err();
        assert!(err.contains(TYPES_FILE));
        assert!(!fixtures.exists());
    }

    #[test]
    fn test_missing_golden_fails_check() {
        let (_dir, output, fixtures) = setup();
        let checked = check(&output, &fixtures, &names()).unwrap();
        assert!(checked.iter().all(GoldenEntry::is_failure));
    }
}
