//! Output directory maintenance: generated files, `.meta` sidecars and
//! removal of files an earlier run produced but this one does not.

mod meta;

pub use meta::{META_SUFFIX, guid};

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::generator::{GeneratedFile, MAIN_FILE};

const PLUGINS_DIR: &str = "Plugins";

/// What a write pass changed, as paths relative to the output directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Files created or rewritten.
    pub written: Vec<String>,
    /// Files whose contents were already up to date.
    pub unchanged: Vec<String>,
    /// Newly created `.meta` sidecars.
    pub metas_created: Vec<String>,
    /// Stale files deleted, sidecars included.
    pub removed: Vec<String>,
}

/// Write `files` under `output_dir`, add missing `.meta` files and delete
/// stale generated files.
pub fn write_output(output_dir: &Path, files: &[GeneratedFile]) -> Result<WriteSummary, String> {
    fs::create_dir_all(output_dir)
        .map_err(|e| format!("Failed to create output directory {}: {e}", output_dir.display()))?;

    let mut summary = WriteSummary {
        removed: remove_stale(output_dir, files)?,
        ..WriteSummary::default()
    };

    for file in files {
        let path = output_dir.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create directory {}: {e}", parent.display()))?;
        }
        if write_if_changed(&path, &file.contents)? {
            debug!(file = %file.path, "Wrote generated file");
            summary.written.push(file.path.clone());
        } else {
            summary.unchanged.push(file.path.clone());
        }
        if ensure_meta(output_dir, &file.path)? {
            summary.metas_created.push(format!("{}{META_SUFFIX}", file.path));
        }
    }

    info!(
        written = summary.written.len(),
        unchanged = summary.unchanged.len(),
        metas = summary.metas_created.len(),
        removed = summary.removed.len(),
        "Updated output directory"
    );
    Ok(summary)
}

/// Write a standalone file such as the bridge exposure file.
pub fn write_file(path: &Path, contents: &str) -> Result<bool, String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create directory {}: {e}", parent.display()))?;
    }
    write_if_changed(path, contents)
}

/// Whether `relative` names a file this generator owns.
pub fn is_generated(relative: &str) -> bool {
    if let Some(name) = relative.strip_prefix("Plugins/") {
        return name.starts_with("AppsInToss-") && name.ends_with(".jslib") && !name.contains('/');
    }
    !relative.contains('/')
        && relative.ends_with(".cs")
        && (relative == MAIN_FILE || relative == "AITCore.cs" || relative.starts_with("AIT."))
}

/// Delete generated files (and their sidecars) that `files` no longer
/// contains. Sidecars of files that are regenerated stay in place.
fn remove_stale(output_dir: &Path, files: &[GeneratedFile]) -> Result<Vec<String>, String> {
    let current: BTreeSet<&str> = files.iter().map(|f| f.path.as_str()).collect();
    let mut candidates = list_files(output_dir, "")?;
    candidates.extend(list_files(&output_dir.join(PLUGINS_DIR), PLUGINS_DIR)?);

    let mut removed = Vec::new();
    for relative in candidates {
        if !is_generated(&relative) || current.contains(relative.as_str()) {
            continue;
        }
        for target in [relative.clone(), format!("{relative}{META_SUFFIX}")] {
            let path = output_dir.join(&target);
            if path.is_file() {
                fs::remove_file(&path)
                    .map_err(|e| format!("Failed to remove stale file {}: {e}", path.display()))?;
                debug!(file = %target, "Removed stale file");
                removed.push(target);
            }
        }
    }
    Ok(removed)
}

/// File names directly inside `dir`, prefixed with `prefix/`, sorted.
fn list_files(dir: &Path, prefix: &str) -> Result<Vec<String>, String> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|e| format!("Failed to read {}: {e}", dir.display()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read {}: {e}", dir.display()))?;
        if !entry.path().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        names.push(if prefix.is_empty() { name } else { format!("{prefix}/{name}") });
    }
    names.sort();
    Ok(names)
}

fn write_if_changed(path: &Path, contents: &str) -> Result<bool, String> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == contents) {
        return Ok(false);
    }
    fs::write(path, contents).map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
    Ok(true)
}

/// Create the sidecar of `relative` unless one exists. Returns whether it
/// was created.
fn ensure_meta(output_dir: &Path, relative: &str) -> Result<bool, String> {
    let path = output_dir.join(format!("{relative}{META_SUFFIX}"));
    if let Ok(existing) = fs::read_to_string(&path) {
        debug!(file = %relative, guid = meta::existing_guid(&existing).unwrap_or("?"), "Keeping existing .meta");
        return Ok(false);
    }
    fs::write(&path, meta::contents(relative))
        .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn file(path: &str, contents: &str) -> GeneratedFile {
        GeneratedFile {
            path: path.to_string(),
            contents: contents.to_string(),
        }
    }

    #[test]
    fn test_is_generated() {
        assert!(is_generated("AIT.cs"));
        assert!(is_generated("AIT.Share.cs"));
        assert!(is_generated("AITCore.cs"));
        assert!(is_generated("Plugins/AppsInToss-Share.jslib"));
        assert!(!is_generated("AITHelpers.cs"));
        assert!(!is_generated("Editor/AIT.Share.cs"));
        assert!(!is_generated("Plugins/Other.jslib"));
        assert!(!is_generated("AIT.Share.cs.meta"));
    }

    #[test]
    fn test_write_creates_meta_and_preserves_existing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("AIT.cs.meta"), "fileFormatVersion: 2\nguid: keepme\n").unwrap();

        let files = vec![
            file("AIT.cs", "class A {}"),
            file("Plugins/AppsInToss-Share.jslib", "mergeInto(LibraryManager.library, {});"),
        ];
        let summary = write_output(dir.path(), &files).unwrap();
        assert_eq!(summary.written, vec!["AIT.cs", "Plugins/AppsInToss-Share.jslib"]);
        assert_eq!(summary.metas_created, vec!["Plugins/AppsInToss-Share.jslib.meta"]);

        let kept = fs::read_to_string(dir.path().join("AIT.cs.meta")).unwrap();
        assert_eq!(kept, "fileFormatVersion: 2\nguid: keepme\n");
        let created = fs::read_to_string(dir.path().join("Plugins/AppsInToss-Share.jslib.meta")).unwrap();
        assert!(created.contains(&guid("Plugins/AppsInToss-Share.jslib")));

        let again = write_output(dir.path(), &files).unwrap();
        assert!(again.written.is_empty());
        assert_eq!(again.unchanged.len(), 2);
        assert!(again.metas_created.is_empty());
    }

    #[test]
    fn test_stale_files_removed() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Plugins")).unwrap();
        for name in [
            "AIT.Old.cs",
            "AIT.Old.cs.meta",
            "Plugins/AppsInToss-Old.jslib",
            "Plugins/AppsInToss-Old.jslib.meta",
            "Custom.cs",
        ] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        let summary = write_output(dir.path(), &[file("AIT.cs", "class A {}")]).unwrap();
        assert_eq!(
            summary.removed,
            vec![
                "AIT.Old.cs",
                "AIT.Old.cs.meta",
                "Plugins/AppsInToss-Old.jslib",
                "Plugins/AppsInToss-Old.jslib.meta"
            ]
        );
        assert!(dir.path().join("Custom.cs").exists());
        assert!(!dir.path().join("AIT.Old.cs").exists());
    }

    #[test]
    fn test_write_file_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("BuildConfig~/unity-bridge.ts");
        assert!(write_file(&path, "export {};\n").unwrap());
        assert!(!write_file(&path, "export {};\n").unwrap());
    }
}
