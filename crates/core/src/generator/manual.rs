//! Hand-written overrides for APIs the generator cannot or should not emit.
//!
//! A template directory holds `<ApiName>.cs` fragments (keyed by the API
//! name or its PascalCase name) and optional `<ApiName>.jslib` fragments.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use sdkgen_common::ParsedApi;
use tracing::{debug, warn};

/// One manual override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualTemplate {
    /// Method text placed in the category file as written.
    pub csharp: String,
    /// Glue function text; generated when absent.
    pub jslib: Option<String>,
}

/// Overrides keyed by API name.
#[derive(Debug, Clone, Default)]
pub struct ManualTemplates {
    entries: BTreeMap<String, ManualTemplate>,
}

impl ManualTemplates {
    /// Load every fragment from `dir`. A missing directory yields no templates.
    pub fn load(dir: &Path) -> Result<Self, String> {
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "No manual template directory");
            return Ok(Self::default());
        }

        let mut csharp = BTreeMap::new();
        let mut jslib = BTreeMap::new();
        let entries = fs::read_dir(dir)
            .map_err(|e| format!("Failed to read manual templates in {}: {e}", dir.display()))?;
        for entry in entries {
            let path = entry
                .map_err(|e| format!("Failed to read manual templates in {}: {e}", dir.display()))?
                .path();
            let (Some(stem), Some(extension)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.extension().and_then(|s| s.to_str()),
            ) else {
                continue;
            };
            let target = match extension {
                "cs" => &mut csharp,
                "jslib" => &mut jslib,
                _ => continue,
            };
            let content = fs::read_to_string(&path)
                .map_err(|e| format!("Failed to read manual template {}: {e}", path.display()))?;
            target.insert(stem.to_string(), content.trim_end().to_string());
        }

        for name in jslib.keys().filter(|name| !csharp.contains_key(*name)) {
            warn!(template = %name, "Manual jslib fragment has no C# counterpart; ignored");
        }

        let entries = csharp
            .into_iter()
            .map(|(name, csharp)| {
                let jslib = jslib.remove(&name);
                (name, ManualTemplate { csharp, jslib })
            })
            .collect::<BTreeMap<_, _>>();
        debug!(count = entries.len(), "Loaded manual templates");
        Ok(Self { entries })
    }

    /// Build from in-memory templates.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, ManualTemplate)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// The override for `api`, by name then by PascalCase name.
    pub fn find(&self, api: &ParsedApi) -> Option<&ManualTemplate> {
        self.entries
            .get(&api.name)
            .or_else(|| self.entries.get(&api.pascal_name))
    }

    /// Number of loaded overrides.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no overrides are loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sdkgen_common::ParsedType;
    use tempfile::TempDir;

    fn api(name: &str, pascal: &str) -> ParsedApi {
        ParsedApi {
            name: name.to_string(),
            pascal_name: pascal.to_string(),
            original_name: name.to_string(),
            category: "Other".to_string(),
            file: "x.d.ts".to_string(),
            namespace: None,
            description: None,
            return_description: None,
            examples: Vec::new(),
            parameters: Vec::new(),
            return_type: ParsedType::primitive("void"),
            is_async: false,
            has_permission: false,
            deprecated: None,
            event: None,
        }
    }

    #[test]
    fn test_load_pairs_fragments() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("loadAd.cs"), "        // loadAd\n").unwrap();
        fs::write(dir.path().join("loadAd.jslib"), "    __LoadAd_Internal: function() {}\n").unwrap();
        fs::write(dir.path().join("ShowAd.cs"), "        // ShowAd").unwrap();
        fs::write(dir.path().join("orphan.jslib"), "").unwrap();
        fs::write(dir.path().join("README.md"), "notes").unwrap();

        let templates = ManualTemplates::load(dir.path()).unwrap();
        assert_eq!(templates.len(), 2);

        let load = templates.find(&api("loadAd", "LoadAd")).unwrap();
        assert_eq!(load.csharp, "        // loadAd");
        assert_eq!(load.jslib.as_deref(), Some("    __LoadAd_Internal: function() {}"));

        let show = templates.find(&api("showAd", "ShowAd")).unwrap();
        assert!(show.jslib.is_none());
        assert!(templates.find(&api("orphan", "Orphan")).is_none());
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let templates = ManualTemplates::load(&dir.path().join("absent")).unwrap();
        assert!(templates.is_empty());
    }
}
