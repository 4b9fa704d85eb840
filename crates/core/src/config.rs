//! `sdkgen.toml` configuration.
//!
//! Every key is optional. Command-line flags override the file, which
//! overrides the defaults below:
//!
//! ```toml
//! web_framework_tag = "1.0.0"
//! bridge_module = "@apps-in-toss/web-framework"
//! include_deprecated = false
//! manual_templates = "templates/manual"
//! golden_files = ["AIT.Types.cs", "AITCore.cs"]
//!
//! [formatter]
//! enabled = true
//! command = ["dotnet", "csharpier", "format"]
//!
//! [categories]
//! SystemInfo = ["getDeviceId"]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::formatter::{self, Formatter};
use crate::golden::DEFAULT_GOLDEN_FILES;

/// Config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "sdkgen.toml";

const DEFAULT_TAG: &str = "latest";
const DEFAULT_BRIDGE_MODULE: &str = "@apps-in-toss/web-framework";

/// External formatter section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatterConfig {
    /// Run the external formatter.
    pub enabled: bool,
    /// Program and leading arguments; the file path is appended.
    pub command: Vec<String>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: formatter::DEFAULT_COMMAND.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl FormatterConfig {
    /// The formatter this section describes.
    pub fn formatter(&self) -> Formatter {
        Formatter::new(self.command.clone(), self.enabled)
    }
}

/// Contents of `sdkgen.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Web framework version recorded in generated headers.
    pub web_framework_tag: String,
    /// Module imported by the bridge exposure file.
    pub bridge_module: String,
    /// Generate `@deprecated` APIs too.
    pub include_deprecated: bool,
    /// Directory of hand-written API overrides.
    pub manual_templates: Option<PathBuf>,
    /// Files snapshotted by `update-golden`.
    pub golden_files: Vec<String>,
    /// External formatter.
    pub formatter: FormatterConfig,
    /// Extra category assignments, category to API names.
    pub categories: BTreeMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web_framework_tag: DEFAULT_TAG.to_string(),
            bridge_module: DEFAULT_BRIDGE_MODULE.to_string(),
            include_deprecated: false,
            manual_templates: None,
            golden_files: DEFAULT_GOLDEN_FILES.iter().map(|s| (*s).to_string()).collect(),
            formatter: FormatterConfig::default(),
            categories: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Parse configuration text.
    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| format!("Failed to parse configuration: {e}"))
    }

    /// Load `path`.
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read configuration {}: {e}", path.display()))?;
        let config = Self::from_toml(&contents).map_err(|e| format!("{}: {e}", path.display()))?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load an explicit path, else `sdkgen.toml` in `dir` when present,
    /// else the defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, String> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            debug!(dir = %dir.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }
}
