//! Unity `.meta` sidecars.
//!
//! Unity identifies assets by the GUID in their `.meta` file. A GUID that
//! changes between runs breaks every reference to the asset, so existing
//! sidecars are never rewritten and new GUIDs derive from the asset path.

use sha2::{Digest, Sha256};

/// Suffix Unity appends to the asset file name.
pub const META_SUFFIX: &str = ".meta";

/// 32 lowercase hex digits derived from the path relative to the output root.
pub fn guid(relative: &str) -> String {
    let digest = Sha256::digest(relative.as_bytes());
    let mut guid = hex::encode(digest);
    guid.truncate(32);
    guid
}

/// GUID recorded in an existing `.meta` file.
pub fn existing_guid(meta: &str) -> Option<&str> {
    meta.lines()
        .find_map(|line| line.strip_prefix("guid:"))
        .map(str::trim)
        .filter(|guid| !guid.is_empty())
}

/// Sidecar text for an asset; jslib plugins are enabled for WebGL only.
pub fn contents(relative: &str) -> String {
    let guid = guid(relative);
    if relative.ends_with(".jslib") {
        jslib_meta(&guid)
    } else {
        csharp_meta(&guid)
    }
}

fn csharp_meta(guid: &str) -> String {
    format!(
        "fileFormatVersion: 2
guid: {guid}
MonoImporter:
  externalObjects: {{}}
  serializedVersion: 2
  defaultReferences: []
  executionOrder: 0
  icon: {{instanceID: 0}}
  userData:
  assetBundleName:
  assetBundleVariant:
"
    )
}

fn jslib_meta(guid: &str) -> String {
    format!(
        "fileFormatVersion: 2
guid: {guid}
PluginImporter:
  externalObjects: {{}}
  serializedVersion: 2
  iconMap: {{}}
  executionOrder: {{}}
  defineConstraints: []
  isPreloaded: 0
  isOverridable: 1
  isExplicitlyReferenced: 0
  validateReferences: 1
  platformData:
  - first:
      Any:
    second:
      enabled: 0
      settings: {{}}
  - first:
      Editor: Editor
    second:
      enabled: 0
      settings:
        DefaultValueInitialized: true
  - first:
      WebGL: WebGL
    second:
      enabled: 1
      settings: {{}}
  userData:
  assetBundleName:
  assetBundleVariant:
"
    )
}
