//! `unity-bridge.ts`: exposes the web framework module on `window.AppsInToss`.

use std::collections::BTreeSet;

use sdkgen_common::ParsedApi;
use tera::Context;

use super::templates::{self, BRIDGE};

/// Namespaces referenced by `apis`, sorted and deduplicated.
pub fn namespaces(apis: &[ParsedApi]) -> Vec<String> {
    apis.iter()
        .filter_map(|api| api.namespace.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Render the bridge exposure file.
pub fn render(apis: &[ParsedApi], bridge_module: &str, tag: &str) -> Result<String, String> {
    let mut context = Context::new();
    context.insert("bridge_module", bridge_module);
    context.insert("tag", tag);
    context.insert("api_count", &apis.len());
    context.insert("namespaces", &namespaces(apis));
    templates::render("unity-bridge.ts", BRIDGE, &context)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sdkgen_common::ParsedType;

    fn api(name: &str, namespace: Option<&str>) -> ParsedApi {
        ParsedApi {
            name: name.to_string(),
            pascal_name: name.to_string(),
            original_name: name.to_string(),
            category: "Other".to_string(),
            file: "x.d.ts".to_string(),
            namespace: namespace.map(str::to_string),
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
    fn test_namespaces_sorted_and_deduplicated() {
        let apis = vec![
            api("b", Some("Storage")),
            api("a", None),
            api("c", Some("IAP")),
            api("d", Some("Storage")),
        ];
        let rendered = render(&apis, "@apps-in-toss/web-framework", "1.2.3").unwrap();
        assert_eq!(rendered.matches("import { Storage } from '@apps-in-toss/web-framework';").count(), 1);
        let iap = rendered.find("import { IAP }").unwrap();
        let storage = rendered.find("import { Storage }").unwrap();
        assert!(iap < storage);
        assert!(rendered.contains("      IAP: typeof IAP;\n      Storage: typeof Storage;\n    };"));
        assert!(rendered.contains("Object.defineProperty(window.AppsInToss, name, {"));
        assert!(rendered.contains("4 APIs from @apps-in-toss/web-framework 1.2.3"));
    }
}
