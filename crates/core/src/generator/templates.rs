//! Embedded `tera` templates for the generated file skeletons.

use tera::Context;

pub const MAIN: &str = include_str!("../../templates/main.cs.tera");
pub const CATEGORY: &str = include_str!("../../templates/category.cs.tera");
pub const TYPES: &str = include_str!("../../templates/types.cs.tera");
pub const CORE: &str = include_str!("../../templates/core.cs.tera");
pub const JSLIB: &str = include_str!("../../templates/jslib.tera");
pub const BRIDGE: &str = include_str!("../../templates/bridge.ts.tera");

/// Render one embedded template.
pub fn render(name: &str, template: &str, context: &Context) -> Result<String, String> {
    tera::Tera::one_off(template, context, false)
        .map_err(|err| format!("Failed to render template {name}: {err}"))
}

/// Copyright banner at the top of every generated C# file.
pub fn csharp_header(file_name: &str, generated_from: &str) -> String {
    [
        "// -----------------------------------------------------------------------".to_string(),
        format!("// <copyright file=\"{file_name}\" company=\"Toss\">"),
        "//     Copyright (c) Toss. All rights reserved.".to_string(),
        format!("//     Generated from {generated_from}"),
        "// </copyright>".to_string(),
        "// -----------------------------------------------------------------------".to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_skeleton() {
        let mut context = Context::new();
        context.insert("header", &csharp_header("AIT.Storage.cs", "@apps-in-toss/web-framework 1.0.0"));
        context.insert("category", "Storage");
        context.insert("methods", "        // methods");
        context.insert("types", "");
        let rendered = render("category", CATEGORY, &context).unwrap();
        assert!(rendered.starts_with("// ----"));
        assert!(rendered.contains("<copyright file=\"AIT.Storage.cs\" company=\"Toss\">"));
        assert!(rendered.contains("/// Apps in Toss Platform API - Storage"));
        assert!(rendered.trim_end().ends_with("        // methods\n    }\n}"));
    }

    #[test]
    fn test_bridge_without_namespaces() {
        let mut context = Context::new();
        context.insert("bridge_module", "@apps-in-toss/web-framework");
        context.insert("tag", "1.0.0");
        context.insert("api_count", &3);
        context.insert("namespaces", &Vec::<String>::new());
        let rendered = render("bridge", BRIDGE, &context).unwrap();
        assert!(rendered.contains("AppsInToss: typeof WebFramework;"));
        assert!(rendered.contains("export default WebFramework;"));
    }
}
