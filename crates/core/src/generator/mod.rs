//! Target code generation.
//!
//! [`generate`] turns classified APIs into the C# partial class files, the
//! per-category jslib glue and the bridge exposure file. Every API is tried;
//! an API whose types have no rendering rule (and no manual template) is left
//! out and reported as `type-unsupported`, never aborting the batch.

mod bridge;
mod csharp;
mod docs;
mod jslib;
mod manual;
mod prepare;
mod templates;
mod utils;

use std::collections::{BTreeMap, BTreeSet};

use sdkgen_common::{
    GeneratedCode, ParsedApi, ParsedTypeDefinition, ValidationError, ValidationErrorKind,
};
use tera::Context;
use tracing::{debug, info, warn};

use crate::categories;
use crate::collector::{GenerationContext, Owner, check_supported, subscription_payload};

pub use manual::{ManualTemplate, ManualTemplates};

use prepare::{PreparedApi, Shape, prepare};

/// Main partial class file.
pub const MAIN_FILE: &str = "AIT.cs";
/// Shared named types.
pub const TYPES_FILE: &str = "AIT.Types.cs";
/// Callback registry and bridge entry points.
pub const CORE_FILE: &str = "AITCore.cs";
/// Bridge exposure file name.
pub const BRIDGE_FILE: &str = "unity-bridge.ts";

/// Hint attached to APIs that need hand-written code.
pub const MANUAL_TEMPLATE_HINT: &str = "author a manual template for these APIs";

/// `AIT.<Category>.cs`
pub fn category_file(category: &str) -> String {
    format!("AIT.{category}.cs")
}

/// `Plugins/AppsInToss-<Category>.jslib`
pub fn jslib_file(category: &str) -> String {
    format!("Plugins/AppsInToss-{category}.jslib")
}

/// Generator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Version tag of the web framework recorded in file headers.
    pub tag: String,
    /// Module the bridge file imports.
    pub bridge_module: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            tag: "latest".to_string(),
            bridge_module: "@apps-in-toss/web-framework".to_string(),
        }
    }
}

/// One output file, path relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Relative path with `/` separators.
    pub path: String,
    /// File text.
    pub contents: String,
}

/// Everything one generation run produced.
#[derive(Debug, Clone, Default)]
pub struct GeneratorOutput {
    /// C# and jslib files, in emission order.
    pub files: Vec<GeneratedFile>,
    /// `unity-bridge.ts` text.
    pub bridge: String,
    /// Per-API output.
    pub generated: Vec<GeneratedCode>,
    /// `type-unsupported` findings.
    pub errors: Vec<ValidationError>,
    /// Non-fatal collector notes.
    pub diagnostics: Vec<String>,
    /// Categories in output order.
    pub categories: Vec<String>,
}

impl GeneratorOutput {
    /// Look up a generated file.
    pub fn file(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

#[derive(Debug, Default)]
struct CategoryOutput {
    methods: Vec<String>,
    functions: Vec<String>,
    subscribes: bool,
}

/// Generate code for already classified `apis`.
pub fn generate(
    apis: &[ParsedApi],
    definitions: &[ParsedTypeDefinition],
    manual: &ManualTemplates,
    options: &GeneratorOptions,
) -> Result<GeneratorOutput, String> {
    let mut ctx = GenerationContext::new(definitions);
    let mut by_category: BTreeMap<String, Vec<&ParsedApi>> = BTreeMap::new();
    for api in apis {
        by_category.entry(api.category.clone()).or_default().push(api);
    }
    let mut order: Vec<String> = by_category.keys().cloned().collect();
    categories::sort(&mut order);

    let mut output = GeneratorOutput::default();
    let mut outputs: Vec<(String, CategoryOutput)> = Vec::new();
    let mut result_types = BTreeSet::new();
    let mut payload_types = BTreeSet::new();

    for category in &order {
        let owner = Owner::Category(category.clone());
        let mut out = CategoryOutput::default();
        for api in by_category.get(category).into_iter().flatten() {
            let template = manual.find(api);
            let support = unsupported_reason(api);

            let prepared = match (&support, template) {
                (Ok(()), _) => Some(prepare(api, &mut ctx, &owner)),
                (Err(reason), Some(_)) => {
                    debug!(api = %api.name, %reason, "Unsupported type covered by manual template");
                    None
                }
                (Err(reason), None) => {
                    warn!(api = %api.name, file = %api.file, %reason, "API skipped");
                    output.errors.push(
                        ValidationError::new(
                            ValidationErrorKind::TypeUnsupported,
                            format!("{} ({}): {reason}", api.name, api.file),
                        )
                        .with_api(api.name.clone())
                        .with_suggestion(MANUAL_TEMPLATE_HINT),
                    );
                    continue;
                }
            };

            if let Some(prepared) = &prepared {
                record_routes(prepared, &mut result_types, &mut payload_types);
            }
            let csharp = match template {
                Some(template) => template.csharp.clone(),
                None => prepared.as_ref().map(csharp::method).unwrap_or_default(),
            };
            let glue = template
                .and_then(|t| t.jslib.clone())
                .or_else(|| prepared.as_ref().map(jslib::function));
            out.subscribes |= matches!(
                prepared.as_ref().map(|p| &p.shape),
                Some(Shape::Subscription { .. })
            );

            out.methods.push(csharp.clone());
            if let Some(glue) = &glue {
                out.functions.push(glue.clone());
            }
            output.generated.push(GeneratedCode {
                api: (*api).clone(),
                csharp,
                jslib: glue.unwrap_or_default(),
                manual: template.is_some(),
            });
        }
        outputs.push((category.clone(), out));
    }

    let generated_from = format!("{} {}", options.bridge_module, options.tag);
    let mut unsubscribe_emitted = false;
    for (category, out) in &mut outputs {
        let owner = Owner::Category(category.clone());
        let types: Vec<String> = ctx
            .types_for(&owner)
            .map(|t| csharp::nested_type(t, &ctx))
            .collect();
        let file_name = category_file(category);
        let mut context = Context::new();
        context.insert("header", &templates::csharp_header(&file_name, &generated_from));
        context.insert("category", category);
        context.insert("methods", &out.methods.join("\n\n"));
        context.insert(
            "types",
            &types.iter().map(|t| format!("\n\n{t}")).collect::<String>(),
        );
        let contents = templates::render(&file_name, templates::CATEGORY, &context)?;
        output.files.push(GeneratedFile {
            path: file_name,
            contents,
        });

        if out.subscribes && !unsubscribe_emitted {
            out.functions.push(jslib::unsubscribe_function());
            unsubscribe_emitted = true;
        }
        if out.functions.is_empty() {
            continue;
        }
        let path = jslib_file(category);
        let mut context = Context::new();
        context.insert("category", category);
        context.insert("bridge_module", &options.bridge_module);
        context.insert("tag", &options.tag);
        context.insert("functions", &out.functions.join(",\n\n"));
        let contents = templates::render(&path, templates::JSLIB, &context)?;
        output.files.push(GeneratedFile { path, contents });
    }

    let shared: Vec<String> = ctx
        .types_for(&Owner::Shared)
        .map(|t| csharp::nested_type(t, &ctx))
        .collect();
    let mut context = Context::new();
    context.insert("header", &templates::csharp_header(TYPES_FILE, &generated_from));
    context.insert("types", &shared.join("\n\n"));
    let contents = templates::render(TYPES_FILE, templates::TYPES, &context)?;
    output.files.push(GeneratedFile {
        path: TYPES_FILE.to_string(),
        contents,
    });

    let mut context = Context::new();
    context.insert("header", &templates::csharp_header(CORE_FILE, &generated_from));
    context.insert("callback_routes", &csharp::callback_routes(&result_types));
    context.insert("subscription_routes", &csharp::subscription_routes(&payload_types));
    let contents = templates::render(CORE_FILE, templates::CORE, &context)?;
    output.files.push(GeneratedFile {
        path: CORE_FILE.to_string(),
        contents,
    });

    let mut context = Context::new();
    context.insert("header", &templates::csharp_header(MAIN_FILE, &generated_from));
    context.insert("bridge_module", &options.bridge_module);
    context.insert("tag", &options.tag);
    context.insert("api_count", &output.generated.len());
    let contents = templates::render(MAIN_FILE, templates::MAIN, &context)?;
    output.files.insert(
        0,
        GeneratedFile {
            path: MAIN_FILE.to_string(),
            contents,
        },
    );

    output.bridge = bridge::render(apis, &options.bridge_module, &options.tag)?;
    output.diagnostics = ctx.diagnostics().to_vec();
    output.categories = order;

    info!(
        generated = output.generated.len(),
        unsupported = output.errors.len(),
        files = output.files.len(),
        "Generated SDK sources"
    );
    Ok(output)
}

/// First type in the API's graph without a rendering rule.
fn unsupported_reason(api: &ParsedApi) -> Result<(), String> {
    for param in &api.parameters {
        check_supported(&param.ty).map_err(|e| format!("parameter '{}': {e}", param.name))?;
    }
    check_supported(&api.return_type).map_err(|e| format!("return type: {e}"))?;
    if let Some(payload) = subscription_payload(api) {
        check_supported(payload).map_err(|e| format!("event payload: {e}"))?;
    }
    Ok(())
}

fn record_routes(
    prepared: &PreparedApi<'_>,
    result_types: &mut BTreeSet<String>,
    payload_types: &mut BTreeSet<String>,
) {
    match &prepared.shape {
        Shape::Async { result, .. } => {
            result_types.insert(result.clone());
        }
        Shape::Subscription {
            payload: Some(payload),
            ..
        } => {
            payload_types.insert(payload.clone());
        }
        _ => {}
    }
}
