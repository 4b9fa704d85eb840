//! Parsed-versus-generated completeness check and run summary.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use sdkgen_common::{GeneratedCode, ParsedApi, ValidationError, ValidationErrorKind, ValidationResult};

use crate::categories::{self, CategoryTable};
use crate::generator::MANUAL_TEMPLATE_HINT;
use crate::parser::SkippedDeclaration;

/// Generated-versus-parsed counts of one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    /// Category name.
    pub category: String,
    /// APIs parsed into the category.
    pub total: usize,
    /// APIs generated.
    pub generated: usize,
}

/// Counts reported after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletenessSummary {
    /// Parsed APIs.
    pub total: usize,
    /// Generated APIs.
    pub generated: usize,
    /// Per-category counts in category order.
    pub categories: Vec<CategoryCount>,
}

impl CompletenessSummary {
    /// Generated share of the parsed APIs, 100 for an empty corpus.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.generated as f64 * 100.0 / self.total as f64
        }
    }
}

impl fmt::Display for CompletenessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Generated {}/{} APIs ({:.1}%)",
            self.generated,
            self.total,
            self.percentage()
        )?;
        for count in &self.categories {
            writeln!(f, "  {:<16} {}/{}", count.category, count.generated, count.total)?;
        }
        Ok(())
    }
}

/// Compare parsed and generated API names.
///
/// Every parsed API without generated code, plus every skipped declaration
/// the category table names explicitly, is listed in one `missing` error
/// grouped by originating file.
pub fn check_completeness(
    parsed: &[ParsedApi],
    generated: &[GeneratedCode],
    skipped: &[SkippedDeclaration],
    table: &CategoryTable,
) -> ValidationResult {
    let produced: HashSet<&str> = generated.iter().map(|g| g.api.name.as_str()).collect();
    let mut by_file: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut count = 0;

    for api in parsed.iter().filter(|api| !produced.contains(api.name.as_str())) {
        by_file.entry(api.file.as_str()).or_default().push(format!("  - {}()", api.name));
        count += 1;
    }
    for skip in skipped.iter().filter(|s| table.explicit(&s.name).is_some()) {
        by_file
            .entry(skip.file.as_str())
            .or_default()
            .push(format!("  - {}() (line {}: {})", skip.name, skip.line, skip.reason));
        count += 1;
    }

    if count == 0 {
        return ValidationResult::ok();
    }

    let mut message = format!(
        "{count} API{} parsed from the declarations {} not generated:",
        if count == 1 { "" } else { "s" },
        if count == 1 { "was" } else { "were" }
    );
    for (file, names) in &by_file {
        message.push_str(&format!("\n{file}"));
        for name in names {
            message.push('\n');
            message.push_str(name);
        }
    }
    ValidationResult::from_errors(vec![
        ValidationError::new(ValidationErrorKind::Missing, message).with_suggestion(MANUAL_TEMPLATE_HINT),
    ])
}

/// Totals and per-category counts.
pub fn summarize(parsed: &[ParsedApi], generated: &[GeneratedCode]) -> CompletenessSummary {
    let mut totals: HashMap<&str, (usize, usize)> = HashMap::new();
    for api in parsed {
        totals.entry(api.category.as_str()).or_default().0 += 1;
    }
    for code in generated {
        totals.entry(code.api.category.as_str()).or_default().1 += 1;
    }

    let mut names: Vec<String> = totals.keys().map(|c| (*c).to_string()).collect();
    categories::sort(&mut names);
    let categories = names
        .into_iter()
        .map(|category| {
            let (total, generated) = totals.get(category.as_str()).copied().unwrap_or_default();
            CategoryCount {
                category,
                total,
                generated,
            }
        })
        .collect();

    CompletenessSummary {
        total: parsed.len(),
        generated: generated.len(),
        categories,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sdkgen_common::ParsedType;

    fn api(name: &str, file: &str, category: &str) -> ParsedApi {
        ParsedApi {
            name: name.to_string(),
            pascal_name: sdkgen_common::to_pascal_case(name),
            original_name: name.to_string(),
            category: category.to_string(),
            file: file.to_string(),
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

    fn generated(api: &ParsedApi) -> GeneratedCode {
        GeneratedCode {
            api: api.clone(),
            csharp: String::new(),
            jslib: String::new(),
            manual: false,
        }
    }

    #[test]
    fn test_complete_run_passes() {
        let apis = vec![api("getDeviceId", "system.d.ts", "SystemInfo")];
        let codes: Vec<GeneratedCode> = apis.iter().map(generated).collect();
        let result = check_completeness(&apis, &codes, &[], &CategoryTable::default());
        assert!(result.success);
    }

    #[test]
    fn test_missing_grouped_by_file() {
        let apis = vec![
            api("openCamera", "media.d.ts", "Media"),
            api("getDeviceId", "system.d.ts", "SystemInfo"),
            api("fetchAlbumPhotos", "media.d.ts", "Media"),
        ];
        let codes = vec![generated(&apis[1])];
        let skipped = vec![
            SkippedDeclaration {
                name: "share".to_string(),
                file: "share.d.ts".to_string(),
                line: 4,
                reason: "unsupported declaration shape".to_string(),
            },
            SkippedDeclaration {
                name: "internalHelper".to_string(),
                file: "share.d.ts".to_string(),
                line: 9,
                reason: "unsupported declaration shape".to_string(),
            },
        ];
        let result = check_completeness(&apis, &codes, &skipped, &CategoryTable::default());
        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.kind, ValidationErrorKind::Missing);
        assert_eq!(
            error.message,
            "3 APIs parsed from the declarations were not generated:\n\
             media.d.ts\n  - openCamera()\n  - fetchAlbumPhotos()\n\
             share.d.ts\n  - share() (line 4: unsupported declaration shape)"
        );
        assert_eq!(error.suggestion.as_deref(), Some(MANUAL_TEMPLATE_HINT));
    }

    #[test]
    fn test_summary_in_category_order() {
        let apis = vec![
            api("vibrate", "x.d.ts", "Other"),
            api("getDeviceId", "system.d.ts", "SystemInfo"),
            api("appLogin", "auth.d.ts", "Authentication"),
        ];
        let codes = vec![generated(&apis[1]), generated(&apis[2])];
        let summary = summarize(&apis, &codes);
        let order: Vec<&str> = summary.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(order, vec!["Authentication", "SystemInfo", "Other"]);
        assert_eq!(summary.categories[2].generated, 0);
        assert!((summary.percentage() - 66.666).abs() < 0.01);
        assert!(summary.to_string().starts_with("Generated 2/3 APIs (66.7%)"));
    }
}
