//! Post-generation validation.
//!
//! A run fails when any parsed API has no generated code, when a type could
//! not be rendered, or when a generated file is structurally broken. Every
//! finding is collected before the verdict so one run reports all of them.

mod completeness;
mod syntax;

pub use completeness::{CategoryCount, CompletenessSummary, check_completeness, summarize};
pub use syntax::{Balance, balance, check_file};

use sdkgen_common::ValidationResult;
use tracing::debug;

use crate::categories::CategoryTable;
use crate::generator::GeneratorOutput;
use crate::parser::ParseOutput;

/// Verdict and counts of one run.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// All findings; `success` decides the exit status.
    pub result: ValidationResult,
    /// Parsed versus generated counts.
    pub summary: CompletenessSummary,
}

/// Validate generator output against what was parsed.
///
/// Findings are ordered `type-unsupported`, `missing`, then `syntax-error`.
pub fn validate(parsed: &ParseOutput, output: &GeneratorOutput, table: &CategoryTable) -> ValidationReport {
    let mut result = ValidationResult::from_errors(output.errors.clone());
    result.merge(check_completeness(&parsed.apis, &output.generated, &parsed.skipped, table));
    for file in &output.files {
        let errors = check_file(file);
        debug!(file = %file.path, errors = errors.len(), "Checked generated file");
        result.merge(ValidationResult::from_errors(errors));
    }

    ValidationReport {
        result,
        summary: summarize(&parsed.apis, &output.generated),
    }
}
