//! Terminal output of run summaries and reports.

use console::style;
use sdkgen_common::{ValidationError, ValidationErrorKind};
use sdkgen_core::GenerateReport;
use sdkgen_core::golden::{GoldenEntry, GoldenStatus};
use sdkgen_core::validator::{CompletenessSummary, ValidationReport};

pub fn print_generate(report: &GenerateReport) {
    print_summary(&report.summary);
    if !report.warnings.is_empty() {
        println!(
            "{}",
            style(format!("{} parser warning(s), run with SDKGEN_LOG=warn for details", report.warnings.len())).yellow()
        );
    }
    if !report.diagnostics.is_empty() {
        println!("{}", style(format!("{} type diagnostic(s)", report.diagnostics.len())).yellow());
    }
    let written = &report.written;
    println!(
        "Wrote {} file(s), {} unchanged, {} new .meta, {} stale removed",
        written.written.len(),
        written.unchanged.len(),
        written.metas_created.len(),
        written.removed.len()
    );
    for removed in &written.removed {
        println!("  {} {removed}", style("-").red());
    }
    println!("Bridge: {}", report.bridge_path.display());
}

pub fn print_summary(summary: &CompletenessSummary) {
    println!(
        "{} {}/{} APIs ({:.1}%)",
        style("Generated").bold(),
        summary.generated,
        summary.total,
        summary.percentage()
    );
    for count in &summary.categories {
        let marker = if count.generated == count.total {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {marker} {:<16} {}/{}", count.category, count.generated, count.total);
    }
}

/// Summary, then every finding grouped by kind.
pub fn print_validation(report: &ValidationReport) {
    print_summary(&report.summary);
    eprintln!();
    for kind in [
        ValidationErrorKind::TypeUnsupported,
        ValidationErrorKind::Missing,
        ValidationErrorKind::SyntaxError,
    ] {
        let errors: Vec<&ValidationError> = report.result.errors_of(kind).collect();
        if errors.is_empty() {
            continue;
        }
        eprintln!("{}", style(format!("{kind} ({})", errors.len())).red().bold());
        for error in errors {
            eprintln!("{}", indent(&error.to_string()));
        }
        eprintln!();
    }
}

pub fn print_golden(entries: &[GoldenEntry]) {
    for entry in entries {
        match &entry.status {
            GoldenStatus::Updated => println!("  {} {}", style("updated").green(), entry.file),
            GoldenStatus::Matches => println!("  {} {}", style("ok").green(), entry.file),
            GoldenStatus::MissingGolden => {
                println!("  {} {} (no snapshot)", style("missing").red(), entry.file);
            }
            GoldenStatus::Drifted(diff) => {
                println!("  {} {}", style("drifted").red(), entry.file);
                print!("{diff}");
            }
        }
    }
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("  {line}")).collect::<Vec<_>>().join("\n")
}
