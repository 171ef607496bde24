//! Report generation

use crate::analyzer::{LanguageAnalysis, TemplateComparison};
use crate::models::{Diagnostics, PackageOutcome, PipelineFailure};
use crate::utils::escape_placeholders;
use anyhow::Result;

pub fn generate_markdown_report(outcome: &PackageOutcome) -> Result<String> {
    let mut report = String::new();

    report.push_str("# Extension Package Report\n\n");

    // Summary
    report.push_str("## Summary\n\n");
    report.push_str(&format!(
        "- **Extension**: {} ({}) v{}\n",
        escape_placeholders(&outcome.display_name),
        outcome.extension_name,
        escape_placeholders(&outcome.version)
    ));
    report.push_str(&format!("- **Type**: {}\n", outcome.extension_type));
    report.push_str(&format!("- **Status**: {}\n", outcome.state));
    report.push_str(&format!("- **Archive**: {}\n", outcome.archive_path.display()));
    report.push_str(&format!("- **Entries**: {}\n", outcome.entries.len()));
    report.push_str("\n");

    if !outcome.children.is_empty() {
        report.push_str("## Bundled Extensions\n\n");
        for child in &outcome.children {
            report.push_str(&format!("- `packages/{}.zip`\n", child));
        }
        report.push_str("\n");
    }

    report.push_str("## Archive Contents\n\n");
    for entry in &outcome.entries {
        report.push_str(&format!("- `{}`\n", entry));
    }
    report.push_str("\n");

    write_diagnostics(&mut report, &outcome.diagnostics);
    Ok(report)
}

pub fn generate_failure_report(failure: &PipelineFailure) -> Result<String> {
    let mut report = String::new();

    report.push_str("# Extension Package Report\n\n");
    report.push_str("## Summary\n\n");
    if let Some(name) = &failure.extension_name {
        report.push_str(&format!("- **Extension**: {}\n", name));
    }
    report.push_str(&format!("- **Status**: failed after '{}'\n", failure.reached));
    report.push_str("\n");

    report.push_str("## ⛔ Errors\n\n");
    for error in &failure.errors {
        report.push_str(&format!("- {}\n", error));
    }
    report.push_str("\n");

    let missing = failure.missing_extensions();
    if !missing.is_empty() {
        report.push_str("## Missing Extensions\n\n");
        report.push_str(
            "The package bundles extensions that are not installed. Install them, then package again:\n\n",
        );
        for error in missing {
            report.push_str(&format!("- {}\n", error));
        }
        report.push_str("\n");
    }

    write_diagnostics(&mut report, &failure.diagnostics);
    Ok(report)
}

pub fn generate_language_markdown(analysis: &LanguageAnalysis) -> Result<String> {
    let mut report = String::new();

    report.push_str(&format!("# Language Constants: {}\n\n", analysis.extension_name));

    report.push_str("## Unused Constants\n\n");
    let mut any_unused = false;
    for file in analysis.unused.iter().filter(|f| !f.constants.is_empty()) {
        any_unused = true;
        report.push_str(&format!("### {} ({})\n\n", file.file, file.scope.as_str()));
        for constant in &file.constants {
            report.push_str(&format!("- `{}`\n", constant));
        }
        report.push_str("\n");
    }
    if !any_unused {
        report.push_str("No unused constants found.\n\n");
    }

    report.push_str("## Orphaned Constants\n\n");
    if analysis.orphaned.is_empty() {
        report.push_str("No orphaned constants found.\n\n");
    } else {
        report.push_str("| Scope | File | Line | Constant |\n");
        report.push_str("|---|---|---|---|\n");
        for orphan in &analysis.orphaned {
            report.push_str(&format!(
                "| {} | {} | {} | `{}` |\n",
                orphan.scope.as_str(),
                orphan.file,
                orphan.line,
                orphan.constant
            ));
        }
        report.push_str("\n");
    }

    write_diagnostics(&mut report, &analysis.diagnostics);
    Ok(report)
}

pub fn generate_template_markdown(comparison: &TemplateComparison) -> Result<String> {
    let mut report = String::new();
    report.push_str("# Template Comparison\n\n");
    let sections = [
        ("Files missing from the component", &comparison.missing_in_component),
        ("Files missing from the template", &comparison.missing_in_template),
        ("Empty template files", &comparison.empty_template_files),
    ];
    for (title, files) in sections {
        report.push_str(&format!("## {}\n\n", title));
        if files.is_empty() {
            report.push_str("None.\n\n");
            continue;
        }
        for file in files {
            report.push_str(&format!("- `{}`\n", escape_placeholders(file)));
        }
        report.push_str("\n");
    }
    Ok(report)
}

fn write_diagnostics(report: &mut String, diagnostics: &Diagnostics) {
    if !diagnostics.warnings.is_empty() {
        report.push_str("## ⚠️ Warnings\n\n");
        for warning in &diagnostics.warnings {
            report.push_str(&format!("- {}\n", escape_placeholders(&warning.to_string())));
        }
        report.push_str("\n");
    }
    if !diagnostics.messages.is_empty() {
        report.push_str("## ℹ️ Messages\n\n");
        for message in &diagnostics.messages {
            report.push_str(&format!("- {}\n", message));
        }
        report.push_str("\n");
    }
}
