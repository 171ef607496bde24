//! Report generation

pub mod generator;

use crate::analyzer::{LanguageAnalysis, TemplateComparison};
use crate::models::{PackageOutcome, PipelineFailure};
use anyhow::Result;
use serde::Serialize;

pub fn generate_report(outcome: &PackageOutcome) -> Result<String> {
    generator::generate_markdown_report(outcome)
}

pub fn generate_failure_report(failure: &PipelineFailure) -> Result<String> {
    generator::generate_failure_report(failure)
}

pub fn generate_language_report(analysis: &LanguageAnalysis) -> Result<String> {
    generator::generate_language_markdown(analysis)
}

pub fn generate_template_report(comparison: &TemplateComparison) -> Result<String> {
    generator::generate_template_markdown(comparison)
}

/// Machine-readable form of any report subject
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
