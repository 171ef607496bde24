//! Component tree vs. reference template

use crate::error::Result;
use crate::storage::{EntryTree, StorageBackend};
use crate::utils::helpers::{basename, join_path};
use crate::utils::substitute_placeholders;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Bytes inspected when deciding whether a template file is empty
const EMPTY_PROBE_BYTES: usize = 8192;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateComparison {
    /// Template files (placeholders filled in) with no counterpart in the component
    pub missing_in_component: Vec<String>,
    /// Component files the template does not have
    pub missing_in_template: Vec<String>,
    /// Template files that are blank
    pub empty_template_files: Vec<String>,
}

impl TemplateComparison {
    pub fn is_clean(&self) -> bool {
        self.missing_in_component.is_empty()
            && self.missing_in_template.is_empty()
            && self.empty_template_files.is_empty()
    }
}

/// Diff two directory trees by relative path. `index.html` files are
/// ignored in both directions.
pub fn compare_with_template(
    backend: &dyn StorageBackend,
    component_dir: &str,
    template_dir: &str,
    placeholders: &HashMap<String, String>,
) -> Result<TemplateComparison> {
    let component = EntryTree::build(backend, component_dir)?.relative_files();
    let template_tree = EntryTree::build(backend, template_dir)?;
    let template_raw = template_tree.relative_files();
    let template: Vec<String> = template_raw
        .iter()
        .map(|path| substitute_placeholders(path, placeholders))
        .collect();

    let component_set: HashSet<&str> = component.iter().map(String::as_str).collect();
    let template_set: HashSet<&str> = template.iter().map(String::as_str).collect();
    let counts = |path: &&String| basename(path) != "index.html";

    let mut comparison = TemplateComparison {
        missing_in_component: template
            .iter()
            .filter(counts)
            .filter(|path| !component_set.contains(path.as_str()))
            .cloned()
            .collect(),
        missing_in_template: component
            .iter()
            .filter(counts)
            .filter(|path| !template_set.contains(path.as_str()))
            .cloned()
            .collect(),
        empty_template_files: Vec::new(),
    };

    for relative in &template_raw {
        let path = join_path(&[template_tree.root_path(), relative]);
        let bytes = backend.read_file(&path)?;
        let probe = &bytes[..bytes.len().min(EMPTY_PROBE_BYTES)];
        if String::from_utf8_lossy(probe).trim().is_empty() {
            comparison.empty_template_files.push(relative.clone());
        }
    }

    tracing::info!(
        missing_in_component = comparison.missing_in_component.len(),
        missing_in_template = comparison.missing_in_template.len(),
        empty = comparison.empty_template_files.len(),
        "template comparison finished"
    );
    Ok(comparison)
}
