//! Installations and the extensions they hold

use super::{ExtensionType, LocaleScope};
use crate::error::{Error, Result};
use crate::storage::StorageBackend;
use crate::utils::helpers::{join_path, strip_type_prefix};
use serde::Deserialize;
use std::collections::BTreeMap;

/// A CMS installation as reported by installation discovery
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Installation {
    pub name: String,
    /// Extension element the caller is working on, if any
    #[serde(default)]
    pub element: Option<String>,
    /// Web root on the backend, forward-slash separated
    pub web_root: String,
    /// Opaque configuration payload of the installation
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

impl Installation {
    pub fn new(name: impl Into<String>, web_root: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            web_root: web_root.into(),
            ..Default::default()
        }
    }

    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// Join path segments onto the web root
    pub fn path(&self, parts: &[&str]) -> String {
        let mut all = Vec::with_capacity(parts.len() + 1);
        all.push(self.web_root.as_str());
        all.extend_from_slice(parts);
        join_path(&all)
    }

    /// Manifest locations tried for an element, most likely first
    pub fn manifest_candidates(
        &self,
        extension_type: ExtensionType,
        element: &str,
        client: Option<LocaleScope>,
    ) -> Vec<String> {
        let prefix = extension_type.prefix();
        let name = strip_type_prefix(element, prefix);
        let element = format!("{}{}", prefix, name);
        match extension_type {
            ExtensionType::Component => vec![
                self.path(&["administrator", "components", &element, &format!("{}.xml", name)]),
                self.path(&["administrator", "components", &element, &format!("{}.xml", element)]),
            ],
            ExtensionType::Module => {
                let site = self.path(&["modules", &element, &format!("{}.xml", element)]);
                let admin = self.path(&[
                    "administrator",
                    "modules",
                    &element,
                    &format!("{}.xml", element),
                ]);
                match client {
                    Some(LocaleScope::Admin) => vec![admin],
                    Some(LocaleScope::Site) => vec![site],
                    None => vec![site, admin],
                }
            }
            ExtensionType::Package => vec![self.path(&[
                "administrator",
                "manifests",
                "packages",
                &format!("{}.xml", element),
            ])],
        }
    }

    /// Find the installed manifest of `element`, or fail with
    /// [`Error::MissingExtension`] naming the most likely location.
    pub fn locate_manifest(
        &self,
        backend: &dyn StorageBackend,
        extension_type: ExtensionType,
        element: &str,
        client: Option<LocaleScope>,
    ) -> Result<String> {
        let candidates = self.manifest_candidates(extension_type, element, client);
        if let Some(found) = candidates.iter().find(|path| backend.is_file(path)) {
            return Ok(found.clone());
        }
        Err(Error::MissingExtension {
            name: element.to_string(),
            manifest: candidates.into_iter().next().unwrap_or_default(),
        })
    }
}

/// Interpret a package `<file client="...">` value
pub fn client_scope(client: &str) -> Option<LocaleScope> {
    match client.trim().to_lowercase().as_str() {
        "admin" | "administrator" => Some(LocaleScope::Admin),
        "site" => Some(LocaleScope::Site),
        _ => None,
    }
}
