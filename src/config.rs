//! File-based configuration
//!
//! ```toml
//! [installation]
//! name = "staging"
//! web_root = "/var/www/joomla"
//!
//! [remote]
//! host = "ftp.example.com"
//! username = "deploy"
//!
//! [package]
//! export_database = false
//! reconnect_after_secs = 10
//! output_dir = "dist"
//! ```

use crate::error::{Error, Result};
use crate::models::Installation;
use crate::storage::ConnectionSettings;
use crate::PackageOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub installation: Installation,
    #[serde(default)]
    pub remote: Option<ConnectionSettings>,
    #[serde(default)]
    pub package: PackageSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackageSection {
    pub export_database: bool,
    pub reconnect_after_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub rename_existing: bool,
    pub code_file_types: Option<Vec<String>>,
}

impl AppConfig {
    /// Load from a `.toml` or `.json` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let config: Self = serde_json::from_str(&content)
                    .map_err(|e| Error::config(format!("invalid JSON in {}: {}", path.display(), e)))?;
                config.check()?;
                Ok(config)
            }
            _ => Self::from_toml(&content).map_err(|e| match e {
                Error::Config { message } => Error::config(format!("{}: {}", path.display(), message)),
                other => other,
            }),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::config(format!("invalid TOML: {}", e)))?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.installation.web_root.trim().is_empty() {
            return Err(Error::config("installation.web_root is empty"));
        }
        if let Some(remote) = &self.remote {
            if remote.host.trim().is_empty() {
                return Err(Error::config("remote.host is empty"));
            }
        }
        Ok(())
    }

    /// Options for a packaging run, defaults filled in
    pub fn package_options(&self) -> PackageOptions {
        let defaults = PackageOptions::default();
        PackageOptions {
            export_database: self.package.export_database,
            reconnect_after: self
                .package
                .reconnect_after_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.reconnect_after),
            rename_existing: self.package.rename_existing,
            code_file_types: self
                .package
                .code_file_types
                .clone()
                .unwrap_or(defaults.code_file_types),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.package
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_minimal_toml() {
        let config = AppConfig::from_toml(
            r#"
            [installation]
            name = "local"
            web_root = "/var/www/html"
            "#,
        )
        .unwrap();
        assert_eq!(config.installation.web_root, "/var/www/html");
        assert!(config.remote.is_none());
        let options = config.package_options();
        assert!(!options.export_database);
        assert_eq!(options.reconnect_after, Duration::from_secs(10));
        assert_eq!(options.code_file_types, vec!["php", "phtml", "xml"]);
    }

    #[test]
    fn test_full_toml() {
        let config = AppConfig::from_toml(
            r#"
            [installation]
            name = "staging"
            element = "com_hello"
            web_root = "/public_html"

            [installation.settings]
            dbprefix = "jos_"

            [remote]
            host = "ftp.example.com"
            username = "deploy"
            password = "secret"
            use_tls = true
            timeout_secs = 5

            [package]
            export_database = true
            reconnect_after_secs = 3
            output_dir = "dist"
            rename_existing = true
            "#,
        )
        .unwrap();
        let remote = config.remote.as_ref().unwrap();
        assert_eq!(remote.port, 21);
        assert!(remote.passive);
        assert_eq!(remote.timeout(), Duration::from_secs(5));
        assert_eq!(config.installation.settings["dbprefix"], "jos_");
        assert_eq!(config.installation.element.as_deref(), Some("com_hello"));
        assert_eq!(config.package_options().reconnect_after, Duration::from_secs(3));
        assert_eq!(config.output_dir(), PathBuf::from("dist"));
    }

    #[test]
    fn test_invalid_files() {
        assert!(matches!(
            AppConfig::from_toml("[installation]\nname = \"x\"\nweb_root = \"\""),
            Err(Error::Config { .. })
        ));
        assert!(matches!(AppConfig::from_toml("not toml ["), Err(Error::Config { .. })));
        assert!(matches!(
            AppConfig::load(Path::new("/nonexistent/extpack.toml")),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_load_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("extpack.json");
        fs::write(
            &path,
            r#"{"installation": {"name": "j", "web_root": "/srv/www"}, "package": {"rename_existing": true}}"#,
        )
        .unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert!(config.package_options().rename_existing);
    }
}
