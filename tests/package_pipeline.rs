//! End-to-end packaging against an installation on disk

mod common;

use common::{package_manifest, sorted, Site};
use extpack::packager::{list_archive_entries, read_archive_entry, ExportedStatements};
use extpack::parser::manifest::parse_validated_manifest;
use extpack::resolver::FileSetResolver;
use extpack::storage::{BackendKind, EntryInfo};
use extpack::{
    package_extension, DbExporter, Error, Installation, LocalBackend, PackageOptions, PackagePipeline,
    PipelineState, StorageBackend,
};
use pretty_assertions::assert_eq;
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::time::Duration;

fn names(entries: &[extpack::models::ResolvedFileEntry]) -> Vec<String> {
    entries.iter().map(|e| e.archive_entry_name.clone()).collect()
}

#[test]
fn test_site_files_resolve_under_site() {
    let site = Site::with_component();
    let backend = LocalBackend::new();
    let installation = site.installation();

    let job = FileSetResolver::new(&backend, &installation)
        .prepare(&site.component_manifest())
        .unwrap();

    let site_files: Vec<String> = names(job.entries.entries())
        .into_iter()
        .filter(|name| name.starts_with("site/") && !name.starts_with("site/language/"))
        .collect();
    assert_eq!(
        site_files,
        vec![
            "site/index.php",
            "site/views/item/default.php",
            "site/views/list/default.php",
            "site/views/list/view.html.php",
        ]
    );
    let index = job.entries.find_by_source(&site.path("components/com_hello/index.php")).unwrap();
    assert_eq!(index.archive_entry_name, "site/index.php");
}

#[test]
fn test_component_entries_follow_manifest_order() {
    let site = Site::with_component();
    let backend = LocalBackend::new();
    let installation = site.installation();

    let job = FileSetResolver::new(&backend, &installation)
        .prepare(&site.component_manifest())
        .unwrap();

    assert_eq!(job.extension_name, "com_hello");
    assert_eq!(job.state, PipelineState::SectionsResolved);
    assert_eq!(
        names(job.entries.entries()),
        vec![
            "hello.xml",
            "script.php",
            "site/index.php",
            "site/views/item/default.php",
            "site/views/list/default.php",
            "site/views/list/view.html.php",
            "site/language/en-GB/en-GB.com_hello.ini",
            "media/css/hello.css",
            "admin/hello.php",
            "admin/sql/install.mysql.utf8.sql",
            "admin/sql/uninstall.mysql.utf8.sql",
            "admin/language/en-GB/en-GB.com_hello.ini",
            "admin/language/en-GB/en-GB.com_hello.sys.ini",
        ]
    );
    let admin_language = job
        .entries
        .find_by_source(&site.path("administrator/language/en-GB/en-GB.com_hello.sys.ini"))
        .unwrap();
    assert_eq!(admin_language.archive_entry_name, "admin/language/en-GB/en-GB.com_hello.sys.ini");
}

#[test]
fn test_resolving_twice_is_identical() {
    let site = Site::with_component();
    let backend = LocalBackend::new();
    let installation = site.installation();
    let resolver = FileSetResolver::new(&backend, &installation);

    let first = resolver.prepare(&site.component_manifest()).unwrap();
    let second = resolver.prepare(&site.component_manifest()).unwrap();
    assert_eq!(first.entries.entries(), second.entries.entries());
}

#[test]
fn test_duplicate_declarations_collapse() {
    let site = Site::with_component();
    let manifest = common::COMPONENT_MANIFEST.replace(
        "<filename>index.php</filename>",
        "<filename>index.php</filename>\n<filename>index.php</filename>\n<filename>views/list/default.php</filename>",
    );
    site.install_component(&manifest);
    let backend = LocalBackend::new();
    let installation = site.installation();

    let job = FileSetResolver::new(&backend, &installation)
        .prepare(&site.component_manifest())
        .unwrap();

    let all = names(job.entries.entries());
    assert_eq!(all.iter().filter(|n| *n == "site/index.php").count(), 1);
    assert_eq!(all.iter().filter(|n| *n == "site/views/list/default.php").count(), 1);
    assert_eq!(all.len(), 13);
}

#[test]
fn test_missing_sections_are_all_reported() {
    let manifest = common::COMPONENT_MANIFEST
        .replace("<author>Hello Team</author>", "")
        .replace("<version>1.2.0</version>", "");
    let err = parse_validated_manifest(manifest.as_bytes(), "hello.xml").unwrap_err();
    match err {
        Error::MissingSections { names } => assert_eq!(names, vec!["author", "version"]),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_pipeline_fails_on_missing_sections() {
    let site = Site::new();
    site.install_component(&common::COMPONENT_MANIFEST.replace("<license>GPL-2.0-or-later</license>", ""));
    let backend = LocalBackend::new();

    let failure = package_extension(
        &backend,
        &site.installation(),
        &site.component_manifest(),
        &site.output_dir(),
        PackageOptions::default(),
    )
    .unwrap_err();

    assert_eq!(failure.reached, PipelineState::Initialized);
    assert!(matches!(&failure.errors[0], Error::MissingSections { names } if names == &vec!["license".to_string()]));
    assert!(!site.archive_path("com_hello").exists());
}

#[test]
fn test_component_archive_round_trip() {
    let site = Site::with_component();
    let backend = LocalBackend::new();
    let installation = site.installation();

    let job = FileSetResolver::new(&backend, &installation)
        .prepare(&site.component_manifest())
        .unwrap();
    let declared = sorted(names(job.entries.entries()));

    let outcome = package_extension(
        &backend,
        &installation,
        &site.component_manifest(),
        &site.output_dir(),
        PackageOptions::default(),
    )
    .unwrap();

    assert_eq!(outcome.state, PipelineState::Done);
    assert_eq!(outcome.archive_path, site.archive_path("com_hello"));
    assert_eq!(outcome.display_name, "COM_HELLO");
    assert_eq!(outcome.version, "1.2.0");

    let listed = sorted(list_archive_entries(&outcome.archive_path).unwrap());
    assert_eq!(listed, declared);
    assert!(listed.contains(&"hello.xml".to_string()));

    let css = read_archive_entry(&outcome.archive_path, "media/css/hello.css").unwrap();
    assert_eq!(String::from_utf8(css).unwrap(), "body { color: red; }\n");
}

#[test]
fn test_media_without_folder_keeps_media_prefix() {
    let site = Site::new();
    site.install_component(
        &common::COMPONENT_MANIFEST.replace(r#"folder="media""#, ""),
    );
    let backend = LocalBackend::new();
    let installation = site.installation();

    let job = FileSetResolver::new(&backend, &installation)
        .prepare(&site.component_manifest())
        .unwrap();

    let media: Vec<String> = names(job.entries.entries())
        .into_iter()
        .filter(|name| name.ends_with(".css"))
        .collect();
    assert_eq!(media, vec!["media/css/hello.css"]);
}

#[test]
fn test_module_archive_warns_about_optional_sections() {
    let site = Site::new();
    site.install_module();
    let backend = LocalBackend::new();
    let installation = site.installation();

    let pipeline = PackagePipeline::new(&backend, &installation, PackageOptions::default());
    let manifest_path = pipeline.locate("mod_greeting").unwrap();
    let outcome = pipeline.run(&manifest_path, &site.output_dir()).unwrap();

    assert_eq!(
        sorted(outcome.entries.clone()),
        vec!["mod_greeting.php", "mod_greeting.xml", "tmpl/default.php"]
    );
    let warnings: Vec<String> = outcome.diagnostics.warnings.iter().map(|w| w.message.clone()).collect();
    assert!(warnings.contains(&"'languages' section is missing".to_string()));
    assert!(warnings.contains(&"'media' section is missing".to_string()));
}

#[test]
fn test_existing_archive_is_kept_as_backup() {
    let site = Site::with_component();
    let backend = LocalBackend::new();
    let installation = site.installation();
    let run = |rename_existing: bool| {
        package_extension(
            &backend,
            &installation,
            &site.component_manifest(),
            &site.output_dir(),
            PackageOptions {
                rename_existing,
                ..Default::default()
            },
        )
    };

    run(false).unwrap();
    let failure = run(false).unwrap_err();
    assert!(matches!(failure.errors[0], Error::Archive { .. }));

    let outcome = run(true).unwrap();
    assert!(site.output_dir().join("com_hello_0001.zip").is_file());
    assert!(outcome.archive_path.is_file());
    assert!(outcome
        .diagnostics
        .messages
        .iter()
        .any(|m| m.contains("com_hello_0001.zip")));
}

#[test]
fn test_package_bundles_sub_extensions() {
    let site = Site::with_component();
    site.install_module();
    site.write(
        "administrator/manifests/packages/pkg_suite.xml",
        &package_manifest(
            r#"<file type="component" id="com_hello">com_hello.zip</file>
<file type="module" id="mod_greeting" client="site">mod_greeting.zip</file>"#,
        ),
    );
    let backend = LocalBackend::new();
    let installation = site.installation();

    let outcome = package_extension(
        &backend,
        &installation,
        &site.path("administrator/manifests/packages/pkg_suite.xml"),
        &site.output_dir(),
        PackageOptions::default(),
    )
    .unwrap();

    assert_eq!(outcome.extension_name, "pkg_suite");
    assert_eq!(outcome.children, vec!["com_hello", "mod_greeting"]);
    assert_eq!(
        sorted(list_archive_entries(&outcome.archive_path).unwrap()),
        vec!["packages/com_hello.zip", "packages/mod_greeting.zip", "pkg_suite.xml"]
    );

    let nested = site.temp_dir.path().join("nested.zip");
    std::fs::write(
        &nested,
        read_archive_entry(&outcome.archive_path, "packages/mod_greeting.zip").unwrap(),
    )
    .unwrap();
    assert_eq!(
        sorted(list_archive_entries(&nested).unwrap()),
        vec!["mod_greeting.php", "mod_greeting.xml", "tmpl/default.php"]
    );
}

#[test]
fn test_package_reports_every_missing_extension() {
    let site = Site::new();
    site.write(
        "administrator/manifests/packages/pkg_suite.xml",
        &package_manifest(
            r#"<file type="module" id="mod_menu" client="site">mod_menu.zip</file>
<file type="component" id="com_missing">com_missing.zip</file>"#,
        ),
    );
    let backend = LocalBackend::new();

    let failure = package_extension(
        &backend,
        &site.installation(),
        &site.path("administrator/manifests/packages/pkg_suite.xml"),
        &site.output_dir(),
        PackageOptions::default(),
    )
    .unwrap_err();

    assert_eq!(failure.extension_name.as_deref(), Some("pkg_suite"));
    assert_eq!(failure.reached, PipelineState::RequirementsChecked);
    let missing: Vec<String> = failure
        .missing_extensions()
        .iter()
        .map(|e| match e {
            Error::MissingExtension { name, .. } => name.clone(),
            other => other.to_string(),
        })
        .collect();
    assert_eq!(missing, vec!["mod_menu", "com_missing"]);
}

struct FakeExporter {
    requested: RefCell<Vec<String>>,
}

impl DbExporter for FakeExporter {
    fn export(&self, _installation: &Installation, tables: &[String]) -> extpack::Result<ExportedStatements> {
        self.requested.borrow_mut().extend(tables.iter().cloned());
        Ok(ExportedStatements {
            drop: vec!["DROP TABLE IF EXISTS `#__hello_items`;".to_string()],
            create: vec!["CREATE TABLE `#__hello_items` (`id` INT NOT NULL);".to_string()],
            insert: vec!["INSERT INTO `#__hello_items` VALUES (1);".to_string()],
        })
    }
}

#[test]
fn test_database_export_replaces_install_script() {
    let site = Site::with_component();
    let backend = LocalBackend::new();
    let installation = site.installation();
    let exporter = FakeExporter {
        requested: RefCell::new(Vec::new()),
    };
    let options = PackageOptions {
        export_database: true,
        ..Default::default()
    };

    let outcome = PackagePipeline::new(&backend, &installation, options)
        .with_exporter(&exporter)
        .run(&site.component_manifest(), &site.output_dir())
        .unwrap();

    assert_eq!(*exporter.requested.borrow(), vec!["#__hello_items".to_string()]);
    let archive = &outcome.archive_path;
    let install = read_archive_entry(archive, "admin/sql/install.mysql.utf8.sql").unwrap();
    assert_eq!(
        String::from_utf8(install).unwrap(),
        "CREATE TABLE `#__hello_items` (`id` INT NOT NULL);"
    );
    let sample = read_archive_entry(archive, "admin/sql/sampledata.mysql.utf8.sql").unwrap();
    assert_eq!(String::from_utf8(sample).unwrap(), "INSERT INTO `#__hello_items` VALUES (1);");

    let listed = list_archive_entries(archive).unwrap();
    assert_eq!(
        listed.iter().filter(|n| *n == "admin/sql/uninstall.mysql.utf8.sql").count(),
        1
    );
    assert!(outcome
        .diagnostics
        .messages
        .iter()
        .any(|m| m.contains("exported 1 table(s)")));
}

#[test]
fn test_database_export_without_exporter_warns() {
    let site = Site::with_component();
    let backend = LocalBackend::new();
    let options = PackageOptions {
        export_database: true,
        ..Default::default()
    };

    let outcome = package_extension(
        &backend,
        &site.installation(),
        &site.component_manifest(),
        &site.output_dir(),
        options,
    )
    .unwrap();

    assert!(outcome
        .diagnostics
        .warnings
        .iter()
        .any(|w| w.message.contains("no database exporter")));
    let install = read_archive_entry(&outcome.archive_path, "admin/sql/install.mysql.utf8.sql").unwrap();
    assert!(String::from_utf8(install).unwrap().starts_with("CREATE TABLE IF NOT EXISTS"));
}

/// Local files behind a backend that claims it can reconnect
struct Reconnecting {
    inner: LocalBackend,
    reconnects: Cell<usize>,
}

impl StorageBackend for Reconnecting {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn describe(&self) -> String {
        "reconnecting local".to_string()
    }

    fn exists(&self, path: &str) -> bool {
        self.inner.exists(path)
    }

    fn is_file(&self, path: &str) -> bool {
        self.inner.is_file(path)
    }

    fn is_dir(&self, path: &str) -> bool {
        self.inner.is_dir(path)
    }

    fn list_entries(&self, path: &str, recursive: bool, include_dots: bool) -> extpack::Result<Vec<EntryInfo>> {
        self.inner.list_entries(path, recursive, include_dots)
    }

    fn read_file(&self, path: &str) -> extpack::Result<Vec<u8>> {
        self.inner.read_file(path)
    }

    fn download(&self, remote_path: &str, local_path: &Path) -> extpack::Result<()> {
        self.inner.download(remote_path, local_path)
    }

    fn supports_reconnect(&self) -> bool {
        true
    }

    fn reconnect(&self) -> extpack::Result<()> {
        self.reconnects.set(self.reconnects.get() + 1);
        Ok(())
    }
}

#[test]
fn test_reconnect_follows_threshold() {
    let site = Site::with_component();
    let installation = site.installation();
    let backend = Reconnecting {
        inner: LocalBackend::new(),
        reconnects: Cell::new(0),
    };

    let relaxed = PackageOptions {
        reconnect_after: Duration::from_secs(3600),
        ..Default::default()
    };
    PackagePipeline::new(&backend, &installation, relaxed)
        .prepare(&site.component_manifest())
        .unwrap();
    assert_eq!(backend.reconnects.get(), 0);

    let eager = PackageOptions {
        reconnect_after: Duration::ZERO,
        ..Default::default()
    };
    let outcome = PackagePipeline::new(&backend, &installation, eager)
        .run(&site.component_manifest(), &site.output_dir())
        .unwrap();
    assert!(backend.reconnects.get() > 0);
    assert_eq!(outcome.entries.len(), 13);
}
