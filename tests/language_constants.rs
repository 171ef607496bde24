//! Language constant cross-referencing on an installed component

mod common;

use common::Site;
use extpack::analyzer::{analyze_languages, OrphanedConstant, UnusedConstants};
use extpack::models::LocaleScope;
use extpack::{report, Error, LanguageCrossReferencer, LocalBackend, PackageOptions};
use pretty_assertions::assert_eq;

fn file_types() -> Vec<String> {
    PackageOptions::default().code_file_types
}

fn unused_of<'a>(results: &'a [UnusedConstants], file_suffix: &str) -> &'a [String] {
    &results
        .iter()
        .find(|r| r.file.ends_with(file_suffix))
        .unwrap()
        .constants
}

#[test]
fn test_unused_constants_per_file() {
    let site = Site::with_component();
    let backend = LocalBackend::new();

    let analysis = analyze_languages(&backend, &site.installation(), "com_hello", file_types()).unwrap();

    assert_eq!(analysis.extension_name, "com_hello");
    assert_eq!(analysis.unused.len(), 3);
    assert_eq!(
        unused_of(&analysis.unused, "administrator/language/en-GB/en-GB.com_hello.ini"),
        &["COM_HELLO_UNUSED".to_string()]
    );
    assert!(unused_of(&analysis.unused, "en-GB.com_hello.sys.ini").is_empty());
    // the element name itself is reserved even though no code uses it
    assert!(unused_of(&analysis.unused, "www/language/en-GB/en-GB.com_hello.ini").is_empty());
    assert!(analysis.orphaned.is_empty());
}

#[test]
fn test_unused_reports_exactly_the_unreferenced() {
    let site = Site::with_component();
    site.write(
        "language/en-GB/en-GB.com_hello.ini",
        "COM_HELLO_A=\"A\"\nCOM_HELLO_GREETING=\"B\"\nCOM_HELLO_C=\"C\"\nCOM_HELLO=\"Hello\"\n",
    );
    site.write("components/com_hello/views/item/default.php", "<?php\n");
    site.write("components/com_hello/views/list/default.php", "<?php\n");
    let backend = LocalBackend::new();
    let installation = site.installation();

    let mut referencer = LanguageCrossReferencer::new(&backend, &installation).with_file_types(file_types());
    let manifest = referencer.load_manifest("com_hello").unwrap();
    let unused = referencer.find_unused_constants(&manifest).unwrap();

    let site_file = unused.iter().find(|r| r.scope == LocaleScope::Site).unwrap();
    assert_eq!(site_file.constants, vec!["COM_HELLO_A", "COM_HELLO_C"]);
}

#[test]
fn test_orphaned_constants_stay_in_scope() {
    let site = Site::with_component();
    site.write(
        "components/com_hello/views/item/default.php",
        "<?php\necho Text::_('COM_HELLO_FORGOTTEN');\n// COM_HELLO_ADMIN_TITLE\n",
    );
    let backend = LocalBackend::new();

    let analysis = analyze_languages(&backend, &site.installation(), "com_hello", file_types()).unwrap();

    let view = site.path("components/com_hello/views/item/default.php");
    assert_eq!(
        analysis.orphaned,
        vec![
            OrphanedConstant {
                scope: LocaleScope::Site,
                file: view.clone(),
                line: 2,
                constant: "COM_HELLO_FORGOTTEN".to_string(),
            },
            OrphanedConstant {
                scope: LocaleScope::Site,
                file: view,
                line: 3,
                constant: "COM_HELLO_ADMIN_TITLE".to_string(),
            },
        ]
    );
    let site_unused = analysis.unused.iter().find(|r| r.scope == LocaleScope::Site).unwrap();
    assert_eq!(site_unused.constants, vec!["COM_HELLO_ITEM"]);
}

#[test]
fn test_language_syntax_error_reports_line() {
    let site = Site::with_component();
    site.write(
        "language/en-GB/en-GB.com_hello.ini",
        "COM_HELLO=\"Hello\"\n\nthis is not valid\n",
    );
    let backend = LocalBackend::new();

    let err = analyze_languages(&backend, &site.installation(), "com_hello", file_types()).unwrap_err();
    match err {
        Error::Syntax { file, line, .. } => {
            assert_eq!(line, 3);
            assert!(file.ends_with("language/en-GB/en-GB.com_hello.ini"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_unknown_element() {
    let site = Site::with_component();
    let backend = LocalBackend::new();

    let err = analyze_languages(&backend, &site.installation(), "com_absent", file_types()).unwrap_err();
    assert!(err.is_missing_extension());
}

#[test]
fn test_language_report() {
    let site = Site::with_component();
    let backend = LocalBackend::new();
    let analysis = analyze_languages(&backend, &site.installation(), "com_hello", file_types()).unwrap();

    let markdown = report::generate_language_report(&analysis).unwrap();
    assert!(markdown.starts_with("# Language Constants: com_hello"));
    assert!(markdown.contains("- `COM_HELLO_UNUSED`"));
    assert!(markdown.contains("No orphaned constants found."));

    let json = report::to_json(&analysis.unused).unwrap();
    assert!(json.contains("\"COM_HELLO_UNUSED\""));
    assert!(json.contains("\"Admin\""));
}
