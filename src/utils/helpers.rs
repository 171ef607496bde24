//! Helper utility functions

use regex::Regex;

lazy_static::lazy_static! {
    static ref LOCALE_TAG: Regex = Regex::new(r"^[a-z]{2,3}-[A-Z]{2}$").unwrap();
    static ref INI_NAME: Regex = Regex::new(r"^(.*?)\.(.*?)\.ini$").unwrap();
}

/// Locale used when a language file declares none and its name gives no hint
pub const DEFAULT_LOCALE: &str = "en-GB";

/// Join path segments with forward slashes, dropping empty segments and
/// collapsing repeated separators. A leading slash on the first segment is
/// preserved so absolute roots stay absolute.
pub fn join_path(parts: &[&str]) -> String {
    let absolute = parts
        .iter()
        .find(|p| !p.is_empty())
        .map(|p| p.starts_with('/'))
        .unwrap_or(false);

    let joined = parts
        .iter()
        .flat_map(|p| p.split(['/', '\\']))
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/");

    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Normalize a single path string (separators, duplicate slashes, trailing slash)
pub fn normalize_path(path: &str) -> String {
    join_path(&[path])
}

pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed)
}

pub fn dirname(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(0) => "/",
        Some(idx) => &trimmed[..idx],
        None => "",
    }
}

/// File name without its last extension
pub fn file_stem(path: &str) -> &str {
    let name = basename(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Lower-cased extension of a file name, if any
pub fn file_extension(path: &str) -> Option<String> {
    let name = basename(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(name[idx + 1..].to_lowercase()),
        _ => None,
    }
}

/// Remove a type prefix (`com_`, `mod_`, `pkg_`) case-insensitively,
/// along with any leading whitespace.
pub fn strip_type_prefix(name: &str, prefix: &str) -> String {
    let trimmed = name.trim_start();
    match trimmed.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => trimmed[prefix.len()..].to_string(),
        _ => name.trim().to_string(),
    }
}

/// Canonical `prefix + name` form, whatever prefix state `name` arrives in
pub fn apply_type_prefix(name: &str, prefix: &str) -> String {
    format!("{}{}", prefix, strip_type_prefix(name, prefix))
}

/// Guess the locale of a language file from its name.
///
/// Files are normally named `xx-XX.element.ini`, but `element.xx-XX.ini`
/// turns up as well, so whichever segment looks like a locale tag wins.
/// Returns `None` when neither does.
pub fn infer_locale(file_name: &str) -> Option<String> {
    let caps = INI_NAME.captures(basename(file_name))?;
    [caps.get(1), caps.get(2)]
        .into_iter()
        .flatten()
        .map(|m| m.as_str())
        .find(|segment| LOCALE_TAG.is_match(segment))
        .map(str::to_string)
}

/// Name used to move an existing archive out of the way: `name_0001.zip`
pub fn backup_file_name(file_name: &str, attempt: u32) -> String {
    let stem = file_stem(file_name);
    match file_extension(file_name) {
        Some(ext) => format!("{}_{:04}.{}", stem, attempt, ext),
        None => format!("{}_{:04}", stem, attempt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path(&["/var/www", "", "components/", "/com_foo"]), "/var/www/components/com_foo");
        assert_eq!(join_path(&["site", "views\\default.php"]), "site/views/default.php");
        assert_eq!(join_path(&["", "language/en-GB"]), "language/en-GB");
        assert_eq!(join_path(&["./media", "img.png"]), "media/img.png");
    }

    #[test]
    fn test_basename_dirname() {
        assert_eq!(basename("/a/b/c.xml"), "c.xml");
        assert_eq!(basename("c.xml"), "c.xml");
        assert_eq!(dirname("/a/b/c.xml"), "/a/b");
        assert_eq!(dirname("/c.xml"), "/");
        assert_eq!(dirname("c.xml"), "");
        assert_eq!(file_stem("/a/b/com_foo.xml"), "com_foo");
        assert_eq!(file_extension("x/Y.PHP"), Some("php".to_string()));
        assert_eq!(file_extension(".htaccess"), None);
    }

    #[test_case("com_foo", "com_", "foo" ; "lower prefix")]
    #[test_case("COM_Foo", "com_", "Foo" ; "upper prefix")]
    #[test_case("  mod_menu", "mod_", "menu" ; "leading whitespace")]
    #[test_case("foo", "com_", "foo" ; "no prefix")]
    #[test_case("com_", "com_", "" ; "prefix only")]
    #[test_case("aüx", "ab", "aüx" ; "prefix ends inside a character")]
    fn test_strip_type_prefix(name: &str, prefix: &str, expected: &str) {
        assert_eq!(strip_type_prefix(name, prefix), expected);
    }

    #[test]
    fn test_apply_type_prefix() {
        assert_eq!(apply_type_prefix("foo", "pkg_"), "pkg_foo");
        assert_eq!(apply_type_prefix("PKG_foo", "pkg_"), "pkg_foo");
    }

    #[test_case("en-GB.com_foo.ini", Some("en-GB") ; "locale first")]
    #[test_case("com_foo.de-DE.ini", Some("de-DE") ; "locale second")]
    #[test_case("language/en-GB/en-GB.mod_x.sys.ini", Some("en-GB") ; "nested path")]
    #[test_case("foo.ini", None ; "no segments")]
    #[test_case("com_foo.sys.ini", None ; "no locale")]
    fn test_infer_locale(file: &str, expected: Option<&str>) {
        assert_eq!(infer_locale(file).as_deref(), expected);
    }

    #[test]
    fn test_backup_file_name() {
        assert_eq!(backup_file_name("com_foo.zip", 1), "com_foo_0001.zip");
        assert_eq!(backup_file_name("pkg_bar.zip", 42), "pkg_bar_0042.zip");
    }
}
