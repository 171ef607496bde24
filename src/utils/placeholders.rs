//! `{{placeholder}}` tokens
//!
//! Manifests and template trees may carry `{{name}}` tokens that a separate
//! templating step fills in. They are substituted when comparing against a
//! template and escaped whenever manifest text is echoed verbatim.

use regex::{Captures, Regex};
use std::collections::HashMap;

lazy_static::lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{(.*?)\}\}").unwrap();
}

/// Names of every placeholder in `text`, in order of appearance
pub fn find_placeholders(text: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Replace known placeholders; unknown ones are left untouched
pub fn substitute_placeholders(text: &str, values: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| {
            values
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Escape tokens so a renderer will not treat them as placeholders
pub fn escape_placeholders(text: &str) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| format!("\\{{\\{{{}\\}}\\}}", &caps[1]))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_placeholders() {
        assert_eq!(
            find_placeholders("{{com_name}}/views/{{view}}.php"),
            vec!["com_name".to_string(), "view".to_string()]
        );
        assert!(find_placeholders("plain").is_empty());
    }

    #[test]
    fn test_substitute_keeps_unknown() {
        let mut values = HashMap::new();
        values.insert("com_name".to_string(), "helloworld".to_string());
        assert_eq!(
            substitute_placeholders("{{com_name}}/{{other}}.php", &values),
            "helloworld/{{other}}.php"
        );
    }

    #[test]
    fn test_escape_placeholders() {
        assert_eq!(escape_placeholders("<name>{{x}}</name>"), r"<name>\{\{x\}\}</name>");
    }
}
