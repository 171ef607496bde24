//! Table names from install/uninstall SQL scripts

use crate::models::SqlScan;
use regex::Regex;

lazy_static::lazy_static! {
    static ref NO_DATA: Regex = Regex::new(r"^#[ \t]*__no_data__").unwrap();
    static ref CREATE_QUOTED: Regex =
        Regex::new(r"(?i)CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?`([^`]+)`").unwrap();
    static ref CREATE_BARE: Regex =
        Regex::new(r"(?i)CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?([^\s`(;]+)").unwrap();
    static ref DROP_QUOTED: Regex =
        Regex::new(r"(?i)DROP\s+TABLE\s+(?:IF\s+EXISTS\s+)?`([^`]+)`").unwrap();
    static ref DROP_BARE: Regex =
        Regex::new(r"(?i)DROP\s+TABLE\s+(?:IF\s+EXISTS\s+)?([^\s`(;,]+)").unwrap();
}

/// True when the script opts out of data export with a leading `# __no_data__`
pub fn is_no_data(content: &str) -> bool {
    NO_DATA.is_match(content.trim_start_matches('\u{feff}'))
}

fn table_names(content: &str, quoted: &Regex, bare: &Regex) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let pattern = if quoted.is_match(content) { quoted } else { bare };
    for caps in pattern.captures_iter(content) {
        let name = caps[1].trim().to_string();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Tables created by the script, in order of appearance
pub fn create_table_names(content: &str) -> Vec<String> {
    table_names(content, &CREATE_QUOTED, &CREATE_BARE)
}

/// Tables dropped by the script, in order of appearance
pub fn drop_table_names(content: &str) -> Vec<String> {
    table_names(content, &DROP_QUOTED, &DROP_BARE)
}

/// Classify an install script: opted out, or the tables it creates
pub fn scan_install_script(content: &str) -> SqlScan {
    if is_no_data(content) {
        SqlScan::NoData
    } else {
        SqlScan::Tables(create_table_names(content))
    }
}

/// Classify an uninstall script: opted out, or the tables it drops
pub fn scan_uninstall_script(content: &str) -> SqlScan {
    if is_no_data(content) {
        SqlScan::NoData
    } else {
        SqlScan::Tables(drop_table_names(content))
    }
}
