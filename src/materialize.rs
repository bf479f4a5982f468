//! Persisting a rendered query as a new table.

use chrono::NaiveDateTime;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const SEPARATORS: &[char] = &[' ', '-', '~'];
const BLACKLIST: &[char] = &[
    '&', '\'', '(', '[', '{', '|', '}', ']', ')', '`', '^', '\\', '/', '@', '+', '=', '*', '°',
    '$', '£', '%', '§', '#', '.', '?', '!', ';', ':', '<', '>', '"',
];

/// Simplifies a user label into something usable as an unquoted identifier.
pub fn normalize(label: &str) -> String {
    label
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| !BLACKLIST.contains(c))
        .map(|c| if SEPARATORS.contains(&c) { '_' } else { c })
        .nfc()
        .collect()
}

pub fn table_name(label: &str, captured_at: NaiveDateTime) -> String {
    format!("{}_{}", normalize(label), captured_at.format(TIMESTAMP_FORMAT))
}

/// Name under which the host displays the resulting layer.
pub fn layer_name(label: &str, captured_at: NaiveDateTime) -> String {
    format!("{} {}", label, captured_at.format(TIMESTAMP_FORMAT))
}

/// Statements creating `table` from `query`, optionally inside `schema`.
///
/// There is no existence check: the timestamp suffix keeps names apart.
pub fn statements(schema: Option<&str>, table: &str, query: &str) -> Vec<String> {
    let qualified = match schema {
        Some(schema) => format!("{schema}.{table}"),
        None => table.to_string(),
    };
    vec![format!("CREATE TABLE {qualified} AS {query}")]
}
