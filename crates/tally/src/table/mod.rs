//! Flat `key,value` tables read from configuration storage.
//!
//! Both tables share the same on-disk format: one record per line, the key and the value
//! separated by a comma. Blank lines and lines starting with `#` are ignored. Any other line
//! that does not conform is reported as a [`MalformedRecord`] and skipped; a bad line never
//! aborts loading of the rest of the table.

pub mod quota;
pub mod source;
pub mod weight;

use crate::common::error::MalformedRecord;

pub type ParsedTable<V> = (Vec<(String, V)>, Vec<MalformedRecord>);

/// Splits `text` into `(key, value)` records, in table order.
///
/// `parse_value` receives the trimmed value column and returns a description of the problem
/// when the value is not acceptable.
pub fn parse_key_value_lines<V, F>(text: &str, parse_value: F) -> ParsedTable<V>
where
    F: Fn(&str) -> Result<V, String>,
{
    let mut records = Vec::new();
    let mut malformed = Vec::new();

    // Editors on some platforms prepend a byte order mark, it is not part of the first key
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let bad_line = |reason: String| MalformedRecord {
            line: index + 1,
            content: trimmed.to_string(),
            reason,
        };

        let Some((key, value)) = trimmed.split_once(',') else {
            malformed.push(bad_line("missing `,` separator".to_string()));
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            malformed.push(bad_line("empty key".to_string()));
            continue;
        }
        match parse_value(value.trim()) {
            Ok(value) => records.push((key.to_string(), value)),
            Err(reason) => malformed.push(bad_line(reason)),
        }
    }
    (records, malformed)
}

fn report_malformed(table: &str, malformed: &[MalformedRecord]) {
    for record in malformed {
        log::warn!("Skipping malformed {table} record at {record}");
    }
}
