//! Text format of the key mapping file.
//!
//! One remote per line, eleven comma-separated fields:
//!
//! ```text
//! AA:BB:CC:DD:EE:FF, 0x00, 0x01, 0x02, 0x03, 0x05, 0x7E, 0x7D, 0x24, 0x33, 0x31
//! │                  │     │     │     │     │     │     │     │     │     └ whammy
//! │                  │     │     │     │     │     │     │     │     └ minus
//! │                  │     │     │     │     │     │     │     └ plus
//! │                  │     │     │     │     │     │     └ strum down
//! │                  │     │     │     │     │     └ strum up
//! │                  green red   yellow blue orange
//! └ remote address
//! ```
//!
//! Fields are trimmed; blank lines are skipped.  Key codes are hexadecimal
//! with a `0x` prefix and must fit in 16 bits.
//!
//! A bad line never aborts the load: it is recorded in
//! [`MappingLoadReport::errors`] and parsing continues with the next line.

use thiserror::Error;

use crate::domain::guitar::CONTROL_COUNT;
use crate::domain::identity::{InvalidAddress, RemoteIdentity};
use crate::keymap::{KeyCode, MappingEntry, MappingTable};

/// Fields per line: identity plus one key per control.
pub const FIELDS_PER_LINE: usize = CONTROL_COUNT + 1;

/// A problem with one line of the mapping file.  Line numbers are 1-based.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingLoadError {
    #[error("line {line}: expected {FIELDS_PER_LINE} comma-separated fields, found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: {source}")]
    BadIdentity {
        line: usize,
        #[source]
        source: InvalidAddress,
    },

    #[error("line {line}, field {field}: invalid key code {value:?} (expected 0x0000–0xFFFF)")]
    BadKeyCode {
        line: usize,
        field: usize,
        value: String,
    },
}

/// Result of parsing a whole mapping file.
#[derive(Debug, Default)]
pub struct MappingLoadReport {
    /// Every line that parsed cleanly.
    pub table: MappingTable,
    /// Every line that did not, in file order.
    pub errors: Vec<MappingLoadError>,
}

impl MappingLoadReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parses mapping-file text into a complete table plus per-line errors.
///
/// # Examples
///
/// ```rust
/// use wiikey_core::keymap::{parse_mapping_file, KeyCode};
/// use wiikey_core::RemoteIdentity;
///
/// let line = "AA:BB:CC:DD:EE:FF,0x01,0x02,0x03,0x04,0x05,0x06,0x07,0x08,0x09,0x0A\n";
/// let report = parse_mapping_file(line);
/// let id: RemoteIdentity = "AA:BB:CC:DD:EE:FF".parse().unwrap();
/// assert!(report.is_clean());
/// assert_eq!(report.table.lookup(id, 9), Some(KeyCode(0x0A)));
/// ```
pub fn parse_mapping_file(text: &str) -> MappingLoadReport {
    let mut entries = Vec::new();
    let mut errors = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        match parse_line(i + 1, raw) {
            Ok(entry) => entries.push(entry),
            Err(e) => errors.push(e),
        }
    }

    MappingLoadReport {
        table: MappingTable::from_entries(entries),
        errors,
    }
}

fn parse_line(line: usize, raw: &str) -> Result<(RemoteIdentity, MappingEntry), MappingLoadError> {
    let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
    if fields.len() != FIELDS_PER_LINE {
        return Err(MappingLoadError::FieldCount {
            line,
            found: fields.len(),
        });
    }

    let identity = fields[0]
        .parse::<RemoteIdentity>()
        .map_err(|source| MappingLoadError::BadIdentity { line, source })?;

    let mut keys = [KeyCode(0); CONTROL_COUNT];
    for (slot, (field, value)) in keys.iter_mut().zip(fields.iter().enumerate().skip(1)) {
        *slot = parse_key_code(value).ok_or_else(|| MappingLoadError::BadKeyCode {
            line,
            field,
            value: value.to_string(),
        })?;
    }

    Ok((identity, MappingEntry::new(keys)))
}

/// Parses `0x1E` / `0X1e` into a [`KeyCode`].
fn parse_key_code(field: &str) -> Option<KeyCode> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))?;
    if digits.is_empty() || digits.len() > 4 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(digits, 16).ok().map(KeyCode)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "AA:BB:CC:DD:EE:FF,0x01,0x02,0x03,0x04,0x05,0x06,0x07,0x08,0x09,0x0A";

    fn id() -> RemoteIdentity {
        "AA:BB:CC:DD:EE:FF".parse().unwrap()
    }

    #[test]
    fn test_single_line_maps_first_and_last_index() {
        // Act
        let report = parse_mapping_file(GOOD);

        // Assert
        assert!(report.is_clean());
        assert_eq!(report.table.lookup(id(), 0), Some(KeyCode(0x01)));
        assert_eq!(report.table.lookup(id(), 9), Some(KeyCode(0x0A)));
    }

    #[test]
    fn test_whitespace_around_fields_and_blank_lines_are_ignored() {
        let text = concat!(
            "\n   \n",
            " AA:BB:CC:DD:EE:FF , 0x01,0x02, 0x03,0x04,0x05,0x06,0x07,0x08,0x09, 0x0A \r\n",
            "\n",
        );
        let report = parse_mapping_file(text);
        assert!(report.is_clean(), "errors: {:?}", report.errors);
        assert_eq!(report.table.len(), 1);
        assert_eq!(report.table.lookup(id(), 9), Some(KeyCode(0x0A)));
    }

    #[test]
    fn test_wrong_field_count_skips_only_that_line() {
        // Arrange
        let text = format!("AA:BB:CC:DD:EE:00,0x01,0x02\n{GOOD}\n");

        // Act
        let report = parse_mapping_file(&text);

        // Assert
        assert_eq!(report.errors, vec![MappingLoadError::FieldCount { line: 1, found: 3 }]);
        assert_eq!(report.table.lookup(id(), 0), Some(KeyCode(0x01)));
    }

    #[test]
    fn test_bad_hex_skips_line_and_continues() {
        // Arrange – line 1 has a bad key in field 4; line 2 is valid
        let bad = "11:22:33:44:55:66,0x01,0x02,0x03,0xZZ,0x05,0x06,0x07,0x08,0x09,0x0A";
        let text = format!("{bad}\n{GOOD}");

        // Act
        let report = parse_mapping_file(&text);

        // Assert
        assert_eq!(
            report.errors,
            vec![MappingLoadError::BadKeyCode {
                line: 1,
                field: 4,
                value: "0xZZ".to_string(),
            }]
        );
        assert_eq!(report.table.len(), 1);
        assert!(report.table.entry(id()).is_some());
    }

    #[test]
    fn test_bad_identity_is_reported() {
        let text = "not-an-address,0x01,0x02,0x03,0x04,0x05,0x06,0x07,0x08,0x09,0x0A";
        let report = parse_mapping_file(text);
        assert!(matches!(report.errors[..], [MappingLoadError::BadIdentity { line: 1, .. }]));
        assert!(report.table.is_empty());
    }

    #[test]
    fn test_all_errors_are_collected_in_file_order() {
        let text = "\
a,b
11:22:33:44:55:66,1,2,3,4,5,6,7,8,9,10
AA:BB:CC:DD:EE:FF,0x01,0x02,0x03,0x04,0x05,0x06,0x07,0x08,0x09,0x10000
";
        let report = parse_mapping_file(text);
        let lines: Vec<usize> = report
            .errors
            .iter()
            .map(|e| match e {
                MappingLoadError::FieldCount { line, .. }
                | MappingLoadError::BadIdentity { line, .. }
                | MappingLoadError::BadKeyCode { line, .. } => *line,
            })
            .collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert!(report.table.is_empty());
    }

    #[test]
    fn test_parse_key_code_accepts_prefixed_hex_only() {
        assert_eq!(parse_key_code("0x1E"), Some(KeyCode(0x1E)));
        assert_eq!(parse_key_code("0X1e"), Some(KeyCode(0x1E)));
        assert_eq!(parse_key_code("0xFFFF"), Some(KeyCode(0xFFFF)));
        assert_eq!(parse_key_code("1E"), None);
        assert_eq!(parse_key_code("0x"), None);
        assert_eq!(parse_key_code("0x+1"), None);
        assert_eq!(parse_key_code("0x10000"), None);
    }
}
