//! Loading and validating the salesperson roster.

use std::collections::HashSet;
use std::path::Path;

use crate::error::ConfigError;
use crate::record::{pad_admin_code, SalespersonRecord};

/// Load the roster from a JSON array file, normalize administrative codes,
/// and validate join invariants.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or if two
/// entries share a non-empty employee number (the number must uniquely
/// identify a roster entry for the join to be well-defined).
pub fn load_roster(path: &Path) -> Result<Vec<SalespersonRecord>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RosterFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut roster: Vec<SalespersonRecord> = serde_json::from_str(&content)?;

    for entry in &mut roster {
        entry.admin_code = serde_json::Value::String(pad_admin_code(&entry.admin_code));
    }

    validate_roster(&roster)?;

    tracing::info!(entries = roster.len(), path = %path.display(), "loaded roster");
    Ok(roster)
}

fn validate_roster(roster: &[SalespersonRecord]) -> Result<(), ConfigError> {
    let mut seen_numbers = HashSet::new();
    let mut without_number = 0usize;

    for entry in roster {
        let number = entry.employee_no();
        if number.is_empty() {
            without_number += 1;
            continue;
        }
        if !seen_numbers.insert(number.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate employee number in roster: '{number}'"
            )));
        }
    }

    if without_number > 0 {
        tracing::warn!(
            entries = without_number,
            "roster entries without an employee number will never join"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn roster_file(content: &serde_json::Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn load_roster_pads_admin_codes() {
        let file = roster_file(&json!([
            { "담당 사번": "1001", "담당 영업사원": "Kim", "지사": "North", "지점": "Station", "ADM_CD": 1101053 }
        ]));

        let roster = load_roster(file.path()).unwrap();
        assert_eq!(roster[0].padded_admin_code(), "01101053");
        assert_eq!(roster[0].admin_code, json!("01101053"));
    }

    #[test]
    fn load_roster_rejects_duplicate_employee_numbers() {
        let file = roster_file(&json!([
            { "담당 사번": "1001", "담당 영업사원": "Kim" },
            { "담당 사번": 1001, "담당 영업사원": "Lee" }
        ]));

        let err = load_roster(file.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate employee number"));
    }

    #[test]
    fn load_roster_allows_entries_without_numbers() {
        let file = roster_file(&json!([
            { "담당 사번": "", "담당 영업사원": "Kim" },
            { "담당 사번": null, "담당 영업사원": "Lee" }
        ]));

        let roster = load_roster(file.path()).unwrap();
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn load_roster_missing_file_is_an_error() {
        let err = load_roster(Path::new("/nonexistent/roster.json")).unwrap_err();
        assert!(matches!(err, ConfigError::RosterFileIo { .. }));
    }

    #[test]
    fn load_roster_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = load_roster(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::RosterFileParse(_)));
    }
}
