//! Append-only, bounded edit history.
//!
//! Records are kept newest-first and the cap is enforced immediately after
//! every append, before the log is handed to persistence. The serialized
//! shape matches the files written by earlier versions of the tool,
//! including the `storeCode` → `storeId` field rename: both names are
//! accepted on read.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::record::normalize_value;

/// Default retention for the server-side history file.
pub const DEFAULT_HISTORY_CAP: usize = 1000;

/// A before/after pair for one edited field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    #[serde(default)]
    pub before: Value,
    #[serde(default)]
    pub after: Value,
}

/// The two fields an edit can touch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditChanges {
    #[serde(rename = "salesNumber", default)]
    pub employee_number: FieldChange,
    #[serde(default)]
    pub salesperson: FieldChange,
}

/// One immutable history entry, created exactly once per successful edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRecord {
    /// ISO-8601 timestamp of the edit.
    pub timestamp: String,

    /// Derived store identity. Older files used `storeCode`.
    #[serde(rename = "storeId", alias = "storeCode")]
    pub store_id: String,

    #[serde(rename = "storeName", default)]
    pub store_name: String,

    #[serde(
        rename = "businessNumber",
        default,
        skip_serializing_if = "Value::is_null"
    )]
    pub business_number: Value,

    pub changes: EditChanges,

    #[serde(default)]
    pub reason: String,

    #[serde(default)]
    pub note: String,

    #[serde(rename = "user", default)]
    pub actor: String,
}

/// Newest-first bounded log of [`EditRecord`]s.
#[derive(Debug, Clone)]
pub struct EditHistoryLog {
    entries: Vec<EditRecord>,
    cap: usize,
}

impl EditHistoryLog {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            entries: Vec::new(),
            cap: cap.max(1),
        }
    }

    /// Wrap existing entries (assumed newest-first), truncating to the cap.
    #[must_use]
    pub fn with_entries(mut entries: Vec<EditRecord>, cap: usize) -> Self {
        let cap = cap.max(1);
        entries.truncate(cap);
        Self { entries, cap }
    }

    /// Insert at the head; entries beyond the cap are evicted immediately,
    /// so persistence always sees an already-bounded log.
    pub fn append(&mut self, record: EditRecord) {
        self.entries.insert(0, record);
        self.entries.truncate(self.cap);
    }

    /// All entries, optionally restricted to one store id, newest first.
    #[must_use]
    pub fn list(&self, store_id: Option<&str>) -> Vec<EditRecord> {
        match store_id {
            Some(id) => self
                .entries
                .iter()
                .filter(|record| record.store_id == id)
                .cloned()
                .collect(),
            None => self.entries.clone(),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[EditRecord] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Serialize the log to CSV for spreadsheet import.
    ///
    /// Every field is quoted (embedded quotes doubled, commas safe) and the
    /// output starts with a UTF-8 byte-order mark so spreadsheet tools detect
    /// the encoding of the Korean headers correctly.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::HistoryExport`] if CSV serialization fails.
    pub fn export_csv(&self) -> Result<Vec<u8>, CoreError> {
        let mut out: Vec<u8> = "\u{FEFF}".as_bytes().to_vec();

        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(Vec::new());

        writer.write_record([
            "수정일시",
            "거래처코드",
            "거래처명",
            "사업자번호",
            "수정전_담당사번",
            "수정후_담당사번",
            "수정전_담당영업사원",
            "수정후_담당영업사원",
            "수정사유",
            "메모",
            "수정자",
        ])?;

        for record in &self.entries {
            writer.write_record([
                record.timestamp.clone(),
                record.store_id.clone(),
                record.store_name.clone(),
                normalize_value(&record.business_number),
                normalize_value(&record.changes.employee_number.before),
                normalize_value(&record.changes.employee_number.after),
                normalize_value(&record.changes.salesperson.before),
                normalize_value(&record.changes.salesperson.after),
                record.reason.clone(),
                record.note.clone(),
                record.actor.clone(),
            ])?;
        }

        let body = writer
            .into_inner()
            .map_err(|e| CoreError::HistoryExport(e.into_error().into()))?;
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Load a history file, returning an empty log when the file does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::HistoryIo`] on read failure other than
    /// not-found, or [`CoreError::HistoryParse`] on malformed JSON.
    pub fn load(path: &Path, cap: usize) -> Result<Self, CoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::new(cap));
            }
            Err(e) => {
                return Err(CoreError::HistoryIo {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };
        let entries: Vec<EditRecord> = serde_json::from_str(&content)?;
        Ok(Self::with_entries(entries, cap))
    }

    /// Persist the log as a JSON array, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::HistoryIo`] on write failure.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let content =
            serde_json::to_string_pretty(&self.entries).map_err(CoreError::HistoryParse)?;
        std::fs::write(path, content).map_err(|e| CoreError::HistoryIo {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(timestamp: &str, store_id: &str) -> EditRecord {
        EditRecord {
            timestamp: timestamp.to_string(),
            store_id: store_id.to_string(),
            store_name: "ABC Mart".to_string(),
            business_number: Value::Null,
            changes: EditChanges {
                employee_number: FieldChange {
                    before: json!(77),
                    after: json!(88),
                },
                salesperson: FieldChange {
                    before: json!("Park"),
                    after: json!("Choi"),
                },
            },
            reason: "담당자 변경".to_string(),
            note: String::new(),
            actor: "current_user".to_string(),
        }
    }

    #[test]
    fn append_is_newest_first() {
        let mut log = EditHistoryLog::new(10);
        log.append(record("2026-01-01T00:00:00.000Z", "BIZ_1"));
        log.append(record("2026-01-02T00:00:00.000Z", "BIZ_2"));

        assert_eq!(log.entries()[0].timestamp, "2026-01-02T00:00:00.000Z");
        assert_eq!(log.entries()[1].timestamp, "2026-01-01T00:00:00.000Z");
    }

    #[test]
    fn cap_evicts_exactly_the_oldest() {
        let mut log = EditHistoryLog::new(3);
        for day in 1..=4 {
            log.append(record(&format!("2026-01-0{day}T00:00:00.000Z"), "BIZ_1"));
        }

        assert_eq!(log.len(), 3);
        let timestamps: Vec<&str> = log.entries().iter().map(|r| r.timestamp.as_str()).collect();
        assert_eq!(
            timestamps,
            vec![
                "2026-01-04T00:00:00.000Z",
                "2026-01-03T00:00:00.000Z",
                "2026-01-02T00:00:00.000Z"
            ]
        );
    }

    #[test]
    fn list_filters_by_store_id() {
        let mut log = EditHistoryLog::new(10);
        log.append(record("2026-01-01T00:00:00.000Z", "BIZ_1"));
        log.append(record("2026-01-02T00:00:00.000Z", "BIZ_2"));
        log.append(record("2026-01-03T00:00:00.000Z", "BIZ_1"));

        let filtered = log.list(Some("BIZ_1"));
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.store_id == "BIZ_1"));
        assert_eq!(log.list(None).len(), 3);
    }

    #[test]
    fn legacy_store_code_field_deserializes() {
        let raw = json!({
            "timestamp": "2025-03-01T00:00:00.000Z",
            "storeCode": "STORE_12345",
            "storeName": "Old Mart",
            "changes": {
                "salesNumber": { "before": 1, "after": 2 },
                "salesperson": { "before": "A", "after": "B" }
            }
        });
        let parsed: EditRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.store_id, "STORE_12345");

        // And it re-serializes under the current name.
        let emitted = serde_json::to_value(&parsed).unwrap();
        assert_eq!(emitted["storeId"], json!("STORE_12345"));
    }

    #[test]
    fn export_starts_with_bom_and_quotes_fields() {
        let mut log = EditHistoryLog::new(10);
        let mut entry = record("2026-01-01T00:00:00.000Z", "BIZ_1");
        entry.note = "said \"urgent\", twice".to_string();
        log.append(entry);

        let bytes = log.export_csv().unwrap();
        assert_eq!(&bytes[..3], "\u{FEFF}".as_bytes());

        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"수정일시\""));
        // Embedded quotes are doubled, and the comma stays inside the field.
        assert!(text.contains("\"said \"\"urgent\"\", twice\""));
        assert!(text.contains("\"Park\""));
        assert!(text.contains("\"88\""));
    }

    #[test]
    fn load_missing_file_is_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = EditHistoryLog::load(&dir.path().join("nope.json"), 50).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edit_history.json");

        let mut log = EditHistoryLog::new(50);
        log.append(record("2026-01-01T00:00:00.000Z", "BIZ_1"));
        log.append(record("2026-01-02T00:00:00.000Z", "STORE_9"));
        log.save(&path).unwrap();

        let loaded = EditHistoryLog::load(&path, 50).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.entries()[0].store_id, "STORE_9");
        assert_eq!(loaded.entries()[1].changes.salesperson.after, json!("Choi"));
    }

    #[test]
    fn load_applies_cap_to_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edit_history.json");

        let mut log = EditHistoryLog::new(100);
        for day in 1..=5 {
            log.append(record(&format!("2026-01-0{day}T00:00:00.000Z"), "BIZ_1"));
        }
        log.save(&path).unwrap();

        let loaded = EditHistoryLog::load(&path, 2).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.entries()[0].timestamp, "2026-01-05T00:00:00.000Z");
    }
}
