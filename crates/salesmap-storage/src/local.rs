//! Local JSON-file backend for the store dataset.

use std::path::{Path, PathBuf};

use salesmap_core::JoinedRecord;

use crate::error::StorageError;

/// Reads and writes the dataset as a flat JSON array on disk.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the dataset file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when the file cannot be read and
    /// [`StorageError::Deserialize`] when it is not a JSON array of records.
    pub async fn load(&self) -> Result<Vec<JoinedRecord>, StorageError> {
        let content =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|e| StorageError::Io {
                    path: self.path.display().to_string(),
                    source: e,
                })?;

        let records: Vec<JoinedRecord> =
            serde_json::from_str(&content).map_err(|e| StorageError::Deserialize {
                context: self.path.display().to_string(),
                source: e,
            })?;

        tracing::info!(records = records.len(), path = %self.path.display(), "loaded dataset from file");
        Ok(records)
    }

    /// Write the dataset back, pretty-printed with 2-space indentation —
    /// the same layout the file has always been committed with, so diffs
    /// against earlier versions stay minimal.
    ///
    /// Returns the written path as the backend identifier. The commit
    /// message only matters to the versioned backend and is ignored here.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] on write failure.
    pub async fn save(
        &self,
        records: &[JoinedRecord],
        _message: &str,
    ) -> Result<String, StorageError> {
        let content =
            serde_json::to_string_pretty(records).map_err(|e| StorageError::Deserialize {
                context: self.path.display().to_string(),
                source: e,
            })?;

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| StorageError::Io {
                path: self.path.display().to_string(),
                source: e,
            })?;

        tracing::info!(records = records.len(), path = %self.path.display(), "saved dataset to file");
        Ok(self.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_records() -> Vec<JoinedRecord> {
        serde_json::from_value(json!([
            {
                "거래처명": "ABC Mart",
                "사업자번호": "123-45-67890",
                "기본주소(사업자기준)": "1 Main St",
                "위도": 37.5,
                "경도": 127.0,
                "담당 사번": 77,
                "담당 영업사원": "Park",
                "salesInfo": {
                    "담당 사번": 77,
                    "담당 영업사원": "Park",
                    "지사": "North",
                    "지점": "Station",
                    "ADM_CD": "01101053"
                }
            },
            {
                "거래처명": "Bare Mart",
                "담당 사번": "",
                "salesInfo": null
            }
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn save_then_load_round_trips_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("output_address.json"));

        let records = sample_records();
        let before = serde_json::to_value(&records).unwrap();

        store.save(&records, "test").await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded.len(), records.len());
        assert_eq!(serde_json::to_value(&loaded).unwrap(), before);
    }

    #[tokio::test]
    async fn save_writes_two_space_indented_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("output_address.json"));

        store.save(&sample_records(), "test").await.unwrap();
        let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert!(raw.starts_with("[\n  {"));
    }

    #[tokio::test]
    async fn load_missing_file_is_io_error() {
        let store = LocalStore::new("/nonexistent/output_address.json");
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }

    #[tokio::test]
    async fn load_malformed_json_is_deserialize_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output_address.json");
        tokio::fs::write(&path, "{ not an array").await.unwrap();

        let err = LocalStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, StorageError::Deserialize { .. }));
    }
}
