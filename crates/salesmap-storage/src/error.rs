use thiserror::Error;

/// Errors returned by the storage gateway.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Neither the configured backend nor its fallback produced the dataset.
    #[error("failed to load dataset: {0}")]
    Load(String),

    /// The backend rejected the write (stale blob SHA, permissions, quota).
    /// Saves are not retried; the caller decides what to surface.
    #[error("failed to save dataset: {0}")]
    Save(String),

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Local file I/O failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
