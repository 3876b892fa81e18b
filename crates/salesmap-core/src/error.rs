use thiserror::Error;

/// Errors returned by the core join/filter/edit operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The edit input was rejected before any mutation occurred.
    #[error("validation error: {0}")]
    Validation(String),

    /// The target store id has no match in the current working set.
    #[error("store not found: {0}")]
    NotFound(String),

    /// Reading or writing the edit-history file failed.
    #[error("history I/O error for {path}: {source}")]
    HistoryIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The edit-history file could not be parsed.
    #[error("history parse error: {0}")]
    HistoryParse(#[from] serde_json::Error),

    /// Serializing the edit history to CSV failed.
    #[error("history export error: {0}")]
    HistoryExport(#[from] csv::Error),
}

/// Errors returned while loading or validating configuration and roster files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read roster file {path}: {source}")]
    RosterFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse roster file: {0}")]
    RosterFileParse(#[from] serde_json::Error),

    #[error("roster validation failed: {0}")]
    Validation(String),
}
