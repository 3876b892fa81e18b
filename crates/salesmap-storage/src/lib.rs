//! Storage gateway for the canonical store dataset.
//!
//! Two backends implement the same load/save contract: a local JSON file and
//! a GitHub-style versioned contents API. Which one is active follows the
//! configuration — a configured token selects GitHub, with the local file as
//! a read fallback so the tool keeps working when the remote is unreachable.
//! Writes never fall back: a failed remote save is reported, not silently
//! redirected.

pub mod error;
pub mod github;
pub mod local;

use salesmap_core::{AppConfig, JoinedRecord};

pub use error::StorageError;
pub use github::GithubClient;
pub use local::LocalStore;

/// The configured dataset backend.
pub enum Storage {
    Local(LocalStore),
    Github {
        client: GithubClient,
        fallback: LocalStore,
    },
}

impl Storage {
    /// Select the backend from configuration: GitHub when a token is
    /// configured, else the local file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Http`] if the GitHub HTTP client cannot be
    /// constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, StorageError> {
        match &config.github {
            Some(github) => {
                let client = GithubClient::new(github, config.request_timeout_secs)?;
                tracing::info!(
                    repo = format!("{}/{}", github.owner, github.repo),
                    "using GitHub storage with local fallback"
                );
                Ok(Self::Github {
                    client,
                    fallback: LocalStore::new(&config.data_path),
                })
            }
            None => {
                tracing::info!(path = %config.data_path.display(), "using local file storage");
                Ok(Self::Local(LocalStore::new(&config.data_path)))
            }
        }
    }

    /// Which backend is active; surfaced by the health endpoint.
    #[must_use]
    pub fn backend_kind(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Github { .. } => "github",
        }
    }

    /// Load the dataset. The GitHub backend falls back to the local file
    /// when the remote read fails; [`StorageError::Load`] is returned only
    /// when every source fails.
    ///
    /// # Errors
    ///
    /// See above; the local backend propagates its read errors directly.
    pub async fn load(&self) -> Result<Vec<JoinedRecord>, StorageError> {
        match self {
            Self::Local(store) => store.load().await,
            Self::Github { client, fallback } => match client.load().await {
                Ok(records) => Ok(records),
                Err(remote_err) => {
                    tracing::warn!(
                        error = %remote_err,
                        "GitHub load failed, falling back to local file"
                    );
                    fallback.load().await.map_err(|local_err| {
                        StorageError::Load(format!(
                            "remote: {remote_err}; local fallback: {local_err}"
                        ))
                    })
                }
            },
        }
    }

    /// Persist the dataset to the active backend and return its identifier
    /// (commit SHA for GitHub, file path for local). No retry, no fallback.
    ///
    /// # Errors
    ///
    /// Propagates the backend's save error.
    pub async fn save(
        &self,
        records: &[JoinedRecord],
        message: &str,
    ) -> Result<String, StorageError> {
        match self {
            Self::Local(store) => store.save(records, message).await,
            Self::Github { client, .. } => client.save(records, message).await,
        }
    }
}
