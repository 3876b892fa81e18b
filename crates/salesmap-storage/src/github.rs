//! GitHub contents-API backend for the store dataset.
//!
//! The dataset lives as one JSON file in a repository; reads go through
//! `GET /repos/{owner}/{repo}/contents/{path}` and writes through a `PUT`
//! on the same URL carrying the current blob SHA. The SHA is re-fetched
//! immediately before every write, and a rejected write (stale SHA,
//! permissions) surfaces as [`StorageError::Save`] — there is no retry.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{header, Client, StatusCode, Url};
use salesmap_core::app_config::GithubConfig;
use salesmap_core::JoinedRecord;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Path characters the contents API requires encoded; `/` stays literal so
/// nested data paths keep their segments.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Client for the GitHub contents API, scoped to one data file.
///
/// Use [`GithubClient::new`] for production or [`GithubClient::with_base_url`]
/// to point at a mock server in tests.
pub struct GithubClient {
    client: Client,
    token: String,
    owner: String,
    repo: String,
    data_path: String,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    commit: CommitInfo,
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    sha: String,
}

impl GithubClient {
    /// Creates a client pointed at the API base configured in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`StorageError::Load`] if the base URL is
    /// invalid.
    pub fn new(config: &GithubConfig, timeout_secs: u64) -> Result<Self, StorageError> {
        Self::with_base_url(config, timeout_secs, &config.api_base)
    }

    /// Creates a client with an explicit base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`GithubClient::new`].
    pub fn with_base_url(
        config: &GithubConfig,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("salesmap/0.1 (territory-lookup)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| StorageError::Load(format!("invalid API base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            token: config.token.clone(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            data_path: config.data_path.clone(),
            base_url,
        })
    }

    /// Fetch and decode the dataset file.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Http`] on network failure.
    /// - [`StorageError::Load`] when the API answers with an error status,
    ///   the path is not a file, or the base64 body does not decode.
    /// - [`StorageError::Deserialize`] when the decoded body is not a JSON
    ///   array of records.
    pub async fn load(&self) -> Result<Vec<JoinedRecord>, StorageError> {
        let contents = self.fetch_contents().await?;
        let decoded = decode_base64_content(&contents.content)?;

        let records: Vec<JoinedRecord> =
            serde_json::from_slice(&decoded).map_err(|e| StorageError::Deserialize {
                context: format!("{}/{}/{}", self.owner, self.repo, self.data_path),
                source: e,
            })?;

        tracing::info!(
            records = records.len(),
            repo = format!("{}/{}", self.owner, self.repo),
            "loaded dataset from GitHub"
        );
        Ok(records)
    }

    /// Write the dataset back as a new commit and return its SHA.
    ///
    /// The current blob SHA is re-fetched first; if another writer committed
    /// in between, the PUT is rejected by the API and surfaces as
    /// [`StorageError::Save`]. Last write wins — the caller does not retry.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Http`] on network failure.
    /// - [`StorageError::Load`] when the pre-write SHA fetch fails.
    /// - [`StorageError::Save`] when the API rejects the write.
    pub async fn save(
        &self,
        records: &[JoinedRecord],
        message: &str,
    ) -> Result<String, StorageError> {
        let current = self.fetch_contents().await?;

        let body = serde_json::to_string_pretty(records).map_err(|e| {
            StorageError::Deserialize {
                context: self.data_path.clone(),
                source: e,
            }
        })?;

        let request = UpdateRequest {
            message,
            content: BASE64.encode(body.as_bytes()),
            sha: current.sha,
        };

        let response = self
            .client
            .put(self.contents_url())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::ACCEPT, "application/vnd.github+json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Save(self.api_error(status, response).await));
        }

        let update: UpdateResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Save(format!("unexpected commit response: {e}")))?;

        tracing::info!(
            commit = %update.commit.sha,
            records = records.len(),
            "saved dataset to GitHub"
        );
        Ok(update.commit.sha)
    }

    async fn fetch_contents(&self) -> Result<ContentsResponse, StorageError> {
        let response = self
            .client
            .get(self.contents_url())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Load(self.api_error(status, response).await));
        }

        let contents: ContentsResponse =
            response
                .json()
                .await
                .map_err(|e| StorageError::Load(format!("unexpected contents response: {e}")))?;

        if contents.kind != "file" {
            return Err(StorageError::Load(format!(
                "{} is not a file (type: {})",
                self.data_path, contents.kind
            )));
        }

        Ok(contents)
    }

    /// Extract the API's `message` field for the error, falling back to the
    /// raw status.
    async fn api_error(&self, status: StatusCode, response: reqwest::Response) -> String {
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("message")
                    .and_then(serde_json::Value::as_str)
                    .map(ToOwned::to_owned)
            })
            .unwrap_or_else(|| "no message".to_string());
        format!(
            "GitHub API {status} for {}/{}/{}: {message}",
            self.owner, self.repo, self.data_path
        )
    }

    fn contents_url(&self) -> Url {
        let path = format!(
            "repos/{}/{}/contents/{}",
            utf8_percent_encode(&self.owner, PATH),
            utf8_percent_encode(&self.repo, PATH),
            utf8_percent_encode(&self.data_path, PATH)
        );
        // The base URL is normalised to end in a slash, so join cannot fail
        // for a relative path built from encoded segments.
        self.base_url.join(&path).unwrap_or_else(|_| self.base_url.clone())
    }
}

/// The contents API wraps base64 bodies at 60 columns; strip all whitespace
/// before decoding.
fn decode_base64_content(content: &str) -> Result<Vec<u8>, StorageError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(compact.as_bytes())
        .map_err(|e| StorageError::Load(format!("base64 decode failed: {e}")))
}
