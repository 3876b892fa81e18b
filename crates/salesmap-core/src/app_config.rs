use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Where the canonical dataset lives: a GitHub-style contents API (token
/// configured) or only the local file.
#[derive(Clone, PartialEq, Eq)]
pub struct GithubConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub data_path: String,
    pub api_base: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub data_path: PathBuf,
    pub roster_path: PathBuf,
    pub history_path: PathBuf,
    pub history_cap: usize,
    pub request_timeout_secs: u64,
    pub github: Option<GithubConfig>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("data_path", &self.data_path)
            .field("roster_path", &self.roster_path)
            .field("history_path", &self.history_path)
            .field("history_cap", &self.history_cap)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("github", &self.github.as_ref().map(|_| "[configured]"))
            .finish()
    }
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("token", &"[redacted]")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("data_path", &self.data_path)
            .field("api_base", &self.api_base)
            .finish()
    }
}
