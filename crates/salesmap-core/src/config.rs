use crate::app_config::{AppConfig, Environment, GithubConfig};
use crate::error::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("SALESMAP_ENV", "development"));

    let bind_addr = parse_addr("SALESMAP_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("SALESMAP_LOG_LEVEL", "info");
    let data_path = PathBuf::from(or_default(
        "SALESMAP_DATA_PATH",
        "./data/output_address.json",
    ));
    let roster_path = PathBuf::from(or_default(
        "SALESMAP_ROSTER_PATH",
        "./data/salesperson_data.json",
    ));
    let history_path = PathBuf::from(or_default(
        "SALESMAP_HISTORY_PATH",
        "./data/edit_history.json",
    ));

    let history_cap = parse_usize("SALESMAP_HISTORY_CAP", "1000")?;
    if history_cap == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SALESMAP_HISTORY_CAP".to_string(),
            reason: "cap must be at least 1".to_string(),
        });
    }

    let request_timeout_secs = parse_u64("SALESMAP_REQUEST_TIMEOUT_SECS", "30")?;

    // The GitHub backend is active exactly when a token is configured,
    // matching the original deployment's env check. Owner and repo have no
    // sensible defaults, so they become required alongside the token.
    let github = match lookup("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()) {
        Some(token) => Some(GithubConfig {
            token,
            owner: require("GITHUB_OWNER")?,
            repo: require("GITHUB_REPO")?,
            data_path: or_default("SALESMAP_GITHUB_DATA_PATH", "data/output_address.json"),
            api_base: or_default("SALESMAP_GITHUB_API_BASE", "https://api.github.com"),
        }),
        None => None,
    };

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        data_path,
        roster_path,
        history_path,
        history_cap,
        request_timeout_secs,
        github,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
