//! Configuration loader for Parley.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` in production)
//! and deserializes it into [`AppConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed, then applies `PARLEY_*`
//! environment overrides. A `.env` file in the working directory is loaded
//! first so local development can keep the API key out of the shell.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use parley_types::config::AppConfig;

use crate::sqlite::pool::default_database_url;

/// Environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Load `.env` from the working directory, if present.
///
/// Variables already set in the process environment win over the file.
/// Runs before the tracing subscriber exists (so `RUST_LOG` may come from
/// `.env`), hence the outcome is returned for the caller to log.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    dotenv_outcome(dotenvy::dotenv())
}

/// Load a specific env file. A missing file is `Ok(None)`.
pub fn load_dotenv_file(path: &Path) -> Result<Option<PathBuf>, dotenvy::Error> {
    dotenv_outcome(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

fn dotenv_outcome(
    result: Result<PathBuf, dotenvy::Error>,
) -> Result<Option<PathBuf>, dotenvy::Error> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(err) if err.not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `PARLEY_DATA_DIR` environment variable
/// 2. `~/.parley`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PARLEY_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".parley");
    }

    // Last resort: current directory
    PathBuf::from(".parley")
}

/// Load configuration from `{data_dir}/config.toml` with env overrides applied.
///
/// - If the file does not exist, starts from [`AppConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and starts from the default.
/// - `database_url` is always filled in, defaulting to `{data_dir}/parley.db`.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    load_config_with(data_dir, |key| std::env::var(key).ok()).await
}

async fn load_config_with(data_dir: &Path, lookup: impl Fn(&str) -> Option<String>) -> AppConfig {
    let mut config = read_config_file(data_dir).await;
    apply_env_overrides(&mut config, lookup);

    if config.database_url.is_none() {
        config.database_url = Some(default_database_url(data_dir));
    }

    config
}

async fn read_config_file(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

/// Apply `PARLEY_*` overrides from `lookup` on top of `config`.
///
/// Empty values are ignored.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("PARLEY_DATABASE_URL") {
        config.database_url = Some(url);
    }
    if let Some(model) = get("PARLEY_GEMINI_MODEL") {
        config.gemini.model = model;
    }
    if let Some(base_url) = get("PARLEY_GEMINI_BASE_URL") {
        config.gemini.base_url = base_url;
    }
}

/// Read the Gemini API key from the environment.
///
/// Returns `None` when the variable is unset or blank.
pub fn gemini_api_key() -> Option<SecretString> {
    std::env::var(GEMINI_API_KEY_VAR)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
}
