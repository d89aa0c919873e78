use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "SEARCHENGINE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/searchengine.toml";
const ENV_PREFIX: &str = "SEARCHENGINE";
const ENV_SEPARATOR: &str = "__";

const API_KEY_ENV_VAR: &str = "SEARCHENGINE_API_KEY";
const API_USERNAME_ENV_VAR: &str = "SEARCHENGINE_API_USERNAME";
const API_PASSWORD_ENV_VAR: &str = "SEARCHENGINE_API_PASSWORD";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    load_with_secrets(config_path)
}

/// Same as [`load`] but with an explicit file path (CLI `--config`)
pub fn load_with_secrets(config_path: PathBuf) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let mut config = load_from_sources(config_path)?;
    load_secrets(&mut config);

    Ok(config)
}

/// Load secrets from environment variables into config
/// Secrets are never stored in TOML files, only in environment
fn load_secrets(config: &mut Config) {
    if let Ok(api_key) = env::var(API_KEY_ENV_VAR) {
        config.api.api_key = api_key;
    }
    if let Ok(username) = env::var(API_USERNAME_ENV_VAR) {
        config.api.username = Some(username);
    }
    if let Ok(password) = env::var(API_PASSWORD_ENV_VAR) {
        config.api.password = Some(password);
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // SEARCHENGINE__API__BASE_URL -> api.base_url
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
