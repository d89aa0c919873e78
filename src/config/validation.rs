use super::models::Config;
use reqwest::Url;
use reqwest::header::{HeaderName, HeaderValue};
use std::time::Duration;
use thiserror::Error;

/// Longest quiet period accepted for the search debounce
pub const MAX_DEBOUNCE: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("API key is empty (set api.api_key or SEARCHENGINE_API_KEY)")]
    MissingApiKey,

    #[error("Debounce must be between 1ms and {max:?}, got {actual:?}")]
    InvalidDebounce { actual: Duration, max: Duration },

    #[error("Timeout must be positive: {field}")]
    InvalidTimeout { field: String },

    #[error("Invalid shared header '{name}'")]
    InvalidHeader { name: String },

    #[error("API password is set but username is missing")]
    PasswordWithoutUsername,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_api(config)?;
    validate_headers(config)?;
    validate_search(config)?;
    Ok(())
}

fn validate_api(config: &Config) -> Result<(), ValidationError> {
    let url = Url::parse(&config.api.base_url).map_err(|e| ValidationError::InvalidBaseUrl {
        url: config.api.base_url.clone(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidBaseUrl {
            url: config.api.base_url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    if url.cannot_be_a_base() {
        return Err(ValidationError::InvalidBaseUrl {
            url: config.api.base_url.clone(),
            reason: "cannot be used as a base".to_string(),
        });
    }

    if config.api.api_key.trim().is_empty() {
        return Err(ValidationError::MissingApiKey);
    }

    for (field, value) in [
        ("api.connect_timeout", config.api.connect_timeout),
        ("api.request_timeout", config.api.request_timeout),
    ] {
        if value.as_duration().is_zero() {
            return Err(ValidationError::InvalidTimeout {
                field: field.to_string(),
            });
        }
    }

    if config.api.password.is_some() && config.api.username.is_none() {
        return Err(ValidationError::PasswordWithoutUsername);
    }

    Ok(())
}

fn validate_headers(config: &Config) -> Result<(), ValidationError> {
    for (name, value) in &config.api.headers {
        let valid = HeaderName::from_bytes(name.as_bytes()).is_ok()
            && HeaderValue::from_str(value).is_ok();
        if !valid {
            return Err(ValidationError::InvalidHeader { name: name.clone() });
        }
    }

    Ok(())
}

fn validate_search(config: &Config) -> Result<(), ValidationError> {
    let debounce = config.search.debounce.as_duration();
    if debounce.is_zero() || debounce > MAX_DEBOUNCE {
        return Err(ValidationError::InvalidDebounce {
            actual: debounce,
            max: MAX_DEBOUNCE,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::HumanDuration;

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.api.base_url = "https://metal.example.com/api".to_string();
        config.api.api_key = "test-key".to_string();
        config
    }

    #[test]
    fn test_valid_config() {
        let config = create_test_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_api_key() {
        let mut config = create_test_config();
        config.api.api_key = "  ".to_string();

        assert!(matches!(validate(&config), Err(ValidationError::MissingApiKey)));
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = create_test_config();
        config.api.base_url = "not a url".to_string();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidBaseUrl { .. })
        ));

        config.api.base_url = "ftp://metal.example.com".to_string();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_debounce_bounds() {
        let mut config = create_test_config();
        config.search.debounce = HumanDuration::from_millis(0);
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidDebounce { .. })
        ));

        config.search.debounce = HumanDuration::from_secs(61);
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidDebounce { .. })
        ));

        config.search.debounce = HumanDuration::from_secs(60);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = create_test_config();
        config.api.request_timeout = HumanDuration::from_millis(0);

        match validate(&config) {
            Err(ValidationError::InvalidTimeout { field }) => {
                assert_eq!(field, "api.request_timeout")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_header() {
        let mut config = create_test_config();
        config
            .api
            .headers
            .insert("bad header".to_string(), "value".to_string());

        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_password_without_username() {
        let mut config = create_test_config();
        config.api.password = Some("secret".to_string());
        assert!(matches!(
            validate(&config),
            Err(ValidationError::PasswordWithoutUsername)
        ));

        config.api.username = Some("user".to_string());
        assert!(validate(&config).is_ok());
    }
}
