use reqwest::Url;
use std::fmt;

use super::{ClientError, Result};
use crate::config::ApiConfig;
use crate::endpoint::{EndpointDescriptor, HeadersMap, Operation};

/// HTTP Basic credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Shared settings for every request, built once at startup
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub base_url: Url,
    pub api_key: String,
    pub shared_headers: HeadersMap,
    pub credentials: Option<Credentials>,
}

impl RequestContext {
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            shared_headers: HeadersMap::new(),
            credentials: None,
        }
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&api.base_url)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{}: {}", api.base_url, e)))?;

        let credentials = api.username.as_ref().map(|username| Credentials {
            username: username.clone(),
            password: api.password.clone(),
        });

        Ok(Self {
            base_url,
            api_key: api.api_key.clone(),
            shared_headers: api.headers.clone(),
            credentials,
        })
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.shared_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password,
        });
        self
    }

    /// Descriptor for `operation` carrying this context's API key
    pub fn describe(&self, operation: &Operation) -> EndpointDescriptor {
        operation.describe(&self.api_key)
    }

    /// Shared headers overlaid with the descriptor's own
    pub fn merged_headers(&self, descriptor: &EndpointDescriptor) -> HeadersMap {
        let mut headers = self.shared_headers.clone();
        headers.extend(descriptor.headers.clone());
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut api = ApiConfig::default();
        api.base_url = "https://metal.example.com/api".to_string();
        api.api_key = "key".to_string();
        api.headers.insert("x-client".to_string(), "cli".to_string());

        let context = RequestContext::from_config(&api).unwrap();
        assert_eq!(context.base_url.as_str(), "https://metal.example.com/api");
        assert_eq!(context.api_key, "key");
        assert!(context.credentials.is_none());
        assert_eq!(context.shared_headers.len(), 1);
    }

    #[test]
    fn test_credentials_only_with_username() {
        let mut api = ApiConfig::default();
        api.api_key = "key".to_string();
        api.username = Some("user".to_string());
        api.password = Some("pass".to_string());

        let context = RequestContext::from_config(&api).unwrap();
        let credentials = context.credentials.unwrap();
        assert_eq!(credentials.username, "user");
        assert_eq!(credentials.password.as_deref(), Some("pass"));
        assert!(!format!("{:?}", credentials).contains("pass\""));
    }

    #[test]
    fn test_invalid_base_url() {
        let mut api = ApiConfig::default();
        api.base_url = "::nope".to_string();

        assert!(matches!(
            RequestContext::from_config(&api),
            Err(ClientError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_descriptor_headers_override_shared() {
        let context = RequestContext::new(Url::parse("http://localhost/api").unwrap(), "k")
            .with_header("x-client", "cli")
            .with_header("accept", "application/json");

        let descriptor = context
            .describe(&Operation::Band { band_id: 1 })
            .with_header("x-client", "detail-view");

        let headers = context.merged_headers(&descriptor);
        assert_eq!(headers.get("x-client").map(String::as_str), Some("detail-view"));
        assert_eq!(headers.get("accept").map(String::as_str), Some("application/json"));
        assert_eq!(descriptor.query[0].1, "k");
    }
}
