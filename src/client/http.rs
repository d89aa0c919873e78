//! reqwest-backed request executor

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::context::RequestContext;
use super::{ClientError, Executor, RawResponse, Result, TransportError};
use crate::activity::ActivityTracker;
use crate::config::Config;
use crate::endpoint::EndpointDescriptor;
use crate::observability::Metrics;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Pretty-print JSON response bodies at debug level
    pub log_bodies: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: "SearchEngine/0.1.0".to_string(),
            log_bodies: false,
        }
    }
}

impl HttpConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            connect_timeout: config.api.connect_timeout.as_duration(),
            request_timeout: config.api.request_timeout.as_duration(),
            user_agent: config.api.user_agent.clone(),
            log_bodies: config.telemetry.log_bodies,
        }
    }
}

/// API client executing endpoint descriptors against the configured backend
pub struct ApiClient {
    client: Client,
    config: HttpConfig,
    context: Arc<RequestContext>,
    activity: Arc<ActivityTracker>,
    metrics: Arc<Metrics>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(
        config: HttpConfig,
        context: Arc<RequestContext>,
        activity: Arc<ActivityTracker>,
        metrics: Arc<Metrics>,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            client,
            config,
            context,
            activity,
            metrics,
        })
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    fn log_body(&self, descriptor: &EndpointDescriptor, body: &[u8]) {
        if !self.config.log_bodies {
            return;
        }

        match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(json) => {
                let pretty = serde_json::to_string_pretty(&json).unwrap_or_default();
                debug!(operation = descriptor.kind().as_str(), "Response body:\n{}", pretty);
            }
            Err(_) => {
                debug!(
                    operation = descriptor.kind().as_str(),
                    size = body.len(),
                    "Response body is not JSON"
                );
            }
        }
    }
}

#[async_trait]
impl Executor for ApiClient {
    /// Execute once (no retry). HTTP error statuses are returned as responses.
    async fn execute(
        &self,
        descriptor: &EndpointDescriptor,
    ) -> std::result::Result<RawResponse, TransportError> {
        let path = descriptor.redacted_path();
        let url = descriptor.url(&self.context.base_url).map_err(|e| {
            warn!(path = %path, error = %e, "Request not sent");
            TransportError::InvalidRequest(e.to_string())
        })?;

        // released on every exit path below, and if this future is dropped
        let _activity = self.activity.begin();
        self.metrics.request_started();

        debug!(
            operation = descriptor.kind().as_str(),
            method = %descriptor.method,
            path = %path,
            "Sending request"
        );

        let mut request = self.client.request(descriptor.method.clone(), url.clone());

        for (name, value) in self.context.merged_headers(descriptor) {
            request = request.header(name, value);
        }

        if let Some(credentials) = &self.context.credentials {
            request = request.basic_auth(&credentials.username, credentials.password.as_ref());
        }

        let response = request.send().await.map_err(|e| {
            self.metrics.request_failed();
            let error = if e.is_timeout() {
                TransportError::Timeout
            } else if e.is_redirect() {
                TransportError::TooManyRedirects
            } else if e.is_connect() {
                TransportError::Connect(e.to_string())
            } else if e.is_builder() {
                TransportError::InvalidRequest(e.to_string())
            } else {
                TransportError::Request(e.to_string())
            };
            warn!(path = %path, error = %error, "Request failed");
            error
        })?;

        let status = response.status();

        let body = response.bytes().await.map_err(|e| {
            self.metrics.request_failed();
            warn!(path = %path, status = status.as_u16(), error = %e, "Failed to read body");
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Body(e.to_string())
            }
        })?;

        debug!(
            path = %path,
            status = status.as_u16(),
            size = body.len(),
            "Response received"
        );
        self.log_body(descriptor, &body);

        Ok(RawResponse {
            status: status.as_u16(),
            body,
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::HumanDuration;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.user_agent, "SearchEngine/0.1.0");
        assert!(!config.log_bodies);
    }

    #[test]
    fn test_http_config_from_config() {
        let mut config = Config::default();
        config.api.request_timeout = HumanDuration::from_secs(3);
        config.api.user_agent = "custom/1.0".to_string();
        config.telemetry.log_bodies = true;

        let http = HttpConfig::from_config(&config);
        assert_eq!(http.request_timeout, Duration::from_secs(3));
        assert_eq!(http.connect_timeout, Duration::from_secs(10));
        assert_eq!(http.user_agent, "custom/1.0");
        assert!(http.log_bodies);
    }
}
