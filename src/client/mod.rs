//! Request executor
//!
//! Resolves [`EndpointDescriptor`]s against the shared [`RequestContext`] and
//! performs the HTTP call. Every call is tracked by the in-flight activity
//! tracker from before the request is sent until the body has been read or
//! the call failed.

pub mod context;
pub mod http;

pub use context::{Credentials, RequestContext};
pub use http::{ApiClient, HttpConfig};

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::endpoint::EndpointDescriptor;

/// Errors building the client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Build(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Network-level failures: no usable HTTP response was received
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Too many redirects")]
    TooManyRedirects,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("Failed to read body: {0}")]
    Body(String),
}

/// Undecoded HTTP response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
    pub url: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
            url: String::new(),
        }
    }
}

/// Executes a described call. Implemented by [`ApiClient`]; tests swap in fakes.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(
        &self,
        descriptor: &EndpointDescriptor,
    ) -> std::result::Result<RawResponse, TransportError>;
}

/// Run `descriptor` in the background and hand the outcome to `on_complete`.
///
/// The callback runs exactly once, on a runtime worker thread, unless the
/// returned handle is aborted first.
pub fn dispatch<F>(
    executor: Arc<dyn Executor>,
    descriptor: EndpointDescriptor,
    on_complete: F,
) -> JoinHandle<()>
where
    F: FnOnce(std::result::Result<RawResponse, TransportError>) + Send + 'static,
{
    tokio::spawn(async move {
        let result = executor.execute(&descriptor).await;
        on_complete(result);
    })
}
