//! The transport collaborator used to reach enterprise nodes.
use async_trait::async_trait;
use std::time::Duration;
use tracing::trace;

use super::retry::RetryPolicy;
use crate::error::TransportError;

/// Fetches the raw body at `url`.
///
/// Implementations treat non-success HTTP statuses as errors. Any retrying is
/// the implementation's own business; callers never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// `reqwest` backed transport with an optional retry schedule.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpTransport {
    /// Creates a transport whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self { client, retry })
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        trace!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.retry.retry_with_jitter(move || self.fetch_once(url)).await
    }
}
