//! HTTP fetcher implementation
//!
//! This module handles the network side of a visit:
//! - Building HTTP clients with proper user agent strings
//! - The `Fetcher` trait visit tasks retrieve bodies through
//! - A reqwest-backed fetcher that accepts only `200 OK`
//! - Error classification

use crate::config::UserAgentConfig;
use crate::url::Address;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Maximum redirect hops followed for one fetch
const MAX_REDIRECTS: usize = 10;

/// Why a single fetch failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connection refused, TLS, ...)
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    /// The server answered with anything other than `200 OK`
    #[error("unacceptable status {0}")]
    UnacceptableStatus(u16),

    #[error("failed to read body: {0}")]
    Body(String),

    /// The run was cancelled before the fetch completed
    #[error("fetch cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Retrieves the body of one address
///
/// One call is one attempt: implementations must not retry.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `address`, giving up with `FetchError::Cancelled` once
    /// `cancel` fires
    async fn fetch(&self, address: &Address, cancel: &CancellationToken)
        -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total time allowed for one request, body included
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sumi_crawl::config::UserAgentConfig;
/// use sumi_crawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from configuration
    pub fn from_config(config: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config, timeout)?))
    }

    async fn get(&self, address: &Address) -> Result<String, FetchError> {
        let response = self.client.get(address.as_url().clone()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::UnacceptableStatus(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        address: &Address,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        tracing::debug!("Fetching {}", address);

        tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = self.get(address) => result,
        }
    }
}
