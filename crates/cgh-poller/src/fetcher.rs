//! Backend data fetcher.
//!
//! A fetch is one POST of the connection descriptor to the backend's read
//! endpoint. The fetcher never retries; the polling session decides when the
//! next attempt happens.

use async_trait::async_trait;
use cgh_common::config::BackendConfig;
use cgh_common::descriptor::ConnectionDescriptor;
use cgh_common::error::{MonitorError, MonitorResult};
use cgh_common::snapshot::ReadingSnapshot;
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Source of reading snapshots.
#[async_trait]
pub trait DataFetcher: Send + Sync {
    /// Perform one request for the given descriptor.
    async fn fetch(&self, descriptor: &ConnectionDescriptor) -> MonitorResult<ReadingSnapshot>;
}

#[async_trait]
impl<F: DataFetcher + ?Sized> DataFetcher for Arc<F> {
    async fn fetch(&self, descriptor: &ConnectionDescriptor) -> MonitorResult<ReadingSnapshot> {
        (**self).fetch(descriptor).await
    }
}

/// Errors constructing an [`HttpFetcher`].
#[derive(Debug, Error)]
pub enum FetcherError {
    /// The endpoint is not a valid absolute URL.
    #[error("invalid backend url '{url}': {reason}")]
    InvalidUrl {
        /// The configured URL.
        url: String,
        /// Parser error.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Fetcher that POSTs the descriptor as JSON and decodes the JSON reply.
///
/// One pooled [`Client`] is reused across fetches.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher from the backend configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, FetcherError> {
        let endpoint = Url::parse(&config.url).map_err(|e| FetcherError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(FetcherError::InvalidUrl {
                url: config.url.clone(),
                reason: format!("unsupported scheme '{}'", endpoint.scheme()),
            });
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            timeout: config.timeout,
        })
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl DataFetcher for HttpFetcher {
    async fn fetch(&self, descriptor: &ConnectionDescriptor) -> MonitorResult<ReadingSnapshot> {
        trace!(
            endpoint = %self.endpoint,
            table = %descriptor.table,
            registers = descriptor.readings.len(),
            "Sending read request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(descriptor)
            .send()
            .await
            .map_err(|e| network_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Backend rejected read request");
            return Err(MonitorError::Protocol {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| network_error(&e))?;
        let snapshot = ReadingSnapshot::from_json(&body)?;
        debug!(readings = snapshot.len(), "Read request completed");
        Ok(snapshot)
    }
}

fn network_error(e: &reqwest::Error) -> MonitorError {
    let reason = if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    };
    MonitorError::Network { reason }
}
