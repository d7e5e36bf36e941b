// src/resolver/fetcher.rs

//! Transport for gateway fetches
//!
//! One GET per URL, body or failure reason. No retries at this layer.

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Per-endpoint timeout used by the reference deployment
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a single endpoint did not produce a body
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to read body: {0}")]
    Body(String),
}

/// Single-shot fetch of a URL
pub trait Fetcher: Send + Sync {
    /// Fetch the body at `url`; no retries
    fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError>;

    /// Human-readable name for logging
    fn name(&self) -> &str;
}

/// Blocking HTTP fetcher with a bounded per-request timeout
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        debug!("GET {} (timeout {:?})", url, self.timeout);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let bytes = response
            .bytes()
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "http"
    }
}
