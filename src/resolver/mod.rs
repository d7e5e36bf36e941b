// src/resolver/mod.rs

//! Content resolution over ordered gateways with local fallback
//!
//! Placeholder identifiers never touch the network: they are looked up on
//! disk only. Content addresses are tried against each gateway in order,
//! one attempt each; the first success wins and later gateways are never
//! contacted. When every gateway fails, an existing local fallback file is
//! returned instead of an error.

mod endpoint;
mod fetcher;
mod local;

pub use endpoint::{EndpointList, EndpointTemplate, ID_PLACEHOLDER, REFERENCE_GATEWAYS};
pub use fetcher::{DEFAULT_FETCH_TIMEOUT, FetchError, Fetcher, HttpFetcher};
pub use local::{CONVENTIONAL_NAMES, LocalSearch};

use crate::container::has_wasm_magic;
use crate::identifier::classify;
use crate::persist::write_atomic;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// File a fetched container is cached to
pub const DEFAULT_CACHE_FILE: &str = "downloaded_contract.wasm";

/// What a successful resolution produced
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    /// Body carried the WebAssembly marker
    Package(Vec<u8>),
    /// Body parsed as JSON
    Structured(serde_json::Value),
    /// Anything else, decoded lossily
    Text(String),
    /// A file on disk
    LocalPath(PathBuf),
}

impl ResolutionOutcome {
    /// Sniff a fetched body
    pub fn from_body(body: Vec<u8>) -> Self {
        if has_wasm_magic(&body) {
            return Self::Package(body);
        }
        match serde_json::from_slice(&body) {
            Ok(value) => Self::Structured(value),
            Err(_) => Self::Text(String::from_utf8_lossy(&body).into_owned()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Package(_) => "package",
            Self::Structured(_) => "structured",
            Self::Text(_) => "text",
            Self::LocalPath(_) => "local path",
        }
    }
}

/// One gateway that did not deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointFailure {
    pub endpoint: String,
    pub reason: FetchError,
}

impl fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.reason)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("{reason}")]
    NotFound {
        reason: String,
        searched: Vec<PathBuf>,
    },

    #[error("All {} endpoints failed", .attempts.len())]
    AllEndpointsFailed { attempts: Vec<EndpointFailure> },
}

/// Inputs of a single resolution
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub identifier: &'a str,
    /// Explicit local file; also the fallback when every gateway fails
    pub local_fallback: Option<&'a Path>,
    /// File name the caller expects the content under
    pub expected_file: Option<&'a Path>,
}

impl<'a> ResolveRequest<'a> {
    pub fn new(identifier: &'a str) -> Self {
        Self {
            identifier,
            local_fallback: None,
            expected_file: None,
        }
    }

    pub fn with_fallback(mut self, path: Option<&'a Path>) -> Self {
        self.local_fallback = path;
        self
    }

    pub fn with_expected(mut self, path: Option<&'a Path>) -> Self {
        self.expected_file = path;
        self
    }
}

/// Resolves identifiers to content
pub struct ContentResolver {
    fetcher: Box<dyn Fetcher>,
    search: LocalSearch,
    cache_path: Option<PathBuf>,
}

impl ContentResolver {
    /// Resolver with the default local search and no cache
    pub fn new(fetcher: Box<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            search: LocalSearch::default(),
            cache_path: None,
        }
    }

    pub fn with_search(mut self, search: LocalSearch) -> Self {
        self.search = search;
        self
    }

    /// Persist fetched packages to `path`
    pub fn with_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    /// Cache file, if it currently holds exactly `bytes`
    pub fn cached(&self, bytes: &[u8]) -> Option<&Path> {
        let path = self.cache_path.as_deref()?;
        match std::fs::read(path) {
            Ok(stored) if stored == bytes => Some(path),
            _ => None,
        }
    }

    pub fn resolve(
        &self,
        identifier: &str,
        local_fallback: Option<&Path>,
        endpoints: &EndpointList,
    ) -> Result<ResolutionOutcome, ResolutionError> {
        self.resolve_request(
            &ResolveRequest::new(identifier).with_fallback(local_fallback),
            endpoints,
        )
    }

    pub fn resolve_request(
        &self,
        request: &ResolveRequest<'_>,
        endpoints: &EndpointList,
    ) -> Result<ResolutionOutcome, ResolutionError> {
        let class = classify(request.identifier);
        debug!("Identifier {} is {}", request.identifier, class);

        if !class.is_addressable() {
            return self.resolve_local(request);
        }

        let mut attempts = Vec::with_capacity(endpoints.len());
        for (i, template) in endpoints.iter().enumerate() {
            let url = template.expand(request.identifier);
            info!(
                "Fetching {} from endpoint {}/{} via {}",
                request.identifier,
                i + 1,
                endpoints.len(),
                self.fetcher.name()
            );

            match self.fetcher.fetch(&url) {
                Ok(body) => {
                    let outcome = ResolutionOutcome::from_body(body);
                    info!("Resolved {} as {} from {}", request.identifier, outcome.kind(), url);
                    if let ResolutionOutcome::Package(bytes) = &outcome {
                        self.write_cache(bytes);
                    }
                    return Ok(outcome);
                }
                Err(reason) => {
                    warn!("Endpoint {} failed: {}", url, reason);
                    attempts.push(EndpointFailure {
                        endpoint: url,
                        reason,
                    });
                }
            }
        }

        if let Some(fallback) = request.local_fallback {
            if fallback.is_file() {
                info!(
                    "All endpoints failed; using local fallback {}",
                    fallback.display()
                );
                return Ok(ResolutionOutcome::LocalPath(fallback.to_path_buf()));
            }
            debug!("Local fallback {} does not exist", fallback.display());
        }

        Err(ResolutionError::AllEndpointsFailed { attempts })
    }

    fn resolve_local(
        &self,
        request: &ResolveRequest<'_>,
    ) -> Result<ResolutionOutcome, ResolutionError> {
        let (found, searched) = self
            .search
            .find(request.local_fallback, request.expected_file);

        match found {
            Some(path) => {
                info!("Using local file {} for {}", path.display(), request.identifier);
                Ok(ResolutionOutcome::LocalPath(path))
            }
            None => Err(ResolutionError::NotFound {
                reason: "no local file for non-addressable identifier".to_string(),
                searched,
            }),
        }
    }

    fn write_cache(&self, bytes: &[u8]) {
        let Some(path) = &self.cache_path else {
            return;
        };
        match write_atomic(path, bytes) {
            Ok(()) => debug!("Cached {} bytes to {}", bytes.len(), path.display()),
            Err(e) => warn!("Failed to cache package to {}: {}", path.display(), e),
        }
    }
}
