// src/deployment.rs
//! Deployment record written by the deploy tooling
//!
//! Only the parts needed to locate the package are interpreted: the content
//! identifier and the local container file it was built from.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Record file name
pub const DEPLOYMENT_FILE: &str = "deployment.json";

/// `deployment_type` of records backed by a published container
pub const WASM_IPFS: &str = "wasm-ipfs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    #[serde(default)]
    pub contract_address: String,

    #[serde(default)]
    pub abi: serde_json::Value,

    #[serde(default)]
    pub ipfs_hash: Option<String>,

    #[serde(default)]
    pub wasm_file: Option<PathBuf>,

    #[serde(default)]
    pub network: Option<String>,

    #[serde(default)]
    pub rpc_url: Option<String>,

    #[serde(default)]
    pub deployment_type: Option<String>,
}

impl DeploymentRecord {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::ParseError(format!("Invalid deployment record {}: {}", path.display(), e))
        })
    }

    /// Locate `deployment.json` in the current directory, then its parent
    pub fn discover() -> Result<(PathBuf, Self)> {
        Self::discover_in(&[PathBuf::from("."), PathBuf::from("..")])
    }

    pub fn discover_in(roots: &[PathBuf]) -> Result<(PathBuf, Self)> {
        for root in roots {
            let path = root.join(DEPLOYMENT_FILE);
            debug!("Looking for deployment record at {}", path.display());
            if path.is_file() {
                let record = Self::load(&path)?;
                return Ok((path, record));
            }
        }
        Err(Error::NotFoundError(format!(
            "{} not found in {}",
            DEPLOYMENT_FILE,
            roots
                .iter()
                .map(|r| r.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }

    pub fn is_wasm_ipfs(&self) -> bool {
        self.deployment_type.as_deref() == Some(WASM_IPFS)
    }

    /// Content identifier of the deployed package
    pub fn identifier(&self) -> Option<&str> {
        self.ipfs_hash.as_deref().filter(|h| !h.is_empty())
    }

    /// Container file to fall back to when gateways fail
    pub fn local_fallback(&self) -> Option<&Path> {
        self.wasm_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}
