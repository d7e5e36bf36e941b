// src/config.rs
//! Configuration file parsing
//!
//! TOML with every field optional:
//! - top level - gateways, fetch timeout, cache and output files, local search
//! - [upload] - local IPFS node binary and timeout
//! - [evaluator] - sandbox program used by `call`
//!
//! Lookup order is an explicit path, then `./codepack.toml`, then
//! `<config dir>/codepack/config.toml`, else built-in defaults. Upload
//! credentials are read from the environment, never from this file.

use crate::dispatch::{CommandEvaluator, DEFAULT_EVAL_TIMEOUT};
use crate::error::{Error, Result};
use crate::resolver::{
    CONVENTIONAL_NAMES, DEFAULT_CACHE_FILE, DEFAULT_FETCH_TIMEOUT, EndpointList, LocalSearch,
    REFERENCE_GATEWAYS,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Project-local config file name
pub const LOCAL_CONFIG_FILE: &str = "codepack.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Gateway URL templates in priority order
    #[serde(default = "default_gateways")]
    pub gateways: Vec<String>,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Where fetched packages are cached
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,

    /// Conventional file names searched for placeholder identifiers
    #[serde(default = "default_local_names")]
    pub local_names: Vec<String>,

    /// Directories the conventional names are searched under
    #[serde(default = "default_search_roots")]
    pub search_roots: Vec<PathBuf>,

    /// Container written by `pack` and `publish` when no output is given
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,

    #[serde(default)]
    pub upload: UploadSection,

    #[serde(default)]
    pub evaluator: Option<EvaluatorSection>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateways: default_gateways(),
            fetch_timeout_secs: default_fetch_timeout(),
            cache_file: default_cache_file(),
            local_names: default_local_names(),
            search_roots: default_search_roots(),
            output_file: default_output_file(),
            upload: UploadSection::default(),
            evaluator: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadSection {
    /// IPFS CLI used for `ipfs add`
    #[serde(default = "default_ipfs_binary")]
    pub ipfs_binary: String,

    /// Bound on each upload attempt
    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,
}

impl Default for UploadSection {
    fn default() -> Self {
        Self {
            ipfs_binary: default_ipfs_binary(),
            timeout_secs: default_upload_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluatorSection {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_eval_timeout")]
    pub timeout_secs: u64,
}

fn default_gateways() -> Vec<String> {
    REFERENCE_GATEWAYS.iter().map(|g| g.to_string()).collect()
}

fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT.as_secs()
}

fn default_cache_file() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_FILE)
}

fn default_local_names() -> Vec<String> {
    CONVENTIONAL_NAMES.iter().map(|n| n.to_string()).collect()
}

fn default_search_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("."), PathBuf::from("..")]
}

fn default_output_file() -> PathBuf {
    PathBuf::from("contract.wasm")
}

fn default_ipfs_binary() -> String {
    "ipfs".to_string()
}

fn default_upload_timeout() -> u64 {
    30
}

fn default_eval_timeout() -> u64 {
    DEFAULT_EVAL_TIMEOUT.as_secs()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the first location that exists, else defaults
    ///
    /// An explicit path must exist.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        for candidate in Self::search_paths() {
            if candidate.is_file() {
                return Self::load(&candidate);
            }
        }

        debug!("No configuration file found; using defaults");
        Ok(Self::default())
    }

    /// Implicit config locations, in lookup order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("codepack").join("config.toml"));
        }
        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch_timeout_secs == 0 {
            return Err(Error::ConfigError(
                "fetch_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.upload.timeout_secs == 0 {
            return Err(Error::ConfigError(
                "upload.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if let Some(evaluator) = &self.evaluator {
            if evaluator.program.trim().is_empty() {
                return Err(Error::ConfigError(
                    "evaluator.program must not be empty".to_string(),
                ));
            }
        }
        self.endpoints()?;
        Ok(())
    }

    pub fn endpoints(&self) -> Result<EndpointList> {
        EndpointList::from_templates(&self.gateways)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload.timeout_secs)
    }

    pub fn local_search(&self) -> LocalSearch {
        LocalSearch::new(self.search_roots.clone(), self.local_names.clone())
    }

    /// Sandbox evaluator, if one is configured
    pub fn command_evaluator(&self) -> Option<CommandEvaluator> {
        self.evaluator.as_ref().map(|e| {
            CommandEvaluator::new(e.program.clone(), e.args.clone())
                .with_timeout(Duration::from_secs(e.timeout_secs))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gateways.len(), 4);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.upload_timeout(), Duration::from_secs(30));
        assert_eq!(config.cache_file, PathBuf::from("downloaded_contract.wasm"));
        assert_eq!(config.output_file, PathBuf::from("contract.wasm"));
        assert!(config.command_evaluator().is_none());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
gateways = ["http://127.0.0.1:8080/ipfs/", "https://{id}.ipfs.w3s.link"]
fetch_timeout_secs = 3
search_roots = ["/srv/contracts"]

[upload]
ipfs_binary = "/opt/kubo/ipfs"

[evaluator]
program = "python3"
args = ["-I", "sandbox.py"]
"#;
        let config = Config::parse(toml_str).unwrap();
        let endpoints = config.endpoints().unwrap();
        let urls: Vec<String> = endpoints.iter().map(|t| t.expand("Qm1")).collect();
        assert_eq!(
            urls,
            vec!["http://127.0.0.1:8080/ipfs/Qm1", "https://Qm1.ipfs.w3s.link"]
        );
        assert_eq!(config.fetch_timeout(), Duration::from_secs(3));
        assert_eq!(config.upload.ipfs_binary, "/opt/kubo/ipfs");
        assert_eq!(config.upload.timeout_secs, 30);
        assert_eq!(config.local_search().roots(), &[PathBuf::from("/srv/contracts")]);

        let evaluator = config.evaluator.as_ref().unwrap();
        assert_eq!(evaluator.args, vec!["-I", "sandbox.py"]);
        assert_eq!(evaluator.timeout_secs, 10);
        assert!(config.command_evaluator().is_some());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::parse("fetch_timeout_secs = 0").is_err());
        assert!(Config::parse("gateways = [\"nope\"]").is_err());
        assert!(Config::parse("[evaluator]\nprogram = \"  \"").is_err());
        assert!(Config::parse("unknown_key = 1").is_err());
    }

    #[test]
    fn test_discover_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "output_file = \"out.wasm\"\n").unwrap();

        let config = Config::discover(Some(&path)).unwrap();
        assert_eq!(config.output_file, PathBuf::from("out.wasm"));

        let missing = dir.path().join("missing.toml");
        assert!(Config::discover(Some(&missing)).is_err());
    }
}
