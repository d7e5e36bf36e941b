// src/publish/uploader.rs

//! Storage backends for published containers
//!
//! Backends are tried in order until one returns an identifier:
//! - local IPFS node (`ipfs add --quiet`)
//! - web3.storage (`WEB3_STORAGE_TOKEN`)
//! - Pinata (`PINATA_API_KEY` + `PINATA_SECRET_KEY`)
//! - NFT.Storage (`NFT_STORAGE_TOKEN`)
//!
//! HTTP backends are only enabled when their credentials are present.

use crate::config::UploadSection;
use crate::dispatch::drain;
use crate::error::{Error, Result};
use crate::hash::placeholder_for_file;
use reqwest::blocking::{multipart, Client};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

pub const WEB3_STORAGE_URL: &str = "https://api.web3.storage/upload";
pub const PINATA_URL: &str = "https://api.pinata.cloud/pinning/pinFileToIPFS";
pub const NFT_STORAGE_URL: &str = "https://api.nft.storage/upload";

/// Pushes a file to content-addressed storage
pub trait Uploader: Send + Sync {
    fn name(&self) -> &str;

    /// Upload the file and return its content identifier
    fn upload(&self, path: &Path) -> Result<String>;
}

/// `ipfs add <file> --quiet` against a local node
pub struct IpfsCliUploader {
    binary: String,
    timeout: Duration,
}

impl IpfsCliUploader {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

impl Uploader for IpfsCliUploader {
    fn name(&self) -> &str {
        "ipfs"
    }

    fn upload(&self, path: &Path) -> Result<String> {
        debug!("Executing: {} add {} --quiet", self.binary, path.display());

        let mut child = Command::new(&self.binary)
            .arg("add")
            .arg(path)
            .arg("--quiet")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::UploadError(format!("Failed to spawn '{}': {}", self.binary, e)))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = child.wait_timeout(self.timeout).map_err(|e| {
            Error::UploadError(format!("Failed to wait on '{}': {}", self.binary, e))
        })?;

        let Some(status) = status else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::UploadError(format!(
                "'{} add' timed out after {} seconds",
                self.binary,
                self.timeout.as_secs()
            )));
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        let stdout = String::from_utf8_lossy(&stdout);
        let stderr = String::from_utf8_lossy(&stderr);

        if !status.success() {
            return Err(Error::UploadError(format!(
                "'{} add' failed with exit code {}: {}",
                self.binary,
                status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        // With --quiet the last line is the root identifier
        match stdout.lines().map(str::trim).filter(|l| !l.is_empty()).last() {
            Some(identifier) => Ok(identifier.to_string()),
            None => Err(Error::UploadError(format!(
                "'{} add' printed no identifier",
                self.binary
            ))),
        }
    }
}

/// How an HTTP pinning service authenticates
#[derive(Debug, Clone)]
enum Auth {
    Bearer(String),
    PinataKeys { api_key: String, secret: String },
}

/// Multipart upload to a pinning service
pub struct HttpUploader {
    name: &'static str,
    client: Client,
    url: String,
    auth: Auth,
    /// JSON pointer to the identifier in a success reply
    cid_pointer: &'static str,
}

impl HttpUploader {
    pub fn web3_storage(token: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::build("web3.storage", WEB3_STORAGE_URL, Auth::Bearer(token.into()), "/cid", timeout)
    }

    pub fn pinata(
        api_key: impl Into<String>,
        secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let auth = Auth::PinataKeys {
            api_key: api_key.into(),
            secret: secret.into(),
        };
        Self::build("Pinata", PINATA_URL, auth, "/IpfsHash", timeout)
    }

    pub fn nft_storage(token: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::build("NFT.Storage", NFT_STORAGE_URL, Auth::Bearer(token.into()), "/value/cid", timeout)
    }

    /// Point the backend at a different API URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn build(
        name: &'static str,
        url: &str,
        auth: Auth,
        cid_pointer: &'static str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name,
            client,
            url: url.to_string(),
            auth,
            cid_pointer,
        })
    }

    fn parse_reply(&self, status: u16, body: &str) -> Result<String> {
        if !(200..300).contains(&status) {
            if matches!(self.auth, Auth::PinataKeys { .. }) && body.contains("NO_SCOPES_FOUND") {
                return Err(Error::UploadError(
                    "Pinata API key missing required scopes; enable 'pinFileToIPFS' in the Pinata dashboard"
                        .to_string(),
                ));
            }
            return Err(Error::UploadError(format!(
                "{} upload failed (HTTP {}): {}",
                self.name,
                status,
                body.trim()
            )));
        }

        let json: serde_json::Value = serde_json::from_str(body).map_err(|e| {
            Error::UploadError(format!("{} returned invalid JSON: {}", self.name, e))
        })?;

        json.pointer(self.cid_pointer)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::UploadError(format!(
                    "{} reply has no identifier at {}",
                    self.name, self.cid_pointer
                ))
            })
    }
}

impl Uploader for HttpUploader {
    fn name(&self) -> &str {
        self.name
    }

    fn upload(&self, path: &Path) -> Result<String> {
        let form = multipart::Form::new().file("file", path).map_err(|e| {
            Error::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let request = self.client.post(&self.url).multipart(form);
        let request = match &self.auth {
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::PinataKeys { api_key, secret } => request
                .header("pinata_api_key", api_key)
                .header("pinata_secret_api_key", secret),
        };

        let response = request
            .send()
            .map_err(|e| Error::UploadError(format!("{} request failed: {e}", self.name)))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| Error::UploadError(format!("{} reply unreadable: {e}", self.name)))?;

        self.parse_reply(status, &body)
    }
}

/// Identifier produced by the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub identifier: String,
    /// Backend that accepted the file; `None` for a placeholder
    pub backend: Option<String>,
}

impl UploadOutcome {
    pub fn is_placeholder(&self) -> bool {
        self.backend.is_none()
    }
}

/// Ordered list of backends with a placeholder fallback
#[derive(Default)]
pub struct UploadChain {
    uploaders: Vec<Box<dyn Uploader>>,
}

impl UploadChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uploader: Box<dyn Uploader>) -> Self {
        self.uploaders.push(uploader);
        self
    }

    /// Local node first, then every HTTP backend with credentials in the environment
    pub fn from_env(section: &UploadSection) -> Result<Self> {
        Self::from_lookup(section, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(section: &UploadSection, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout = Duration::from_secs(section.timeout_secs);
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut chain =
            Self::new().with(Box::new(IpfsCliUploader::new(section.ipfs_binary.clone(), timeout)));

        if let Some(token) = var("WEB3_STORAGE_TOKEN") {
            chain = chain.with(Box::new(HttpUploader::web3_storage(token, timeout)?));
        }
        if let (Some(key), Some(secret)) = (var("PINATA_API_KEY"), var("PINATA_SECRET_KEY")) {
            chain = chain.with(Box::new(HttpUploader::pinata(key, secret, timeout)?));
        }
        if let Some(token) = var("NFT_STORAGE_TOKEN") {
            chain = chain.with(Box::new(HttpUploader::nft_storage(token, timeout)?));
        }

        Ok(chain)
    }

    pub fn names(&self) -> Vec<&str> {
        self.uploaders.iter().map(|u| u.name()).collect()
    }

    /// Try each backend in order; mint a placeholder if none succeeds
    pub fn upload(&self, path: &Path) -> Result<UploadOutcome> {
        for uploader in &self.uploaders {
            info!("Uploading {} via {}", path.display(), uploader.name());
            match uploader.upload(path) {
                Ok(identifier) => {
                    info!("Uploaded via {}: {}", uploader.name(), identifier);
                    return Ok(UploadOutcome {
                        identifier,
                        backend: Some(uploader.name().to_string()),
                    });
                }
                Err(e) => warn!("{} upload failed: {}", uploader.name(), e),
            }
        }

        let identifier = placeholder_for_file(path).map_err(|e| {
            Error::IoError(format!("Failed to hash {}: {}", path.display(), e))
        })?;
        warn!(
            "No storage backend accepted {}; using local placeholder {}",
            path.display(),
            identifier
        );
        Ok(UploadOutcome {
            identifier,
            backend: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl Uploader for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn upload(&self, _path: &Path) -> Result<String> {
            Err(Error::UploadError("offline".to_string()))
        }
    }

    struct Fixed(&'static str);

    impl Uploader for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn upload(&self, _path: &Path) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn container(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("contract.wasm");
        std::fs::write(&path, crate::container::encode("x = 1", &["f"])).unwrap();
        path
    }

    #[test]
    fn test_first_success_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = container(dir.path());
        let chain = UploadChain::new()
            .with(Box::new(Failing))
            .with(Box::new(Fixed("QmFirst")))
            .with(Box::new(Fixed("QmSecond")));

        let outcome = chain.upload(&path).unwrap();
        assert_eq!(outcome.identifier, "QmFirst");
        assert_eq!(outcome.backend.as_deref(), Some("fixed"));
        assert!(!outcome.is_placeholder());
    }

    #[test]
    fn test_placeholder_when_all_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = container(dir.path());
        let chain = UploadChain::new().with(Box::new(Failing));

        let outcome = chain.upload(&path).unwrap();
        assert!(outcome.is_placeholder());
        assert!(outcome.identifier.starts_with("QmLocal"));
        assert_eq!(
            outcome.identifier,
            crate::hash::placeholder_identifier(&std::fs::read(&path).unwrap())
        );
    }

    #[test]
    fn test_placeholder_for_missing_container_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.wasm");
        let chain = UploadChain::new().with(Box::new(Failing));

        match chain.upload(&missing) {
            Err(Error::IoError(msg)) => assert!(msg.contains("absent.wasm")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_from_lookup_enables_configured_backends() {
        let section = UploadSection::default();

        let chain = UploadChain::from_lookup(&section, |_| None).unwrap();
        assert_eq!(chain.names(), vec!["ipfs"]);

        let chain = UploadChain::from_lookup(&section, |key| match key {
            "WEB3_STORAGE_TOKEN" => Some("t".to_string()),
            "PINATA_API_KEY" => Some("k".to_string()),
            "NFT_STORAGE_TOKEN" => Some("  ".to_string()),
            _ => None,
        })
        .unwrap();
        // Pinata needs both keys; blank tokens count as unset
        assert_eq!(chain.names(), vec!["ipfs", "web3.storage"]);
    }

    #[test]
    fn test_reply_parsing() {
        let timeout = Duration::from_secs(1);
        let web3 = HttpUploader::web3_storage("t", timeout).unwrap();
        assert_eq!(web3.parse_reply(200, r#"{"cid": "bafyabc"}"#).unwrap(), "bafyabc");
        assert!(web3.parse_reply(200, r#"{"other": 1}"#).is_err());
        assert!(web3.parse_reply(401, "unauthorized").is_err());

        let nft = HttpUploader::nft_storage("t", timeout).unwrap();
        assert_eq!(
            nft.parse_reply(200, r#"{"ok": true, "value": {"cid": "bafynft"}}"#).unwrap(),
            "bafynft"
        );

        let pinata = HttpUploader::pinata("k", "s", timeout).unwrap();
        assert_eq!(
            pinata.parse_reply(200, r#"{"IpfsHash": "QmPin", "PinSize": 10}"#).unwrap(),
            "QmPin"
        );
        let err = pinata
            .parse_reply(403, r#"{"error": {"reason": "NO_SCOPES_FOUND"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("pinFileToIPFS"));
    }

    #[test]
    fn test_missing_ipfs_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = container(dir.path());
        let uploader = IpfsCliUploader::new("/nonexistent/ipfs", Duration::from_secs(1));
        assert!(matches!(uploader.upload(&path), Err(Error::UploadError(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_ipfs_cli_output() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = container(dir.path());
        let script = dir.path().join("fake-ipfs");
        std::fs::write(&script, "#!/bin/sh\necho QmFromLocalNode\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let uploader = IpfsCliUploader::new(script.to_string_lossy(), Duration::from_secs(5));
        assert_eq!(uploader.upload(&path).unwrap(), "QmFromLocalNode");
    }

    #[cfg(unix)]
    #[test]
    fn test_ipfs_cli_noisy_progress_output() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = container(dir.path());
        let script = dir.path().join("fake-ipfs");
        // Well past a pipe buffer on both streams before exiting
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             head -c 200000 /dev/zero | tr '\\0' 'p' >&2\n\
             head -c 200000 /dev/zero | tr '\\0' '\\n'\n\
             echo QmAfterProgress\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let uploader = IpfsCliUploader::new(script.to_string_lossy(), Duration::from_secs(5));
        assert_eq!(uploader.upload(&path).unwrap(), "QmAfterProgress");
    }
}
