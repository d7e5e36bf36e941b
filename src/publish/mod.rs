// src/publish/mod.rs

//! Packing guest source into a container and publishing it
//!
//! `pack_file` writes a container to disk. `Publisher::publish` packs, then
//! pushes the container through the upload chain, tracking progress in a
//! caller-owned `DeployStatus`.

mod signatures;
mod uploader;

pub use signatures::FunctionSignatures;
pub use uploader::{
    HttpUploader, IpfsCliUploader, NFT_STORAGE_URL, PINATA_URL, UploadChain, UploadOutcome,
    Uploader, WEB3_STORAGE_URL,
};

use crate::container::encode;
use crate::error::{Error, Result};
use crate::persist::write_atomic;
use crate::status::DeployStatus;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of a publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub identifier: String,
    /// Backend that stored the container; `None` when a placeholder was minted
    pub backend: Option<String>,
    pub placeholder: bool,
    /// Container file written before upload
    pub container: PathBuf,
}

/// Read guest source, encode it with `names`, and write the container to `output`
///
/// Returns the container size in bytes.
pub fn pack_file<S: AsRef<str>>(source_path: &Path, names: &[S], output: &Path) -> Result<usize> {
    let source = std::fs::read_to_string(source_path).map_err(|e| {
        Error::IoError(format!("Failed to read {}: {}", source_path.display(), e))
    })?;

    let bytes = encode(&source, names);
    write_atomic(output, &bytes).map_err(|e| {
        Error::IoError(format!("Failed to write {}: {}", output.display(), e))
    })?;

    info!(
        "Packed {} ({} function(s)) into {} ({} bytes)",
        source_path.display(),
        names.len(),
        output.display(),
        bytes.len()
    );
    Ok(bytes.len())
}

pub struct Publisher {
    chain: UploadChain,
}

impl Publisher {
    pub fn new(chain: UploadChain) -> Self {
        Self { chain }
    }

    /// Pack and upload, moving `status` through `Deploying` to `Success` or `Error`
    pub fn publish<S: AsRef<str>>(
        &self,
        source_path: &Path,
        names: &[S],
        output: &Path,
        status: &mut DeployStatus,
    ) -> Result<PublishReport> {
        status.begin()?;

        match self.run(source_path, names, output) {
            Ok(report) => {
                status.succeed(&report.identifier)?;
                Ok(report)
            }
            Err(e) => {
                status.fail(e.to_string())?;
                Err(e)
            }
        }
    }

    fn run<S: AsRef<str>>(
        &self,
        source_path: &Path,
        names: &[S],
        output: &Path,
    ) -> Result<PublishReport> {
        pack_file(source_path, names, output)?;
        let outcome = self.chain.upload(output)?;

        Ok(PublishReport {
            placeholder: outcome.is_placeholder(),
            identifier: outcome.identifier,
            backend: outcome.backend,
            container: output.to_path_buf(),
        })
    }
}
