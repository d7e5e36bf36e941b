// src/hash.rs

//! SHA-256 digests and placeholder identifiers
//!
//! A container that could not be pushed to any storage backend still needs
//! an identifier. It gets a placeholder derived from its digest, carrying the
//! local prefix so the resolver never sends it to a gateway.

use crate::identifier::LOCAL_PREFIX;
use sha2::{Digest, Sha256};
use std::io::{self, Read};
use std::path::Path;

/// Hex digits of the digest kept in a placeholder
pub const PLACEHOLDER_DIGEST_LEN: usize = 40;

/// Lowercase hex SHA-256 of a byte slice
pub fn sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Lowercase hex SHA-256 of everything a reader yields
pub fn sha256_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Placeholder identifier for a container's bytes
pub fn placeholder_identifier(data: &[u8]) -> String {
    let digest = sha256(data);
    format!("{}{}", LOCAL_PREFIX, &digest[..PLACEHOLDER_DIGEST_LEN])
}

/// Placeholder identifier for a file, streamed from disk
pub fn placeholder_for_file(path: &Path) -> io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let digest = sha256_reader(&mut file)?;
    Ok(format!("{}{}", LOCAL_PREFIX, &digest[..PLACEHOLDER_DIGEST_LEN]))
}
