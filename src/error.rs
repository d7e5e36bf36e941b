// src/error.rs

//! Crate-wide error type
//!
//! Component errors (decode, resolution, dispatch, status) keep their own
//! enums so callers can match on them; this type covers the operations that
//! cross several components (publishing, configuration, deployment records).

use crate::status::StatusError;
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Upload error: {0}")]
    UploadError(String),

    #[error("Initialization error: {0}")]
    InitError(String),

    #[error("Not found: {0}")]
    NotFoundError(String),

    #[error(transparent)]
    Status(#[from] StatusError),
}
