// src/publish/signatures.rs

//! Function signature maps supplied alongside guest source

use crate::dispatch::is_entry_point;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// `{name: [argument names]}` for every function defined in a guest source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionSignatures {
    functions: BTreeMap<String, Vec<String>>,
}

impl FunctionSignatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, args: Vec<String>) {
        self.functions.insert(name.into(), args);
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::ParseError(format!("Invalid function signatures: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn args(&self, name: &str) -> Option<&[String]> {
        self.functions.get(name).map(Vec::as_slice)
    }

    /// Names to publish in the manifest, entry points excluded, sorted
    pub fn callable_names(&self) -> Vec<String> {
        self.functions
            .keys()
            .filter(|name| !is_entry_point(name))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
