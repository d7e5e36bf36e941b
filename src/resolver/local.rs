// src/resolver/local.rs

//! Local candidate search for placeholder identifiers

use std::path::{Path, PathBuf};
use tracing::debug;

/// File names a publish or a previous fetch leaves behind
pub const CONVENTIONAL_NAMES: [&str; 2] = ["contract.wasm", "downloaded_contract.wasm"];

/// Where to look for a container on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSearch {
    roots: Vec<PathBuf>,
    names: Vec<String>,
}

impl LocalSearch {
    pub fn new(roots: Vec<PathBuf>, names: Vec<String>) -> Self {
        Self { roots, names }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Ordered, de-duplicated candidate paths
    ///
    /// Explicit path first, then each conventional name under each root,
    /// then the expected-file hint as given and under each root.
    pub fn candidates(&self, explicit: Option<&Path>, expected: Option<&Path>) -> Vec<PathBuf> {
        let mut out: Vec<PathBuf> = Vec::new();
        let mut push = |p: PathBuf| {
            if !out.contains(&p) {
                out.push(p);
            }
        };

        if let Some(path) = explicit {
            push(path.to_path_buf());
        }

        for root in &self.roots {
            for name in &self.names {
                push(root.join(name));
            }
        }

        if let Some(hint) = expected {
            push(hint.to_path_buf());
            if hint.is_relative() {
                for root in &self.roots {
                    push(root.join(hint));
                }
            }
        }

        out
    }

    /// First existing candidate, plus every path checked along the way
    pub fn find(
        &self,
        explicit: Option<&Path>,
        expected: Option<&Path>,
    ) -> (Option<PathBuf>, Vec<PathBuf>) {
        let candidates = self.candidates(explicit, expected);
        for (i, candidate) in candidates.iter().enumerate() {
            debug!("Probing local candidate {}", candidate.display());
            if candidate.is_file() {
                return (Some(candidate.clone()), candidates[..=i].to_vec());
            }
        }
        (None, candidates)
    }
}

impl Default for LocalSearch {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from("."), PathBuf::from("..")],
            names: CONVENTIONAL_NAMES.iter().map(|n| n.to_string()).collect(),
        }
    }
}
