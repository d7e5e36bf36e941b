// src/container/mod.rs

//! WASM-shaped package container
//!
//! A container is a byte stream that any WebAssembly tool recognizes as a
//! module: the `\0asm` magic, a little-endian version, then sections. Only
//! custom sections are produced. Two reserved custom sections carry the
//! guest source text and the function manifest.
//!
//! ```text
//! offset 0   magic    00 61 73 6d
//! offset 4   version  01 00 00 00
//! offset 8   section* id(1) size(4) nameLen(1) name payloadLen(4) payload
//! ```
//!
//! Section framing is not standard WebAssembly: sizes are fixed-width
//! little-endian `u32` rather than LEB128, and the payload carries its own
//! length prefix. Containers written by older deploy tooling use this exact
//! layout.

mod decoder;
mod encoder;

pub use decoder::{decode, parse_sections, DecodeError, DecodedPackage};
pub use encoder::encode;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// WebAssembly module marker
pub const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6d];

/// Container version written by the encoder
pub const FORMAT_VERSION: u32 = 1;

/// Size of magic + version
pub const HEADER_LEN: usize = 8;

/// Section id of a custom section
pub const CUSTOM_SECTION_ID: u8 = 0;

/// Custom section holding the UTF-8 guest source
pub const SOURCE_SECTION: &str = "python_code";

/// Custom section holding `{"functions": [..]}`
pub const FUNCTIONS_SECTION: &str = "functions";

/// Check whether a buffer starts with the WebAssembly marker
pub fn has_wasm_magic(data: &[u8]) -> bool {
    data.len() >= WASM_MAGIC.len() && data[..WASM_MAGIC.len()] == WASM_MAGIC
}

/// Errors building a section by hand
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
    #[error("Section name is {0} bytes; at most 255 fit in the name length field")]
    NameTooLong(usize),
}

/// Section kind
///
/// Only custom sections are interpreted; any other id is skipped by its
/// declared size during decode and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Custom,
    Other(u8),
}

impl SectionKind {
    pub fn from_id(id: u8) -> Self {
        if id == CUSTOM_SECTION_ID {
            Self::Custom
        } else {
            Self::Other(id)
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Self::Custom => CUSTOM_SECTION_ID,
            Self::Other(id) => id,
        }
    }
}

/// A named custom section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    kind: SectionKind,
    name: String,
    payload: Vec<u8>,
}

impl Section {
    /// Create a custom section, rejecting names that do not fit in one length byte
    pub fn custom(name: impl Into<String>, payload: Vec<u8>) -> Result<Self, SectionError> {
        let name = name.into();
        if name.len() > u8::MAX as usize {
            return Err(SectionError::NameTooLong(name.len()));
        }
        Ok(Self {
            kind: SectionKind::Custom,
            name,
            payload,
        })
    }

    /// Reserved sections use short constant names, so the length check is moot
    pub(crate) fn reserved(name: &'static str, payload: Vec<u8>) -> Self {
        debug_assert!(name.len() <= u8::MAX as usize);
        Self {
            kind: SectionKind::Custom,
            name: name.to_string(),
            payload,
        }
    }

    /// Sections read back from bytes; a lossily decoded name may exceed 255 bytes
    pub(crate) fn parsed(name: String, payload: Vec<u8>) -> Self {
        Self {
            kind: SectionKind::Custom,
            name,
            payload,
        }
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Value of the outer size field: nameLen byte + name + payloadLen + payload
    pub fn declared_size(&self) -> u32 {
        len_u32(1 + self.name.len() + 4 + self.payload.len())
    }
}

/// An ordered list of sections behind the magic and version header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub version: u32,
    pub sections: Vec<Section>,
}

impl Package {
    pub fn new() -> Self {
        Self {
            version: FORMAT_VERSION,
            sections: Vec::new(),
        }
    }

    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Last custom section with the given name
    pub fn custom_section(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .rev()
            .find(|s| s.kind == SectionKind::Custom && s.name == name)
    }

    /// Serialize to container bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let body: usize = self
            .sections
            .iter()
            .map(|s| 5 + s.declared_size() as usize)
            .sum();
        let mut out = Vec::with_capacity(HEADER_LEN + body);
        out.extend_from_slice(&WASM_MAGIC);
        out.extend_from_slice(&self.version.to_le_bytes());

        for section in &self.sections {
            out.push(section.kind.id());
            out.extend_from_slice(&section.declared_size().to_le_bytes());
            out.push(section.name.len() as u8);
            out.extend_from_slice(section.name.as_bytes());
            out.extend_from_slice(&len_u32(section.payload.len()).to_le_bytes());
            out.extend_from_slice(&section.payload);
        }

        out
    }
}

impl Default for Package {
    fn default() -> Self {
        Self::new()
    }
}

/// Length fields are 32-bit; payloads past 4 GiB are outside the format
fn len_u32(len: usize) -> u32 {
    debug_assert!(len <= u32::MAX as usize);
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Ordered list of callable function names carried by a container
///
/// Names are kept exactly as supplied, so a decoded manifest lists them in
/// the order they were published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionManifest {
    #[serde(default)]
    functions: Vec<String>,
}

impl FunctionManifest {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            functions: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.functions
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.iter().any(|f| f == name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub(crate) fn to_json(&self) -> Vec<u8> {
        // Serializing a struct of strings cannot fail
        serde_json::to_vec(self).unwrap_or_else(|_| b"{\"functions\":[]}".to_vec())
    }

    pub(crate) fn from_json(payload: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(payload)
    }
}
