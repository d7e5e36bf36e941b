// src/container/decoder.rs

//! Container decoding
//!
//! Decoding is lenient. The walk stops quietly at the first section that
//! does not fit in the remaining buffer and keeps whatever was fully parsed
//! before it, so a truncated download that still holds the source section
//! decodes normally.
//!
//! Inner length prefixes (name length, payload length) decide how far a
//! custom section extends. The outer size field is only used to skip
//! non-custom sections and to detect a truncated tail.

use super::{
    has_wasm_magic, FunctionManifest, Package, Section, SectionKind, FUNCTIONS_SECTION,
    HEADER_LEN, SOURCE_SECTION,
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Not a package container: missing WebAssembly magic")]
    InvalidMagic,

    #[error("Package container has no '{}' section", SOURCE_SECTION)]
    MissingSource,
}

/// Guest source and manifest recovered from a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPackage {
    pub source: String,
    pub functions: FunctionManifest,
}

/// Bounds-checked cursor over the container bytes
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], start: usize) -> Self {
        Self {
            data,
            pos: start.min(data.len()),
        }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn offset(&self) -> usize {
        self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn read_u32_le(&mut self) -> Option<u32> {
        let bytes = self.read_bytes(4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        if self.remaining() < len {
            return None;
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Some(bytes)
    }
}

/// Walk a container and collect every fully contained custom section
///
/// Fails only when the magic marker is absent.
pub fn parse_sections(data: &[u8]) -> Result<Package, DecodeError> {
    if !has_wasm_magic(data) {
        return Err(DecodeError::InvalidMagic);
    }

    let version = data
        .get(4..HEADER_LEN)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .unwrap_or(0);

    let mut package = Package {
        version,
        sections: Vec::new(),
    };
    let mut reader = Reader::new(data, HEADER_LEN);

    while reader.remaining() > 0 {
        let start = reader.offset();
        let (Some(id), Some(size)) = (reader.read_u8(), reader.read_u32_le()) else {
            debug!("Truncated section header at offset {}", start);
            break;
        };
        let size = size as usize;

        if reader.remaining() < size {
            debug!(
                "Section at offset {} declares {} bytes, only {} remain; stopping",
                start,
                size,
                reader.remaining()
            );
            break;
        }

        match SectionKind::from_id(id) {
            SectionKind::Other(id) => {
                debug!("Skipping section id {} ({} bytes)", id, size);
                reader.read_bytes(size);
            }
            SectionKind::Custom => match read_custom_body(&mut reader) {
                Some(section) => package.sections.push(section),
                None => {
                    debug!("Custom section at offset {} is truncated; stopping", start);
                    break;
                }
            },
        }
    }

    Ok(package)
}

fn read_custom_body(reader: &mut Reader<'_>) -> Option<Section> {
    let name_len = reader.read_u8()? as usize;
    let name = String::from_utf8_lossy(reader.read_bytes(name_len)?).into_owned();
    let payload_len = reader.read_u32_le()? as usize;
    let payload = reader.read_bytes(payload_len)?.to_vec();
    Some(Section::parsed(name, payload))
}

/// Decode a container into guest source and function manifest
///
/// The source section is the only hard requirement. A manifest whose JSON
/// does not parse is dropped and an empty manifest returned in its place.
pub fn decode(data: &[u8]) -> Result<DecodedPackage, DecodeError> {
    let package = parse_sections(data)?;

    let mut source = None;
    let mut functions = FunctionManifest::default();

    for section in &package.sections {
        match section.name() {
            SOURCE_SECTION => {
                source = Some(String::from_utf8_lossy(section.payload()).into_owned());
            }
            FUNCTIONS_SECTION => match FunctionManifest::from_json(section.payload()) {
                Ok(manifest) => functions = manifest,
                Err(e) => warn!("Dropping unreadable '{}' section: {}", FUNCTIONS_SECTION, e),
            },
            other => debug!("Ignoring custom section '{}'", other),
        }
    }

    let source = source.ok_or(DecodeError::MissingSource)?;
    Ok(DecodedPackage { source, functions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{encode, Package, Section};

    fn frame(id: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![id];
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    fn custom_body(name: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = vec![name.len() as u8];
        body.extend_from_slice(name.as_bytes());
        body.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        body.extend_from_slice(payload);
        body
    }

    #[test]
    fn test_round_trip() {
        let bytes = encode("def f(a,b): return a+b", &["f"]);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.source, "def f(a,b): return a+b");
        assert_eq!(decoded.functions.names(), &["f".to_string()]);
    }

    #[test]
    fn test_invalid_magic() {
        assert_eq!(decode(b""), Err(DecodeError::InvalidMagic));
        assert_eq!(decode(b"\x00as"), Err(DecodeError::InvalidMagic));
        assert_eq!(decode(b"{\"code\": \"x\"}"), Err(DecodeError::InvalidMagic));
    }

    #[test]
    fn test_header_only_is_missing_source() {
        assert_eq!(decode(&Package::new().to_bytes()), Err(DecodeError::MissingSource));
        assert_eq!(decode(b"\0asm"), Err(DecodeError::MissingSource));
    }

    #[test]
    fn test_non_custom_sections_are_skipped() {
        let mut bytes = Package::new().to_bytes();
        // A type section whose body would parse as garbage if interpreted
        bytes.extend(frame(1, &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff]));
        bytes.extend(frame(0, &custom_body("python_code", b"x = 1")));

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.source, "x = 1");
        assert!(decoded.functions.is_empty());
    }

    #[test]
    fn test_unknown_custom_sections_are_ignored() {
        let mut pkg = Package::new();
        pkg.push(Section::custom("name", b"module-name".to_vec()).unwrap());
        pkg.push(Section::custom("python_code", b"y = 2".to_vec()).unwrap());
        pkg.push(Section::custom("producers", vec![0, 1, 2]).unwrap());

        let decoded = decode(&pkg.to_bytes()).unwrap();
        assert_eq!(decoded.source, "y = 2");
    }

    #[test]
    fn test_bad_manifest_json_is_dropped() {
        let mut pkg = Package::new();
        pkg.push(Section::custom("python_code", b"z = 3".to_vec()).unwrap());
        pkg.push(Section::custom("functions", b"{not json".to_vec()).unwrap());

        let decoded = decode(&pkg.to_bytes()).unwrap();
        assert_eq!(decoded.source, "z = 3");
        assert!(decoded.functions.is_empty());
    }

    #[test]
    fn test_manifest_without_functions_key() {
        let mut pkg = Package::new();
        pkg.push(Section::custom("python_code", b"".to_vec()).unwrap());
        pkg.push(Section::custom("functions", b"{}".to_vec()).unwrap());

        let decoded = decode(&pkg.to_bytes()).unwrap();
        assert_eq!(decoded.source, "");
        assert!(decoded.functions.is_empty());
    }

    #[test]
    fn test_invalid_utf8_source_is_replaced() {
        let mut pkg = Package::new();
        pkg.push(Section::custom("python_code", vec![b'a', 0xff, b'b']).unwrap());

        let decoded = decode(&pkg.to_bytes()).unwrap();
        assert_eq!(decoded.source, "a\u{fffd}b");
    }

    #[test]
    fn test_truncated_manifest_keeps_source() {
        let bytes = encode("def g(): pass", &["g"]);
        let truncated = &bytes[..bytes.len() - 3];

        let decoded = decode(truncated).unwrap();
        assert_eq!(decoded.source, "def g(): pass");
        assert!(decoded.functions.is_empty());
    }

    #[test]
    fn test_truncated_source_is_missing_source() {
        let bytes = encode("def g(): pass", &["g"]);
        assert_eq!(decode(&bytes[..20]), Err(DecodeError::MissingSource));
    }

    #[test]
    fn test_version_is_read() {
        let bytes = encode("", &[] as &[&str]);
        assert_eq!(parse_sections(&bytes).unwrap().version, 1);
        assert_eq!(parse_sections(b"\0asm\x01").unwrap().version, 0);
    }

    #[test]
    fn test_oversized_declared_size_stops_walk() {
        let mut bytes = Package::new().to_bytes();
        bytes.extend(frame(0, &custom_body("python_code", b"ok")));
        // Declares 1000 bytes but carries 3
        bytes.push(0);
        bytes.extend_from_slice(&1000u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3]);

        let pkg = parse_sections(&bytes).unwrap();
        assert_eq!(pkg.sections.len(), 1);
        assert_eq!(decode(&bytes).unwrap().source, "ok");
    }
}
