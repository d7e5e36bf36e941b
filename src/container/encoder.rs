// src/container/encoder.rs

//! Container encoding

use super::{FunctionManifest, Package, Section, FUNCTIONS_SECTION, SOURCE_SECTION};
use tracing::debug;

/// Encode guest source and its callable function names into a container
///
/// The output always starts with the magic + version header, followed by the
/// source section and then the manifest section.
pub fn encode<S: AsRef<str>>(source: &str, function_names: &[S]) -> Vec<u8> {
    let manifest = FunctionManifest::new(function_names.iter().map(|n| n.as_ref()));

    let mut package = Package::new();
    package.push(Section::reserved(
        SOURCE_SECTION,
        source.as_bytes().to_vec(),
    ));
    package.push(Section::reserved(FUNCTIONS_SECTION, manifest.to_json()));

    let bytes = package.to_bytes();
    debug!(
        "Encoded container: {} bytes source, {} functions, {} bytes total",
        source.len(),
        manifest.len(),
        bytes.len()
    );
    bytes
}
