// src/commands/pack.rs

//! Container CLI commands

use super::function_names;
use crate::cli::{FunctionNames, OutputFormat};
use anyhow::{Context, Result};
use codepack::publish::pack_file;
use codepack::{classify, decode, Config};
use std::path::Path;

/// Pack a source file into a container
pub fn cmd_pack(
    config: &Config,
    source: &Path,
    names: &FunctionNames,
    output: Option<&Path>,
) -> Result<()> {
    let names = function_names(names)?;
    let output = output.unwrap_or(&config.output_file);

    let size = pack_file(source, &names, output)
        .with_context(|| format!("Failed to pack {}", source.display()))?;

    println!("Wrote {} ({} bytes)", output.display(), size);
    println!("Functions: {}", names.join(", "));
    Ok(())
}

/// Print the source and function list of a container
pub fn cmd_unpack(container: &Path, format: OutputFormat) -> Result<()> {
    let bytes = std::fs::read(container)
        .with_context(|| format!("Failed to read {}", container.display()))?;
    let package = decode(&bytes)
        .with_context(|| format!("{} is not a usable container", container.display()))?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "source": package.source,
                "functions": package.functions.names(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Functions ({}):", package.functions.len());
            for name in package.functions.names() {
                println!("  {}", name);
            }
            println!();
            println!("{}", package.source);
        }
    }

    Ok(())
}

/// Print whether an identifier is resolved remotely or locally
pub fn cmd_classify(identifier: &str) -> Result<()> {
    println!("{}", classify(identifier));
    Ok(())
}
