// src/commands/publish.rs

//! Publish command

use super::function_names;
use crate::cli::FunctionNames;
use anyhow::{Context, Result};
use codepack::{Config, DeployStatus, Publisher, UploadChain};
use std::path::Path;
use tracing::info;

pub fn cmd_publish(
    config: &Config,
    source: &Path,
    names: &FunctionNames,
    output: Option<&Path>,
) -> Result<()> {
    let names = function_names(names)?;
    let output = output.unwrap_or(&config.output_file);

    let chain = UploadChain::from_env(&config.upload)?;
    info!("Upload backends: {}", chain.names().join(", "));

    let mut status = DeployStatus::new();
    let report = Publisher::new(chain)
        .publish(source, &names, output, &mut status)
        .with_context(|| format!("Failed to publish {}", source.display()))?;

    println!("Container: {}", report.container.display());
    println!("Identifier: {}", report.identifier);
    match &report.backend {
        Some(backend) => println!("Stored via {}", backend),
        None => {
            println!("No storage backend accepted the upload; this is a local placeholder.");
            println!("Set WEB3_STORAGE_TOKEN, PINATA_API_KEY + PINATA_SECRET_KEY, or NFT_STORAGE_TOKEN,");
            println!("or run a local IPFS node, to publish for real.");
        }
    }
    println!("Status: {}", status);
    Ok(())
}
