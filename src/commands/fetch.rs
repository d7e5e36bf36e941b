// src/commands/fetch.rs

//! Fetch command

use super::{resolve, FetchArgs};
use anyhow::Result;
use codepack::{decode, Config, ResolutionOutcome};

/// Longest text reply printed in full
const TEXT_PREVIEW_LEN: usize = 2000;

pub fn cmd_fetch(config: &Config, args: FetchArgs<'_>) -> Result<()> {
    let resolved = resolve(config, &args)?;
    let identifier = resolved.identifier;

    match resolved.outcome {
        ResolutionOutcome::Package(bytes) => {
            println!("Package {} ({} bytes)", identifier, bytes.len());
            print_package_summary(&bytes);
            if let Some(path) = resolved.cached {
                println!("Cached to {}", path.display());
            }
        }
        ResolutionOutcome::LocalPath(path) => {
            println!("Local file: {}", path.display());
            match std::fs::read(&path) {
                Ok(bytes) => print_package_summary(&bytes),
                Err(e) => println!("  (unreadable: {})", e),
            }
        }
        ResolutionOutcome::Structured(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        ResolutionOutcome::Text(text) => {
            if text.chars().count() > TEXT_PREVIEW_LEN {
                let preview: String = text.chars().take(TEXT_PREVIEW_LEN).collect();
                println!("{}\n... ({} bytes total)", preview, text.len());
            } else {
                println!("{}", text);
            }
        }
    }

    Ok(())
}

fn print_package_summary(bytes: &[u8]) {
    match decode(bytes) {
        Ok(package) => {
            println!("  Source: {} bytes", package.source.len());
            if package.functions.is_empty() {
                println!("  Functions: (none)");
            } else {
                println!("  Functions: {}", package.functions.names().join(", "));
            }
        }
        Err(e) => println!("  Not a usable container: {}", e),
    }
}
