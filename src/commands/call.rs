// src/commands/call.rs

//! Call command

use super::{resolve, FetchArgs};
use anyhow::{bail, Context, Result};
use codepack::{decode, Config, DispatchTable, ResolutionOutcome};
use serde_json::Value;
use std::sync::Arc;

pub fn cmd_call(config: &Config, function: &str, args: &[String], fetch: FetchArgs<'_>) -> Result<()> {
    let Some(evaluator) = config.command_evaluator() else {
        bail!("No evaluator configured; add an [evaluator] section to codepack.toml");
    };

    let resolved = resolve(config, &fetch)?;
    let identifier = resolved.identifier;
    let bytes = match resolved.outcome {
        ResolutionOutcome::Package(bytes) => bytes,
        ResolutionOutcome::LocalPath(path) => std::fs::read(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        other => bail!("{} resolved to {} content, not a package", identifier, other.kind()),
    };

    let package = decode(&bytes).with_context(|| format!("{} is not a usable package", identifier))?;
    let table = DispatchTable::from_package(&package, Arc::new(evaluator));

    let args: Vec<Value> = args.iter().map(|a| parse_arg(a)).collect();
    let result = table.call(function, &args)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// JSON where it parses, plain string otherwise
fn parse_arg(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}
