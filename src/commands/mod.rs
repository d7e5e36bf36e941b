// src/commands/mod.rs
//! Command handlers for the codepack CLI

mod call;
mod fetch;
mod pack;
mod publish;

pub use call::cmd_call;
pub use fetch::cmd_fetch;
pub use pack::{cmd_classify, cmd_pack, cmd_unpack};
pub use publish::cmd_publish;

use crate::cli::FunctionNames;
use anyhow::{Context, Result};
use codepack::resolver::{ContentResolver, EndpointList, HttpFetcher, ResolveRequest};
use codepack::{Config, DeploymentRecord, FunctionSignatures, ResolutionOutcome};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolution inputs shared by `fetch` and `call`
pub struct FetchArgs<'a> {
    pub identifier: Option<&'a str>,
    pub local: Option<&'a Path>,
    pub expected: Option<&'a Path>,
    pub gateways: &'a [String],
    pub deployment: Option<&'a Path>,
    pub no_cache: bool,
}

/// Identifier and fallback file after consulting the deployment record
struct Target {
    identifier: String,
    fallback: Option<PathBuf>,
}

/// Use the explicit identifier, else read it from the deployment record
fn resolve_target(args: &FetchArgs<'_>) -> Result<Target> {
    let explicit_fallback = args.local.map(Path::to_path_buf);

    if let Some(identifier) = args.identifier {
        return Ok(Target {
            identifier: identifier.to_string(),
            fallback: explicit_fallback,
        });
    }

    let (path, record) = match args.deployment {
        Some(path) => (path.to_path_buf(), DeploymentRecord::load(path)?),
        None => DeploymentRecord::discover()
            .context("No identifier given and no deployment record found")?,
    };
    debug!("Using deployment record {}", path.display());

    if !record.is_wasm_ipfs() {
        tracing::warn!(
            "{} has deployment_type {:?}, expected \"wasm-ipfs\"",
            path.display(),
            record.deployment_type
        );
    }

    let identifier = record
        .identifier()
        .with_context(|| format!("{} has no ipfs_hash", path.display()))?
        .to_string();

    // A relative wasm_file is relative to the record, not the working directory
    let fallback = explicit_fallback.or_else(|| {
        record.local_fallback().map(|file| {
            if file.is_relative() {
                path.parent().unwrap_or(Path::new(".")).join(file)
            } else {
                file.to_path_buf()
            }
        })
    });

    Ok(Target {
        identifier,
        fallback,
    })
}

fn endpoints(config: &Config, gateways: &[String]) -> Result<EndpointList> {
    if gateways.is_empty() {
        Ok(config.endpoints()?)
    } else {
        EndpointList::from_templates(gateways).context("Invalid --gateway template")
    }
}

fn build_resolver(config: &Config, no_cache: bool) -> Result<ContentResolver> {
    let fetcher = HttpFetcher::with_timeout(config.fetch_timeout())?;
    let resolver = ContentResolver::new(Box::new(fetcher)).with_search(config.local_search());
    Ok(if no_cache {
        resolver
    } else {
        resolver.with_cache(&config.cache_file)
    })
}

/// What a resolution produced
struct Resolved {
    identifier: String,
    outcome: ResolutionOutcome,
    /// Cache file now holding the fetched package
    cached: Option<PathBuf>,
}

/// Resolve the target described by `args`
fn resolve(config: &Config, args: &FetchArgs<'_>) -> Result<Resolved> {
    let target = resolve_target(args)?;
    let endpoints = endpoints(config, args.gateways)?;
    let resolver = build_resolver(config, args.no_cache)?;

    let request = ResolveRequest::new(&target.identifier)
        .with_fallback(target.fallback.as_deref())
        .with_expected(args.expected);

    let outcome = resolver
        .resolve_request(&request, &endpoints)
        .with_context(|| format!("Failed to resolve {}", target.identifier))?;

    let cached = match &outcome {
        ResolutionOutcome::Package(bytes) => resolver.cached(bytes).map(Path::to_path_buf),
        _ => None,
    };
    Ok(Resolved {
        identifier: target.identifier,
        outcome,
        cached,
    })
}

/// Names from `--function` or from a signatures file
fn function_names(names: &FunctionNames) -> Result<Vec<String>> {
    match &names.signatures {
        Some(path) => {
            let signatures = FunctionSignatures::load(path)?;
            Ok(signatures.callable_names())
        }
        None => Ok(names.functions.clone()),
    }
}
