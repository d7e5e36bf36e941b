// src/cli/mod.rs
//! CLI definitions for codepack
//!
//! This module contains the command-line interface definitions using clap.
//! The command implementations are in the `commands` module.
//!
//! - `pack` / `unpack` - Build and inspect containers
//! - `classify` - Tell content addresses from local placeholders
//! - `fetch` - Resolve an identifier through gateways or local files
//! - `publish` - Pack and upload to content-addressed storage
//! - `call` - Resolve a package and run one of its functions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codepack")]
#[command(version)]
#[command(about = "Package guest source into WASM-shaped containers and resolve them over IPFS gateways", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./codepack.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the published function names come from
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct FunctionNames {
    /// Function to expose (repeatable)
    #[arg(short = 'f', long = "function", value_name = "NAME")]
    pub functions: Vec<String>,

    /// JSON file mapping function names to argument lists
    #[arg(long, value_name = "FILE")]
    pub signatures: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pack a source file into a container
    Pack {
        /// Guest source file
        source: PathBuf,

        #[command(flatten)]
        names: FunctionNames,

        /// Container to write (default: output_file from config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the source and function list of a container
    Unpack {
        /// Container file
        container: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Classify an identifier as addressable or non-addressable
    Classify {
        identifier: String,
    },

    /// Resolve an identifier to content
    Fetch {
        /// Identifier (default: ipfs_hash from deployment.json)
        identifier: Option<String>,

        /// Local file to use first, or as fallback when gateways fail
        #[arg(long)]
        local: Option<PathBuf>,

        /// File name the content is expected under locally
        #[arg(long)]
        expected: Option<PathBuf>,

        /// Gateway URL template, `{id}` is replaced (repeatable, replaces configured list)
        #[arg(long = "gateway", value_name = "TEMPLATE")]
        gateways: Vec<String>,

        /// Deployment record to read the identifier from
        #[arg(long)]
        deployment: Option<PathBuf>,

        /// Do not cache fetched packages
        #[arg(long)]
        no_cache: bool,
    },

    /// Pack a source file and upload it
    Publish {
        /// Guest source file
        source: PathBuf,

        #[command(flatten)]
        names: FunctionNames,

        /// Container to write before upload (default: output_file from config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Call a function of a published package
    Call {
        /// Function name
        function: String,

        /// Arguments, parsed as JSON where possible
        args: Vec<String>,

        /// Identifier (default: ipfs_hash from deployment.json)
        #[arg(long)]
        identifier: Option<String>,

        /// Deployment record to read the identifier from
        #[arg(long)]
        deployment: Option<PathBuf>,

        /// Local container to use first, or as fallback
        #[arg(long)]
        local: Option<PathBuf>,

        /// Gateway URL template (repeatable, replaces configured list)
        #[arg(long = "gateway", value_name = "TEMPLATE")]
        gateways: Vec<String>,
    },
}
