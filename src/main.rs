// src/main.rs

use anyhow::Result;
use clap::Parser;
use codepack::Config;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::discover(cli.config.as_deref())?;

    match cli.command {
        Commands::Pack {
            source,
            names,
            output,
        } => commands::cmd_pack(&config, &source, &names, output.as_deref()),

        Commands::Unpack { container, format } => commands::cmd_unpack(&container, format),

        Commands::Classify { identifier } => commands::cmd_classify(&identifier),

        Commands::Fetch {
            identifier,
            local,
            expected,
            gateways,
            deployment,
            no_cache,
        } => commands::cmd_fetch(
            &config,
            commands::FetchArgs {
                identifier: identifier.as_deref(),
                local: local.as_deref(),
                expected: expected.as_deref(),
                gateways: &gateways,
                deployment: deployment.as_deref(),
                no_cache,
            },
        ),

        Commands::Publish {
            source,
            names,
            output,
        } => commands::cmd_publish(&config, &source, &names, output.as_deref()),

        Commands::Call {
            function,
            args,
            identifier,
            deployment,
            local,
            gateways,
        } => commands::cmd_call(
            &config,
            &function,
            &args,
            commands::FetchArgs {
                identifier: identifier.as_deref(),
                local: local.as_deref(),
                expected: None,
                gateways: &gateways,
                deployment: deployment.as_deref(),
                no_cache: false,
            },
        ),
    }
}
