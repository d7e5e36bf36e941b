// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: function names
fn function_arg() -> Arg {
    Arg::new("function")
        .short('f')
        .long("function")
        .value_name("NAME")
        .action(ArgAction::Append)
        .help("Function to expose (repeatable)")
}

/// Common argument: signatures file
fn signatures_arg() -> Arg {
    Arg::new("signatures")
        .long("signatures")
        .value_name("FILE")
        .help("JSON file mapping function names to argument lists")
}

/// Common argument: gateway templates
fn gateway_arg() -> Arg {
    Arg::new("gateway")
        .long("gateway")
        .value_name("TEMPLATE")
        .action(ArgAction::Append)
        .help("Gateway URL template; {id} is replaced (repeatable)")
}

fn build_cli() -> Command {
    Command::new("codepack")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Codepack Contributors")
        .about("Package guest source into WASM-shaped containers and resolve them over IPFS gateways")
        .arg(Arg::new("config").long("config").global(true).help("Configuration file"))
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("pack")
                .about("Pack a source file into a container")
                .arg(Arg::new("source").required(true).help("Guest source file"))
                .arg(function_arg())
                .arg(signatures_arg())
                .arg(Arg::new("output").short('o').long("output").help("Container to write")),
        )
        .subcommand(
            Command::new("unpack")
                .about("Show the source and function list of a container")
                .arg(Arg::new("container").required(true).help("Container file"))
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(["text", "json"])
                        .default_value("text")
                        .help("Output format"),
                ),
        )
        .subcommand(
            Command::new("classify")
                .about("Classify an identifier as addressable or non-addressable")
                .arg(Arg::new("identifier").required(true)),
        )
        .subcommand(
            Command::new("fetch")
                .about("Resolve an identifier to content")
                .arg(Arg::new("identifier").help("Identifier (default: from deployment.json)"))
                .arg(Arg::new("local").long("local").help("Local file to use first or as fallback"))
                .arg(Arg::new("expected").long("expected").help("File name expected locally"))
                .arg(gateway_arg())
                .arg(Arg::new("deployment").long("deployment").help("Deployment record"))
                .arg(
                    Arg::new("no_cache")
                        .long("no-cache")
                        .action(ArgAction::SetTrue)
                        .help("Do not cache fetched packages"),
                ),
        )
        .subcommand(
            Command::new("publish")
                .about("Pack a source file and upload it")
                .arg(Arg::new("source").required(true).help("Guest source file"))
                .arg(function_arg())
                .arg(signatures_arg())
                .arg(Arg::new("output").short('o').long("output").help("Container to write")),
        )
        .subcommand(
            Command::new("call")
                .about("Call a function of a published package")
                .arg(Arg::new("function").required(true).help("Function name"))
                .arg(
                    Arg::new("args")
                        .num_args(0..)
                        .help("Arguments, parsed as JSON where possible"),
                )
                .arg(Arg::new("identifier").long("identifier").help("Identifier"))
                .arg(Arg::new("deployment").long("deployment").help("Deployment record"))
                .arg(Arg::new("local").long("local").help("Local container"))
                .arg(gateway_arg()),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("codepack.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
