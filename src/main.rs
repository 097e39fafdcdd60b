//! RPC Exposure - Command-line tool resolving the RPC endpoints of Rust service types.
//!
//! The binary scans a Rust project, resolves the endpoints of every exposed service type
//! (route names, method identifiers, authorization, filters, obsolescence) and writes a
//! document describing them together with the definitions of every type they use.
//!
//! # Usage
//!
//! ```bash
//! rpc-exposure [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Expose a single service:
//! ```bash
//! rpc-exposure ./my-service -e IntMath -o api.yaml
//! ```
//!
//! Use a configuration file and JSON output:
//! ```bash
//! rpc-exposure ./my-service -c rpc.toml -f json -o api.json
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! rpc-exposure ./my-service -e IntMath -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use rpc_exposure::cli;

fn main() -> Result<()> {
    // Parse once up front so the verbose flag can pick the log level
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("RPC Exposure starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("Endpoint resolution completed successfully");

    Ok(())
}
