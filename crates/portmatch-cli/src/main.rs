//! Portmatch CLI: the `portmatch` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Resolve {
            platform,
            ifc,
            src,
            default_ifc,
            tgt,
            debug,
            json,
        } => commands::resolve::run(commands::resolve::ResolveArgs {
            platform,
            ifc,
            src,
            default_ifc,
            tgt,
            debug,
            json,
        }),

        Commands::Platforms { json } => commands::platforms::run(json),

        Commands::Interfaces { json } => commands::interfaces::run(json),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();
}
