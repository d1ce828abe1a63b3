use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;

use args::{Cli, Command};

fn main() {
    // Load .env file if present, before clap reads QUERYSIM_* variables
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Command::Generate(args) => commands::generate::run(args, config),
        Command::Preview(args) => commands::preview::run(args, config),
        Command::Schema(args) => commands::schema::run(args, config),
        Command::Graph(args) => commands::graph::run(args, config),
        Command::Features => commands::features::run(),
        Command::Check(args) => commands::check::run(args, config),
    };

    if let Err(err) = result {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
