use anyhow::Result;
use clap::Parser;
use std::env;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod console;
mod project;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let cwd = env::current_dir()?;

    match args.command {
        Command::Convert(convert_args) => commands::convert::run(convert_args, &cwd),
        Command::Rush(rush_args) => commands::rush::run(rush_args, &cwd),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
