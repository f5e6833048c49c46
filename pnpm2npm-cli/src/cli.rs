use crate::commands;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "pnpm2npm",
    about = "Convert pnpm-lock.yaml into an npm package-lock.json",
    version,
    color = clap::ColorChoice::Auto
)]
pub struct Cli {
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a pnpm lockfile into package-lock.json
    Convert(commands::convert::ConvertArgs),
    /// Convert common/config/rush/pnpm-lock.yaml of a Rush monorepo
    Rush(commands::rush::RushArgs),
}
