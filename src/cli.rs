use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "weatherfusion")]
#[command(about = "Rain, wind and danger overlay pipeline", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the acquisition pipeline and serve the read API
    Run(RunArgs),
    /// Serve the read API only
    Serve,
    /// Run one retention pass and exit
    Prune,
    /// Decode a provider payload file and print GeoJSON to stdout
    Decode(DecodeArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(clap::Args, Debug)]
pub struct DecodeArgs {
    /// Path to a provider JSON payload
    pub path: PathBuf,

    /// Pretty-print the output
    #[arg(long)]
    pub pretty: bool,
}
