mod cli;
mod server;

use std::io::Write;

use clap::Parser;
use cli::{Cli, Commands, DecodeArgs};
use weatherfusion::config::Config;
use weatherfusion::geometry;
use weatherfusion::observability;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    let config = Config::load()?;
    observability::init_tracing(&config.telemetry.log_filter);

    match cli.command {
        Commands::Run(args) => server::run(config, args.once).await?,
        Commands::Serve => server::serve(config).await?,
        Commands::Prune => server::prune(config).await?,
        Commands::Decode(args) => decode(args)?,
        Commands::Config => print!("{}", config.to_toml()?),
    }

    Ok(())
}

fn decode(args: DecodeArgs) -> Result<(), AnyError> {
    let body = std::fs::read(&args.path)?;
    let collection = geometry::decode_bytes(&body)?;

    let mut stdout = std::io::stdout().lock();
    if args.pretty {
        serde_json::to_writer_pretty(&mut stdout, &collection)?;
    } else {
        serde_json::to_writer(&mut stdout, &collection)?;
    }
    writeln!(stdout)?;
    Ok(())
}
