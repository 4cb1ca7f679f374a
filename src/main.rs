//! jsoncache - read and write JSON values in a key-value store
//!
//! A small inspection tool over the `jsoncache` library: `get`, `set`, `del`
//! and `flush` against the store configured by `HOST`/`PORT`/`DB` or flags.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use jsoncache::cli::{execute, Cli, CliError};
use jsoncache::store::CloseMode;
use jsoncache::{logging, Cache};

async fn run(cli: Cli) -> Result<String, CliError> {
    let config = cli.store_config()?;
    debug!(?config, "connecting");
    let cache = Cache::connect(&config).await?;

    let result = execute(&cli.command, &cache).await;
    cache.close(CloseMode::Graceful).await;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    // Only fails if a subscriber is already installed
    let _ = logging::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
