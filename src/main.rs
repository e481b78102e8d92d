#![recursion_limit = "256"]

use anyhow::Result;
use clap::Parser;
use labelwise::cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("labelwise=info".parse()?))
        .init();

    let cli = Cli::parse();
    cli.run()
}
