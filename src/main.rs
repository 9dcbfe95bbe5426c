mod agents;
mod analysis;
mod auth;
mod cli;
mod config;
mod error;
mod framework;
mod output;
mod providers;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting triagelens");
    cli.execute().await?;

    Ok(())
}
