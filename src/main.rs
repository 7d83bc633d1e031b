use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pricelens::application::{Cli, CommandExecutor};
use pricelens::shared::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    CommandExecutor::execute(cli, config).await?;
    Ok(())
}
