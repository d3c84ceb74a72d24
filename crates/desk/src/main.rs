use clap::Parser;
use color_eyre::Result;
use paths::PathContext;
use tracing::debug;

use crate::cli::Cli;
use crate::config::Config;

mod cli;
mod commands;
mod config;
mod errors;
mod logging;

pub const APP_ID: &str = "desk";

#[tokio::main]
async fn main() -> Result<()> {
    errors::init()?;

    let cli = Cli::parse();
    let paths = PathContext::new(APP_ID);
    let mut config = Config::new(&paths)?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    config.ensure_directories()?;

    let _log_guard = logging::init(&config)?;
    debug!(
        environment = ?paths.environment(),
        data_dir = %config.data_dir.display(),
        "desk starting"
    );

    commands::run(cli, &config).await
}
