mod cli;
mod commands;

use anyhow::Context;
use casefile::Workbench;
use casefile::domain::config::CasefileConfig;
use casefile::kernel::config::load_config;
use casefile_logger::{LevelFilter, Logger};
use clap::Parser;
use cli::Cli;

#[casefile_runtime::main(cli)]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config: CasefileConfig =
        load_config(cli.config.as_ref()).context("Critical: Configuration is malformed")?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let level: LevelFilter = level.parse().with_context(|| format!("Unknown log level '{level}'"))?;
    let builder = Logger::builder().name(env!("CARGO_BIN_NAME")).console(true).level(level);
    let _logger = match &config.logging.directory {
        Some(directory) => builder.path(directory).json(config.logging.json).init()?,
        None => builder.init()?,
    };

    let workbench = Workbench::open(config).await?;
    commands::run(&workbench, cli.command).await
}
