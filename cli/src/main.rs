mod cli;
mod commands;
mod config;
mod providers;
mod reload;
mod render;

use clap::Parser;
use common::logger::init_logger;

use cli::{Cli, Command, ConfigCommand, HoldingCommand};
use commands::{holdings, once, rules, watch};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger("pricewatch", cli.json);

    let path = cli.config.unwrap_or_else(config::default_path);

    match cli.command {
        Command::Watch => watch::run(&path).await,
        Command::Once { symbol } => once::run(&path, &symbol).await,
        Command::Add(args) | Command::Config(ConfigCommand::Add(args)) => rules::add(&path, args),
        Command::Config(ConfigCommand::List) => rules::list(&path),
        Command::Config(ConfigCommand::Remove(args)) => rules::remove(&path, args),
        Command::Holding(HoldingCommand::Add(args)) => holdings::add(&path, args).await,
        Command::Holding(HoldingCommand::List) => holdings::list(&path),
        Command::Holding(HoldingCommand::Remove(args)) => holdings::remove(&path, args),
    }
}
