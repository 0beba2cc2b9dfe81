use std::path::PathBuf;

use alerts::Rule;
use clap::{Args, Parser, Subcommand};
use market::Market;

#[derive(Debug, Parser)]
#[command(name = "pricewatch", version, about = "Stock price alerts with push notifications")]
pub struct Cli {
    /// Config file (default: ~/.pricewatch.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Monitor every configured rule until interrupted
    Watch,

    /// Fetch and print a single quote
    Once {
        /// Ticker, e.g. AAPL or 600519.SS
        symbol: String,
    },

    /// Add or replace a rule (same as `config add`)
    Add(RuleArgs),

    /// Manage alert rules
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Manage portfolio holdings
    #[command(subcommand)]
    Holding(HoldingCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Add or replace a rule
    Add(RuleArgs),
    /// List configured rules
    List,
    /// Remove a rule
    Remove(SymbolArgs),
}

#[derive(Debug, Subcommand)]
pub enum HoldingCommand {
    /// Add shares to a position (averages the cost of an existing one)
    Add(HoldingArgs),
    /// List holdings
    List,
    /// Remove a holding
    Remove(SymbolArgs),
}

#[derive(Debug, Args)]
pub struct SymbolArgs {
    #[arg(long)]
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct RuleArgs {
    #[arg(long)]
    pub symbol: String,

    /// US, CN, HK, TW, CRYPTO or FOREX
    #[arg(long, default_value = "US")]
    pub market: Market,

    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    /// Alert when price rises above this value
    #[arg(long, allow_negative_numbers = true)]
    pub price_above: Option<f64>,

    /// Alert when price falls below this value
    #[arg(long, allow_negative_numbers = true)]
    pub price_below: Option<f64>,

    /// Alert when percent change rises above this value
    #[arg(long, allow_negative_numbers = true)]
    pub change_above: Option<f64>,

    /// Alert when percent change falls below this value
    #[arg(long, allow_negative_numbers = true)]
    pub change_below: Option<f64>,
}

impl RuleArgs {
    pub fn into_rule(self) -> Rule {
        Rule {
            symbol: self.symbol,
            market: self.market,
            name: self.name.filter(|n| !n.is_empty()),
            price_above: self.price_above,
            price_below: self.price_below,
            change_above: self.change_above,
            change_below: self.change_below,
        }
    }
}

#[derive(Debug, Args)]
pub struct HoldingArgs {
    #[arg(long)]
    pub symbol: String,

    /// Number of shares
    #[arg(long, value_parser = positive)]
    pub quantity: f64,

    /// Cost per share
    #[arg(long = "cost", value_parser = positive)]
    pub cost: f64,
}

fn positive(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if v > 0.0 && v.is_finite() {
        Ok(v)
    } else {
        Err("must be greater than 0".to_string())
    }
}
