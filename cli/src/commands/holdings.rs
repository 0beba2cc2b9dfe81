use std::path::Path;

use alerts::Rule;
use anyhow::bail;
use market::{SymbolInfo, SymbolLookup};
use tracing::warn;

use super::{load, save};
use crate::cli::{HoldingArgs, SymbolArgs};
use crate::config::{AppConfig, Holding};
use crate::providers;
use crate::render::RULE;

/// Result of folding a purchase into the config.
#[derive(Debug, PartialEq)]
pub struct HoldingAdded {
    pub previous: Option<Holding>,
    pub holding: Holding,
    /// Set when a tracking rule had to be created for the symbol.
    pub created_rule: Option<Rule>,
}

/// Averages the purchase into the position and makes sure the symbol has a
/// rule, resolving its name and market through `lookup`.
pub async fn apply(
    cfg: &mut AppConfig,
    args: &HoldingArgs,
    lookup: &dyn SymbolLookup,
) -> HoldingAdded {
    let previous = cfg.holding(&args.symbol).cloned();
    let holding = cfg.add_position(&args.symbol, args.quantity, args.cost);

    let created_rule = if cfg.rule(&args.symbol).is_none() {
        let info = match lookup.lookup_symbol(&args.symbol).await {
            Ok(info) => info,
            Err(e) => {
                warn!(symbol = %args.symbol, error = %e, "symbol lookup failed; using defaults");
                SymbolInfo::fallback(&args.symbol)
            }
        };

        let rule = Rule::new(&args.symbol)
            .with_market(info.market)
            .with_name(info.display_name);
        cfg.add_rule(rule.clone());
        Some(rule)
    } else {
        None
    };

    HoldingAdded {
        previous,
        holding,
        created_rule,
    }
}

pub async fn add(path: &Path, args: HoldingArgs) -> anyhow::Result<()> {
    let mut cfg = load(path)?;
    let lookup = providers::symbol_lookup()?;

    let added = apply(&mut cfg, &args, &lookup).await;
    save(&cfg, path)?;

    if let Some(prev) = &added.previous {
        println!(
            "ℹ️  Existing position: {:.2} @ ${:.2}, adding {:.2} @ ${:.2}",
            prev.quantity, prev.cost_price, args.quantity, args.cost
        );
    }
    if let Some(rule) = &added.created_rule {
        println!("ℹ️  Created tracking rule for {} [{}]", rule.label(), rule.market);
    }

    let h = &added.holding;
    println!(
        "✅ {}: {:.2} shares @ ${:.2} (total cost ${:.2})",
        h.symbol,
        h.quantity,
        h.cost_price,
        h.total_cost()
    );
    Ok(())
}

pub fn list(path: &Path) -> anyhow::Result<()> {
    let cfg = load(path)?;

    if cfg.holdings.is_empty() {
        println!("No holdings configured.");
        println!("Add one with: pricewatch holding add --symbol AAPL --quantity 100 --cost 150.50");
        return Ok(());
    }

    println!("📊 Holdings ({})", cfg.holdings.len());
    println!("{RULE}");
    let mut total = 0.0;
    for (i, h) in cfg.holdings.iter().enumerate() {
        total += h.total_cost();
        println!("{}. {}", i + 1, h.symbol);
        println!("   • quantity: {:.2}", h.quantity);
        println!("   • cost price: ${:.2}", h.cost_price);
        println!("   • position cost: ${:.2}", h.total_cost());
    }
    println!("{RULE}");
    println!("Total cost: ${total:.2}");
    println!("Config file: {}", path.display());
    Ok(())
}

pub fn remove(path: &Path, args: SymbolArgs) -> anyhow::Result<()> {
    let mut cfg = load(path)?;
    if !cfg.remove_holding(&args.symbol) {
        bail!("no holding for {}", args.symbol);
    }
    save(&cfg, path)?;

    println!("✅ Removed holding for {}", args.symbol);
    Ok(())
}
