use std::path::Path;

use alerts::Rule;
use anyhow::bail;

use super::{load, save};
use crate::cli::{RuleArgs, SymbolArgs};
use crate::render::RULE;

pub fn add(path: &Path, args: RuleArgs) -> anyhow::Result<()> {
    let rule = args.into_rule();
    let symbol = rule.symbol.clone();

    let mut cfg = load(path)?;
    let replaced = cfg.add_rule(rule);
    save(&cfg, path)?;

    if replaced {
        println!("✅ Updated rule for {symbol}");
    } else {
        println!("✅ Added rule for {symbol}");
    }
    Ok(())
}

pub fn list(path: &Path) -> anyhow::Result<()> {
    let cfg = load(path)?;

    if cfg.rules.is_empty() {
        println!("No rules configured.");
        println!("Add one with: pricewatch config add --symbol AAPL --price-above 200");
        return Ok(());
    }

    println!("📋 Rules ({})", cfg.rules.len());
    println!("{RULE}");
    for (i, rule) in cfg.rules.iter().enumerate() {
        println!("{}. {} [{}]", i + 1, rule.label(), rule.market);
        for line in describe(rule) {
            println!("   • {line}");
        }
    }
    println!("{RULE}");
    println!("Config file: {}", path.display());
    Ok(())
}

pub fn remove(path: &Path, args: SymbolArgs) -> anyhow::Result<()> {
    let mut cfg = load(path)?;
    if !cfg.remove_rule(&args.symbol) {
        bail!("no rule for {}", args.symbol);
    }
    save(&cfg, path)?;

    println!("✅ Removed rule for {}", args.symbol);
    Ok(())
}

fn describe(rule: &Rule) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(v) = rule.price_above {
        out.push(format!("price above ${v:.2}"));
    }
    if let Some(v) = rule.price_below {
        out.push(format!("price below ${v:.2}"));
    }
    if let Some(v) = rule.change_above {
        out.push(format!("change above {v:.2}%"));
    }
    if let Some(v) = rule.change_below {
        out.push(format!("change below {v:.2}%"));
    }
    if out.is_empty() {
        out.push("no thresholds (tracked only)".to_string());
    }
    out
}
