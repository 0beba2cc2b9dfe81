use std::path::Path;

use anyhow::Context;
use chrono::{Local, Utc};
use market::{Market, QuoteSource, calendar};

use super::load;
use crate::providers;

/// Prints one quote, using the configured rule's market and name if present.
pub async fn run(path: &Path, symbol: &str) -> anyhow::Result<()> {
    let cfg = load(path)?;

    let (market, name) = match cfg.rule(symbol) {
        Some(rule) => (rule.market, rule.display_name().map(str::to_string)),
        None => (Market::default(), None),
    };

    let router = providers::quote_router(&cfg)?;
    let quote = router
        .fetch_quote(symbol, market)
        .await
        .with_context(|| format!("failed to fetch quote for {symbol}"))?;

    println!("{}", quote.summary(name.as_deref()));

    let now = Utc::now();
    if calendar::is_open(market, now) {
        println!("   Market: {market} open");
    } else {
        let next = calendar::next_open(market, now).with_timezone(&Local);
        println!("   Market: {market} closed, opens {}", next.format("%a %H:%M"));
    }
    Ok(())
}
