//! Wires configured HTTP backends into the market and alert seams.

use std::sync::Arc;

use adapters::{BarkNotifier, FinnhubClient, YahooClient};
use anyhow::Context;
use market::{Market, QuoteRouter};
use tracing::{info, warn};

use crate::config::AppConfig;

/// Finnhub serves US when a key is configured; Yahoo serves everything else.
pub fn quote_router(cfg: &AppConfig) -> anyhow::Result<QuoteRouter> {
    let yahoo = YahooClient::new().context("failed to build yahoo client")?;
    let router = QuoteRouter::new(Arc::new(yahoo));

    let key = cfg.finnhub.api_key.trim();
    if key.is_empty() {
        warn!("no finnhub api key configured; US quotes served by yahoo");
        return Ok(router);
    }

    let finnhub = FinnhubClient::new(key).context("failed to build finnhub client")?;
    Ok(router.route(Market::Us, Arc::new(finnhub)))
}

pub fn notifier(cfg: &AppConfig) -> anyhow::Result<BarkNotifier> {
    let bark = BarkNotifier::new(&cfg.bark.server_url, cfg.bark.key.trim())
        .context("failed to build bark notifier")?;

    if cfg.bark.key.trim().is_empty() {
        warn!("no bark key configured; alerts are shown locally only");
    } else {
        info!(server = %cfg.bark.server_url, "bark notifications enabled");
    }

    Ok(bark)
}

pub fn symbol_lookup() -> anyhow::Result<YahooClient> {
    YahooClient::new().context("failed to build yahoo client")
}
