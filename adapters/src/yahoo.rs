//! Yahoo Finance chart endpoint, used both as a quote source for non-US
//! markets and to resolve display name and market for new symbols.

use async_trait::async_trait;
use market::{FetchError, LookupError, Market, Quote, QuoteSource, SymbolInfo, SymbolLookup};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::errors::ProviderError;
use crate::http::{BROWSER_USER_AGENT, build_client, check_status};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ChartMeta {
    short_name: Option<String>,
    long_name: Option<String>,
    exchange_name: Option<String>,
    exchange_timezone_name: Option<String>,
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    regular_market_time: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<OhlcSeries>,
}

/// Yahoo pads gaps with `null`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OhlcSeries {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
}

impl OhlcSeries {
    fn last(&self) -> (f64, f64, f64) {
        let Some(idx) = self.close.len().checked_sub(1) else {
            return (0.0, 0.0, 0.0);
        };
        let at = |v: &[Option<f64>]| v.get(idx).copied().flatten().unwrap_or(0.0);
        (at(&self.open), at(&self.high), at(&self.low))
    }
}

#[derive(Clone)]
pub struct YahooClient {
    http: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> Result<Self, ProviderError> {
        Ok(Self {
            http: build_client(Some(BROWSER_USER_AGENT))?,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn chart(&self, symbol: &str) -> Result<ChartResult, ProviderError> {
        let url = chart_url(&self.base_url, symbol)?;

        let resp = self
            .http
            .get(url)
            .query(&[("interval", "1d"), ("range", "1d")])
            .send()
            .await?;
        let body = check_status(resp).await?.text().await?;

        parse_chart(symbol, &body)
    }

    #[instrument(skip(self), fields(symbol = %symbol), level = "debug")]
    pub async fn quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let chart = self.chart(symbol).await?;
        let quote = quote_from_chart(symbol, &chart)?;
        debug!(price = quote.current_price, "yahoo quote fetched");
        Ok(quote)
    }

    #[instrument(skip(self), fields(symbol = %symbol), level = "debug")]
    pub async fn symbol_info(&self, symbol: &str) -> Result<SymbolInfo, ProviderError> {
        let chart = self.chart(symbol).await?;
        let info = info_from_meta(symbol, &chart.meta);
        debug!(name = %info.display_name, market = %info.market, "symbol resolved");
        Ok(info)
    }
}

#[async_trait]
impl QuoteSource for YahooClient {
    async fn fetch_quote(&self, symbol: &str, _market: Market) -> Result<Quote, FetchError> {
        Ok(self.quote(symbol).await?)
    }
}

#[async_trait]
impl SymbolLookup for YahooClient {
    async fn lookup_symbol(&self, symbol: &str) -> Result<SymbolInfo, LookupError> {
        self.symbol_info(symbol).await.map_err(|e| match e {
            ProviderError::Status { status: 404, .. } => LookupError::NotFound(symbol.to_string()),
            other => other.into(),
        })
    }
}

fn chart_url(base_url: &str, symbol: &str) -> Result<Url, ProviderError> {
    let mut url = Url::parse(base_url).map_err(|e| ProviderError::InvalidUrl(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ProviderError::InvalidUrl(base_url.to_string()))?
        .pop_if_empty()
        .extend(["v8", "finance", "chart", symbol]);
    Ok(url)
}

fn parse_chart(symbol: &str, body: &str) -> Result<ChartResult, ProviderError> {
    let env: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    if let Some(err) = env.chart.error {
        return Err(ProviderError::InvalidResponse(format!(
            "{}: {}",
            err.code, err.description
        )));
    }

    env.chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProviderError::NoData(symbol.to_string()))
}

fn quote_from_chart(symbol: &str, chart: &ChartResult) -> Result<Quote, ProviderError> {
    let meta = &chart.meta;

    let price = meta.regular_market_price.unwrap_or(0.0);
    if price <= 0.0 {
        return Err(ProviderError::NoData(symbol.to_string()));
    }

    let previous_close = meta.chart_previous_close.unwrap_or(0.0);
    let (change, percent_change) = if previous_close > 0.0 {
        let change = price - previous_close;
        (change, change / previous_close * 100.0)
    } else {
        (0.0, 0.0)
    };

    let (open, high, low) = chart
        .indicators
        .quote
        .first()
        .map(OhlcSeries::last)
        .unwrap_or((0.0, 0.0, 0.0));

    Ok(Quote {
        symbol: symbol.to_string(),
        current_price: price,
        change,
        percent_change,
        open,
        high,
        low,
        previous_close,
        timestamp: meta.regular_market_time.unwrap_or(0),
    })
}

fn info_from_meta(symbol: &str, meta: &ChartMeta) -> SymbolInfo {
    let display_name = [&meta.short_name, &meta.long_name]
        .into_iter()
        .filter_map(|n| n.as_deref())
        .find(|n| !n.is_empty())
        .unwrap_or(symbol)
        .to_string();

    SymbolInfo {
        display_name,
        market: infer_market(
            symbol,
            meta.exchange_name.as_deref().unwrap_or_default(),
            meta.exchange_timezone_name.as_deref().unwrap_or_default(),
        ),
    }
}

/// Exchange timezone first, then crypto exchanges, then ticker suffix.
pub fn infer_market(symbol: &str, exchange: &str, timezone: &str) -> Market {
    match timezone {
        "Asia/Shanghai" => return Market::Cn,
        "Asia/Hong_Kong" => return Market::Hk,
        "Asia/Taipei" => return Market::Tw,
        "UTC" => return Market::Crypto,
        _ => {}
    }

    if matches!(exchange, "CCC" | "CCY") {
        return Market::Crypto;
    }

    let upper = symbol.to_ascii_uppercase();
    if upper.ends_with(".SS") || upper.ends_with(".SZ") {
        Market::Cn
    } else if upper.ends_with(".HK") {
        Market::Hk
    } else if upper.ends_with(".TW") {
        Market::Tw
    } else {
        Market::Us
    }
}
