use async_trait::async_trait;
use market::{FetchError, Market, Quote, QuoteSource};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::errors::ProviderError;
use crate::http::{build_client, check_status};

pub const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";

/// Raw `/quote` payload. Finnhub sends `null` for change fields on unknown
/// symbols, hence the options.
#[derive(Debug, Deserialize)]
struct QuotePayload {
    c: f64,
    d: Option<f64>,
    dp: Option<f64>,
    h: Option<f64>,
    l: Option<f64>,
    o: Option<f64>,
    pc: f64,
    t: Option<i64>,
}

#[derive(Clone)]
pub struct FinnhubClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl FinnhubClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            http: build_client(None)?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[instrument(skip(self), fields(symbol = %symbol), level = "debug")]
    pub async fn quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let url = format!("{}/quote", self.base_url);

        let resp = self
            .http
            .get(&url)
            .query(&[("symbol", symbol), ("token", self.api_key.as_str())])
            .send()
            .await?;
        let body = check_status(resp).await?.text().await?;

        let quote = parse_quote(symbol, &body)?;
        debug!(price = quote.current_price, "finnhub quote fetched");
        Ok(quote)
    }
}

#[async_trait]
impl QuoteSource for FinnhubClient {
    async fn fetch_quote(&self, symbol: &str, _market: Market) -> Result<Quote, FetchError> {
        Ok(self.quote(symbol).await?)
    }
}

fn parse_quote(symbol: &str, body: &str) -> Result<Quote, ProviderError> {
    let p: QuotePayload =
        serde_json::from_str(body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    // Unknown symbols come back as an all-zero quote.
    if p.c == 0.0 && p.pc == 0.0 {
        return Err(ProviderError::NoData(symbol.to_string()));
    }

    Ok(Quote {
        symbol: symbol.to_string(),
        current_price: p.c,
        change: p.d.unwrap_or(0.0),
        percent_change: p.dp.unwrap_or(0.0),
        open: p.o.unwrap_or(0.0),
        high: p.h.unwrap_or(0.0),
        low: p.l.unwrap_or(0.0),
        previous_close: p.pc,
        timestamp: p.t.unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quote() {
        let body = r#"{"c":261.74,"d":-2.36,"dp":-0.8936,"h":263.31,"l":260.68,"o":261.07,"pc":264.1,"t":1582641000}"#;
        let q = parse_quote("AAPL", body).unwrap();

        assert_eq!(q.symbol, "AAPL");
        assert_eq!(q.current_price, 261.74);
        assert_eq!(q.percent_change, -0.8936);
        assert_eq!(q.previous_close, 264.1);
        assert_eq!(q.timestamp, 1582641000);
    }

    #[test]
    fn all_zero_quote_is_no_data() {
        let body = r#"{"c":0,"d":null,"dp":null,"h":0,"l":0,"o":0,"pc":0,"t":0}"#;
        let err = parse_quote("NOPE", body).unwrap_err();
        assert!(matches!(err, ProviderError::NoData(s) if s == "NOPE"));
    }

    #[test]
    fn garbage_is_decode_error() {
        let err = parse_quote("AAPL", "<html>").unwrap_err();
        assert!(matches!(FetchError::from(err), FetchError::Decode(_)));
    }
}
