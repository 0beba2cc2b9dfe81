use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::FetchError;
use crate::source::QuoteSource;
use crate::types::{Market, Quote};

/// Dispatches quote requests to a backend chosen by market tag.
///
/// Markets without an explicit route go to the fallback backend.
#[derive(Clone)]
pub struct QuoteRouter {
    routes: HashMap<Market, Arc<dyn QuoteSource>>,
    fallback: Arc<dyn QuoteSource>,
}

impl QuoteRouter {
    pub fn new(fallback: Arc<dyn QuoteSource>) -> Self {
        Self {
            routes: HashMap::new(),
            fallback,
        }
    }

    /// Serve `market` from `source` instead of the fallback.
    pub fn route(mut self, market: Market, source: Arc<dyn QuoteSource>) -> Self {
        self.routes.insert(market, source);
        self
    }

    pub fn is_routed(&self, market: Market) -> bool {
        self.routes.contains_key(&market)
    }

    fn backend_for(&self, market: Market) -> &Arc<dyn QuoteSource> {
        self.routes.get(&market).unwrap_or(&self.fallback)
    }
}

#[async_trait]
impl QuoteSource for QuoteRouter {
    async fn fetch_quote(&self, symbol: &str, market: Market) -> Result<Quote, FetchError> {
        debug!(
            symbol = %symbol,
            market = %market,
            routed = self.is_routed(market),
            "dispatching quote request"
        );
        self.backend_for(market).fetch_quote(symbol, market).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    #[async_trait]
    impl QuoteSource for Fixed {
        async fn fetch_quote(&self, symbol: &str, _market: Market) -> Result<Quote, FetchError> {
            Ok(Quote {
                symbol: symbol.to_string(),
                current_price: self.0,
                change: 0.0,
                percent_change: 0.0,
                open: 0.0,
                high: 0.0,
                low: 0.0,
                previous_close: self.0,
                timestamp: 0,
            })
        }
    }

    #[tokio::test]
    async fn routes_by_market_and_falls_back() {
        let router = QuoteRouter::new(Arc::new(Fixed(1.0))).route(Market::Us, Arc::new(Fixed(2.0)));

        let us = router.fetch_quote("AAPL", Market::Us).await.unwrap();
        let cn = router.fetch_quote("600519.SS", Market::Cn).await.unwrap();

        assert_eq!(us.current_price, 2.0);
        assert_eq!(cn.current_price, 1.0);
        assert!(router.is_routed(Market::Us));
        assert!(!router.is_routed(Market::Cn));
    }
}
