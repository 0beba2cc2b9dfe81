use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use market::{FetchError, Market, Quote, QuoteSource};

pub fn quote(symbol: &str, price: f64, pct: f64) -> Quote {
    Quote {
        symbol: symbol.into(),
        current_price: price,
        change: price * pct / 100.0,
        percent_change: pct,
        open: price,
        high: price,
        low: price,
        previous_close: 100.0,
        timestamp: 0,
    }
}

/// Serves a scripted sequence of responses per symbol. An exhausted script
/// answers with `NoData`.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Result<Quote, FetchError>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_quote(&self, symbol: &str, price: f64, pct: f64) {
        self.push(symbol, Ok(quote(symbol, price, pct)));
    }

    pub fn push_error(&self, symbol: &str) {
        self.push(
            symbol,
            Err(FetchError::Request("connection reset".into())),
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, symbol: &str, response: Result<Quote, FetchError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default()
            .push_back(response);
    }
}

#[async_trait]
impl QuoteSource for ScriptedSource {
    async fn fetch_quote(&self, symbol: &str, _market: Market) -> Result<Quote, FetchError> {
        self.calls.lock().unwrap().push(symbol.to_string());
        self.scripts
            .lock()
            .unwrap()
            .get_mut(symbol)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Err(FetchError::NoData(symbol.to_string())))
    }
}
