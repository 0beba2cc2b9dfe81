use async_trait::async_trait;

use crate::error::{FetchError, LookupError};
use crate::types::{Market, Quote};

/// A backend able to produce a fresh quote for a symbol.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, symbol: &str, market: Market) -> Result<Quote, FetchError>;
}

/// Display name and market resolved for a new symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub display_name: String,
    pub market: Market,
}

impl SymbolInfo {
    /// Used when the lookup fails: raw symbol as name, default market.
    pub fn fallback(symbol: &str) -> Self {
        Self {
            display_name: symbol.to_string(),
            market: Market::default(),
        }
    }
}

/// Resolves metadata for a symbol (used when auto-creating rules).
#[async_trait]
pub trait SymbolLookup: Send + Sync {
    async fn lookup_symbol(&self, symbol: &str) -> Result<SymbolInfo, LookupError>;
}
