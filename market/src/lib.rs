//! Market-facing building blocks shared by the monitor and its adapters:
//! market tags, point-in-time quotes, the trading calendar and the
//! quote-source seams that concrete HTTP backends plug into.

pub mod calendar;
pub mod error;
pub mod router;
pub mod source;
pub mod types;

pub use error::{FetchError, LookupError};
pub use router::QuoteRouter;
pub use source::{QuoteSource, SymbolInfo, SymbolLookup};
pub use types::{Market, Quote};
