//! HTTP backends for the market and alert seams: Finnhub and Yahoo Finance
//! quote sources, Yahoo symbol lookup and the Bark push transport.

pub mod bark;
pub mod errors;
pub mod finnhub;
pub mod yahoo;

mod http;

pub use bark::BarkNotifier;
pub use errors::ProviderError;
pub use finnhub::FinnhubClient;
pub use yahoo::YahooClient;
