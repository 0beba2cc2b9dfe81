use thiserror::Error;

/// Failure to obtain a quote. Callers treat every variant the same way
/// ("fetch failed"); the variants only carry a readable cause.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("no data available for symbol: {0}")]
    NoData(String),
}

/// Symbol metadata could not be resolved.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("symbol {0} not found")]
    NotFound(String),

    #[error("lookup failed: {0}")]
    Provider(String),
}
