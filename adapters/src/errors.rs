use alerts::SendError;
use market::{FetchError, LookupError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("no data for {0}")]
    NoData(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl From<ProviderError> for FetchError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Status { status, body } => FetchError::Status { status, body },
            ProviderError::NoData(symbol) => FetchError::NoData(symbol),
            ProviderError::InvalidResponse(msg) => FetchError::Decode(msg),
            ProviderError::Http(e) if e.is_decode() => FetchError::Decode(e.to_string()),
            other => FetchError::Request(other.to_string()),
        }
    }
}

impl From<ProviderError> for LookupError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::NoData(symbol) => LookupError::NotFound(symbol),
            other => LookupError::Provider(other.to_string()),
        }
    }
}

impl From<ProviderError> for SendError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Status { status, .. } => SendError::Status(status),
            other => SendError::Transport(other.to_string()),
        }
    }
}
