use std::time::Duration;

use reqwest::{Client, Response};

use crate::errors::ProviderError;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Yahoo rejects requests without a browser-like user agent.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub(crate) fn build_client(user_agent: Option<&str>) -> Result<Client, ProviderError> {
    let mut builder = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(30));

    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }

    Ok(builder.build()?)
}

/// Turns a non-success response into `ProviderError::Status` carrying the body.
pub(crate) async fn check_status(resp: Response) -> Result<Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}
