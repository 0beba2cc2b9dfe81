use alerts::{Notifier, SendError};
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, instrument};

use crate::errors::ProviderError;
use crate::http::{build_client, check_status};

pub const DEFAULT_SERVER_URL: &str = "https://api.day.app";

/// Bark push transport: `GET {server}/{key}/{title}/{body}?group={group}`.
#[derive(Clone)]
pub struct BarkNotifier {
    http: Client,
    server_url: String,
    key: String,
}

impl BarkNotifier {
    /// An empty `server_url` falls back to the public Bark server.
    pub fn new(server_url: &str, key: impl Into<String>) -> Result<Self, ProviderError> {
        let server_url = match server_url.trim() {
            "" => DEFAULT_SERVER_URL,
            s => s,
        };

        Ok(Self {
            http: build_client(None)?,
            server_url: server_url.trim_end_matches('/').to_string(),
            key: key.into(),
        })
    }

    #[instrument(skip(self, body), fields(title = %title), level = "debug")]
    async fn push(&self, title: &str, body: &str, group: &str) -> Result<(), ProviderError> {
        let url = push_url(&self.server_url, &self.key, title, body, group)?;
        let resp = self.http.get(url).send().await?;
        check_status(resp).await?;
        debug!("bark push accepted");
        Ok(())
    }
}

#[async_trait]
impl Notifier for BarkNotifier {
    async fn send(&self, title: &str, body: &str, group: &str) -> Result<(), SendError> {
        if !self.is_configured() {
            return Err(SendError::NotConfigured);
        }
        Ok(self.push(title, body, group).await?)
    }

    fn is_configured(&self) -> bool {
        !self.key.is_empty()
    }
}

fn push_url(server: &str, key: &str, title: &str, body: &str, group: &str) -> Result<Url, ProviderError> {
    let mut url = Url::parse(server).map_err(|e| ProviderError::InvalidUrl(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ProviderError::InvalidUrl(server.to_string()))?
        .pop_if_empty()
        .extend([key, title, body]);
    url.query_pairs_mut().append_pair("group", group);
    Ok(url)
}
