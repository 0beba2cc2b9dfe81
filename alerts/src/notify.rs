use async_trait::async_trait;
use thiserror::Error;

/// Group tag attached to every alert so the receiving app can bundle them.
pub const NOTIFY_GROUP: &str = "pricewatch";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub group: String,
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("notification transport is not configured")]
    NotConfigured,

    #[error("failed to send notification: {0}")]
    Transport(String),

    #[error("notification service returned status {0}")]
    Status(u16),
}

/// Push-notification transport. Delivery is best effort: callers report a
/// failure and move on, nothing is retried.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, title: &str, body: &str, group: &str) -> Result<(), SendError>;

    /// A transport without credentials is skipped instead of failing every send.
    fn is_configured(&self) -> bool {
        true
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), SendError> {
        self.send(&notification.title, &notification.body, &notification.group)
            .await
    }
}
