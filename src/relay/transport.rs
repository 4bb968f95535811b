//! Messaging transport boundary.

use async_trait::async_trait;

use super::{EdgeKey, Subscription};

/// Errors from subscribing, unsubscribing, or sending.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The chat link cannot be turned into a transport target.
    #[error("invalid chat target {url:?}")]
    InvalidTarget {
        /// The rejected link.
        url: String,
    },

    /// A subscription for this edge is already active.
    #[error("edge {key} is already subscribed")]
    AlreadySubscribed {
        /// The duplicated edge.
        key: EdgeKey,
    },

    /// No subscription for this edge is active.
    #[error("edge {key} is not subscribed")]
    NotSubscribed {
        /// The missing edge.
        key: EdgeKey,
    },

    /// The underlying network request failed.
    #[error("request failed: {0}")]
    Request(String),
}

/// Event source and sink for relayed messages.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start delivering messages from `subscription.source_url` to its handler.
    async fn subscribe(&self, subscription: &Subscription) -> Result<(), TransportError>;

    /// Stop delivering messages for `subscription.key`.
    async fn unsubscribe(&self, subscription: &Subscription) -> Result<(), TransportError>;

    /// Send `text` to the chat at `url`.
    async fn send_message(&self, url: &str, text: &str) -> Result<(), TransportError>;
}
