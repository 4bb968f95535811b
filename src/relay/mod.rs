//! Live relay subscriptions and their synchronization with the stored graph.
//!
//! Each persisted edge `input -> output` is realized as one [`Subscription`]:
//! a transport binding on the input chat whose [`RelayHandler`] runs the
//! filter pipeline and produces an [`Outbound`] message for the output chat.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RelayError;
use crate::filters::treat;
use crate::store::{ChannelId, RelayStore};

pub mod registry;
pub mod sync;
pub mod transport;

pub use registry::SubscriptionRegistry;
pub use sync::{GraphSync, ResyncReport};
pub use transport::{Transport, TransportError};

/// Identity of a subscription: the `(input, output)` edge it realizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    /// Source channel id.
    pub input: ChannelId,
    /// Destination channel id.
    pub output: ChannelId,
}

impl EdgeKey {
    /// Key for `input -> output`.
    pub fn new(input: ChannelId, output: ChannelId) -> Self {
        Self { input, output }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.input, self.output)
    }
}

/// A message ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    /// Destination chat link.
    pub url: String,
    /// Transformed text.
    pub text: String,
}

/// Callback bound to a subscription, run for each inbound message.
#[async_trait]
pub trait RelayHandler: Send + Sync {
    /// Produce the message to forward, or `None` to drop it.
    async fn handle(&self, text: &str) -> Result<Option<Outbound>, RelayError>;
}

/// Forwards to a fixed output after running the current filter rules.
///
/// A message the pipeline suppresses or empties out is dropped.
///
/// Rules are read from the store on every message, so filter edits apply
/// without a resync.
pub struct ForwardHandler {
    output_url: String,
    store: Arc<dyn RelayStore>,
}

impl ForwardHandler {
    /// Forward to `output_url` using rules from `store`.
    pub fn new(output_url: impl Into<String>, store: Arc<dyn RelayStore>) -> Self {
        Self {
            output_url: output_url.into(),
            store,
        }
    }
}

#[async_trait]
impl RelayHandler for ForwardHandler {
    async fn handle(&self, text: &str) -> Result<Option<Outbound>, RelayError> {
        let filters = self.store.list_filters().await?;
        Ok(treat(text, &filters)
            .filter(|text| !text.trim().is_empty())
            .map(|text| Outbound {
                url: self.output_url.clone(),
                text,
            }))
    }
}

/// A live binding of one edge to a transport callback.
#[derive(Clone)]
pub struct Subscription {
    /// The edge this subscription realizes.
    pub key: EdgeKey,
    /// Input chat link the transport listens on.
    pub source_url: String,
    /// Output chat link.
    pub output_url: String,
    /// Callback run per inbound message.
    pub handler: Arc<dyn RelayHandler>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("source_url", &self.source_url)
            .field("output_url", &self.output_url)
            .finish_non_exhaustive()
    }
}
