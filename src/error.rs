//! Error taxonomy shared by graph, filter, and sync operations.
//!
//! [`ValidationError`]s are user-facing and never trigger compensation.
//! Store and transport failures are infrastructure errors; a failed
//! compensation escalates to [`RelayError::CompositeRollback`].

use crate::relay::transport::TransportError;
use crate::relay::EdgeKey;
use crate::store::{FilterMode, StoreError};

/// Non-fatal, user-facing rejections of a requested graph or filter change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No channel matches the given name or url.
    #[error("there is no channel with the {reference}")]
    ChannelNotFound {
        /// Human-readable reference (`name 'x'` or `url 'y'`).
        reference: String,
    },

    /// A channel with the same name or url already exists.
    #[error("a channel with this name or url already exists: {name} - {url}")]
    ChannelAlreadyExists {
        /// Name of the existing channel.
        name: String,
        /// Url of the existing channel.
        url: String,
    },

    /// The channel url is not a Telegram link.
    #[error("invalid channel url {url:?}: expected https://t.me/...")]
    InvalidChannelUrl {
        /// The rejected url.
        url: String,
    },

    /// The channel name would be classified as a url when referenced.
    #[error("invalid channel name {name:?}: names cannot look like links")]
    InvalidChannelName {
        /// The rejected name.
        name: String,
    },

    /// Input and output resolve to the same channel.
    #[error("input and output are the same channel ({channel})")]
    SameEndpoint {
        /// Name of the channel.
        channel: String,
    },

    /// The edge already exists.
    #[error("{input} is already connected to {output}")]
    AlreadyConnected {
        /// Input channel name.
        input: String,
        /// Output channel name.
        output: String,
    },

    /// The edge does not exist.
    #[error("{input} is not connected to {output}")]
    NotConnected {
        /// Input channel name.
        input: String,
        /// Output channel name.
        output: String,
    },

    /// The edge would close a loop in the relay graph.
    #[error("connecting {input} to {output} creates a loop: {}", .loop_path.join(" -> "))]
    WouldCreateCycle {
        /// Input channel name.
        input: String,
        /// Output channel name.
        output: String,
        /// Channel names along the loop, starting and ending at the input.
        loop_path: Vec<String>,
    },

    /// A filter with this condition already exists.
    #[error("a {mode} filter with condition {condition:?} already exists")]
    FilterAlreadyExists {
        /// The duplicated condition.
        condition: String,
        /// Mode of the existing filter.
        mode: FilterMode,
    },

    /// No filter with this condition exists in the mode.
    #[error("there is no {mode} filter with condition {condition:?}")]
    FilterNotFound {
        /// The requested condition.
        condition: String,
        /// The requested mode.
        mode: FilterMode,
    },

    /// The new rule's trigger or output collides with an existing rule.
    #[error("filter {condition:?} -> {replacement:?} collides with existing {mode} filter {existing:?}")]
    CircularFilter {
        /// Condition of the new rule.
        condition: String,
        /// Replacement of the new rule.
        replacement: String,
        /// Mode of both rules.
        mode: FilterMode,
        /// Condition of the existing, colliding rule.
        existing: String,
    },

    /// The rule would replace its condition with itself.
    #[error("filter condition and replacement are both {condition:?}")]
    ConditionEqualsReplacement {
        /// The shared value.
        condition: String,
    },

    /// The filter condition is empty.
    #[error("filter condition cannot be empty")]
    EmptyCondition,

    /// A replacement rule was given without a replacement.
    #[error("{mode} filters require a replacement")]
    MissingReplacement {
        /// Mode of the rule.
        mode: FilterMode,
    },

    /// A replacement was given for a mode that does not use one.
    #[error("{mode} filters do not take a replacement")]
    UnexpectedReplacement {
        /// Mode of the rule.
        mode: FilterMode,
    },
}

/// Any failure surfaced by graph, filter, or sync operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The request was rejected; nothing changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Persistent store query or commit failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Transport subscribe, unsubscribe, or send failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The persisted edge exists but no live subscription is registered for it.
    #[error("connections are not synchronized for edge {key}")]
    ConnectionsNotSynchronized {
        /// The edge missing from the registry.
        key: EdgeKey,
    },

    /// A step failed and the compensating action failed too.
    #[error("rollback failed for edge {key}: {cause}; compensation failed: {compensation}")]
    CompositeRollback {
        /// The edge left inconsistent.
        key: EdgeKey,
        /// The failure that triggered compensation.
        cause: Box<RelayError>,
        /// The failure of the compensating action.
        compensation: Box<RelayError>,
    },
}

impl RelayError {
    /// Returns `true` for user-facing validation rejections.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns `true` when store and live subscriptions may disagree and an
    /// operator must run a full resync.
    pub fn requires_resync(&self) -> bool {
        matches!(
            self,
            Self::ConnectionsNotSynchronized { .. } | Self::CompositeRollback { .. }
        )
    }
}
