//! Persisted relay graph and filter rules.
//!
//! [`RelayStore`] is the seam between the relay logic and persistence.
//! Edge changes are staged through [`RelayStore::stage_edge`], which returns an
//! uncommitted [`PendingChange`]; the sync engine commits it only after the
//! matching live subscription has been updated.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::graph::ChannelGraph;

pub mod sqlite;

pub use sqlite::SqliteStore;

/// Link prefixes that classify a channel reference as a url rather than a name.
pub const CHANNEL_URL_PREFIXES: [&str; 3] = ["https://t.me/", "http://t.me/", "t.me/"];

/// Canonical prefix every stored channel url starts with.
pub const CANONICAL_URL_PREFIX: &str = "https://t.me/";

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Opaque unique channel identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChannelId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ChannelId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A relay endpoint: a named, url-identified Telegram chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Channel {
    /// Unique identifier.
    pub id: ChannelId,
    /// Unique human-readable name.
    pub name: String,
    /// Unique `https://t.me/...` link.
    pub url: String,
}

/// A channel reference as typed by an administrator: either a url or a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// Look the channel up by name.
    Name(String),
    /// Look the channel up by url (normalized to the canonical prefix).
    Url(String),
}

impl ChannelRef {
    /// Classify a raw reference.
    ///
    /// Strings starting with a recognized Telegram link prefix are urls and
    /// are rewritten to start with [`CANONICAL_URL_PREFIX`]; anything else is
    /// a name.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        for prefix in CHANNEL_URL_PREFIXES {
            if let Some(rest) = raw.strip_prefix(prefix) {
                return Self::Url(format!("{CANONICAL_URL_PREFIX}{rest}"));
            }
        }
        Self::Name(raw.to_owned())
    }

    /// The name or url being looked up.
    pub fn value(&self) -> &str {
        match self {
            Self::Name(v) | Self::Url(v) => v,
        }
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "name '{name}'"),
            Self::Url(url) => write!(f, "url '{url}'"),
        }
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// How a filter rule treats a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Suppress messages containing the condition.
    Blacklist,
    /// Replace every occurrence of the condition.
    Replacement,
    /// Remove sentences containing links to the condition's domain.
    LinkRemover,
}

impl FilterMode {
    /// All modes in pipeline order.
    pub const ALL: [FilterMode; 3] = [Self::Blacklist, Self::Replacement, Self::LinkRemover];

    /// Database representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blacklist => "blacklist",
            Self::Replacement => "replacement",
            Self::LinkRemover => "link_remover",
        }
    }

    /// Parse the database representation.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == value)
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted filter rule. Read by the pipeline, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filter {
    /// Unique identifier.
    pub id: String,
    /// Trigger string (substring, literal, or link domain depending on mode).
    pub condition: String,
    /// Replacement text; present iff `mode` is [`FilterMode::Replacement`].
    pub replacement: Option<String>,
    /// Rule kind.
    pub mode: FilterMode,
}

/// A filter rule to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFilter {
    /// Trigger string.
    pub condition: String,
    /// Replacement text for replacement rules.
    pub replacement: Option<String>,
    /// Rule kind.
    pub mode: FilterMode,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from persistent store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database query, transaction, or commit failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An invalid enum value was read from the database.
    #[error("invalid {field} value: {value:?}")]
    InvalidEnum {
        /// Which field contained the bad value.
        field: &'static str,
        /// The unexpected value.
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Staged edge changes
// ---------------------------------------------------------------------------

/// A single edge mutation to stage inside a store transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeChange {
    /// Add `input -> output`.
    Insert {
        /// Source channel.
        input: ChannelId,
        /// Destination channel.
        output: ChannelId,
    },
    /// Remove every `input -> output` row.
    Delete {
        /// Source channel.
        input: ChannelId,
        /// Destination channel.
        output: ChannelId,
    },
}

/// An applied but uncommitted store transaction.
///
/// Dropping it without calling either method rolls it back.
#[async_trait]
pub trait PendingChange: Send {
    /// Make the change durable.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    /// Discard the change.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Persistent store for channels, edges, and filter rules.
#[async_trait]
pub trait RelayStore: Send + Sync {
    /// Look a channel up by name or url.
    async fn find_channel(&self, reference: &ChannelRef) -> Result<Option<Channel>, StoreError>;

    /// Find a channel sharing either the name or the url.
    async fn find_conflicting_channel(
        &self,
        name: &str,
        url: &str,
    ) -> Result<Option<Channel>, StoreError>;

    /// All channels in creation order.
    async fn list_channels(&self) -> Result<Vec<Channel>, StoreError>;

    /// Insert a channel with a fresh id.
    async fn insert_channel(&self, name: &str, url: &str) -> Result<Channel, StoreError>;

    /// Clear every inbound and outbound edge of a channel, then delete it, in
    /// one transaction.
    async fn delete_channel(&self, id: &ChannelId) -> Result<(), StoreError>;

    /// Load the whole graph into memory: channels plus edges in insertion order.
    async fn load_graph(&self) -> Result<ChannelGraph, StoreError>;

    /// Apply an edge change inside a transaction without committing it.
    async fn stage_edge(&self, change: EdgeChange) -> Result<Box<dyn PendingChange>, StoreError>;

    /// All filter rules in insertion order.
    async fn list_filters(&self) -> Result<Vec<Filter>, StoreError>;

    /// Find the rule using `condition`, whatever its mode.
    async fn find_filter_by_condition(&self, condition: &str)
        -> Result<Option<Filter>, StoreError>;

    /// Find the rule of `mode` whose replacement equals `replacement`.
    async fn find_filter_by_replacement(
        &self,
        mode: FilterMode,
        replacement: &str,
    ) -> Result<Option<Filter>, StoreError>;

    /// Insert a rule with a fresh id.
    async fn insert_filter(&self, filter: NewFilter) -> Result<Filter, StoreError>;

    /// Delete a rule by id.
    async fn delete_filter(&self, id: &str) -> Result<(), StoreError>;
}
