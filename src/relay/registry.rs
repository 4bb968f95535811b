//! In-memory record of the subscriptions currently held by the transport.

use std::collections::BTreeMap;

use super::{EdgeKey, Subscription};

/// Subscriptions keyed by the edge they realize.
///
/// Only the sync engine writes to it, and only after the transport call for
/// the same key succeeded, so it mirrors the transport exactly.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: BTreeMap<EdgeKey, Subscription>,
}

impl SubscriptionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a subscription, returning any previous one for the key.
    pub fn insert(&mut self, subscription: Subscription) -> Option<Subscription> {
        self.entries.insert(subscription.key.clone(), subscription)
    }

    /// Forget a subscription.
    pub fn remove(&mut self, key: &EdgeKey) -> Option<Subscription> {
        self.entries.remove(key)
    }

    /// Look a subscription up.
    pub fn get(&self, key: &EdgeKey) -> Option<&Subscription> {
        self.entries.get(key)
    }

    /// Whether `key` is registered.
    pub fn contains(&self, key: &EdgeKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered keys in order.
    pub fn keys(&self) -> Vec<EdgeKey> {
        self.entries.keys().cloned().collect()
    }

    /// Registered subscriptions in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.entries.values()
    }

    /// Number of subscriptions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
